//! External media tool invocation
//!
//! The server never touches media bytes itself: every operation is a single
//! subprocess run of the configured binary, awaited until it exits.

use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};

use super::{MediaError, Operation};
use crate::config::MediaConfig;
use crate::logger;

/// Something that turns an input file into an output file for an operation
///
/// On `Ok(())` the output file exists.
#[async_trait]
pub trait MediaTool: Send + Sync {
    async fn run(&self, operation: Operation, input: &Path, output: &Path)
        -> Result<(), MediaError>;
}

/// Runs the ffmpeg command line for each operation
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    program: String,
    timeout: Option<Duration>,
}

impl FfmpegTool {
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(
            config.tool.clone(),
            config.timeout_secs.map(Duration::from_secs),
        )
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn run(
        &self,
        operation: Operation,
        input: &Path,
        output: &Path,
    ) -> Result<(), MediaError> {
        let mut command = Command::new(&self.program);
        command
            .args(operation.args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true);

        logger::log_job_started(operation, input, output);
        let started = Instant::now();

        let mut child = command.spawn().map_err(|source| MediaError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let status = wait_child(&mut child, self.timeout).await?;

        if !status.success() {
            return Err(MediaError::ProcessFailure { status });
        }
        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(MediaError::MissingOutput {
                path: output.to_path_buf(),
            });
        }

        logger::log_job_finished(operation, output, started.elapsed());
        Ok(())
    }
}

/// Wait for the child to exit, killing it once `timeout` elapses
async fn wait_child(child: &mut Child, timeout: Option<Duration>) -> Result<ExitStatus, MediaError> {
    let Some(limit) = timeout else {
        return child.wait().await.map_err(MediaError::Wait);
    };

    match tokio::time::timeout(limit, child.wait()).await {
        Ok(status) => status.map_err(MediaError::Wait),
        Err(_) => {
            if let Err(e) = child.kill().await {
                logger::log_warning(&format!("Failed to kill timed out media tool: {e}"));
            }
            Err(MediaError::Timeout {
                secs: limit.as_secs(),
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_exit_with_output_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("in_converted.jpg");
        std::fs::write(&input, b"png").unwrap();
        std::fs::write(&output, b"jpg").unwrap();

        let tool = FfmpegTool::new("true", None);
        tool.run(Operation::CompressImage, &input, &output)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_zero_exit_without_output_is_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("never_written.mp4");

        let tool = FfmpegTool::new("true", None);
        let err = tool
            .run(Operation::Convert, &dir.path().join("in.mov"), &output)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::MissingOutput { path } if path == output));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_process_failure() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FfmpegTool::new("false", None);
        let err = tool
            .run(
                Operation::CompressVideo,
                &dir.path().join("in.mov"),
                &dir.path().join("out.mp4"),
            )
            .await
            .unwrap_err();
        match err {
            MediaError::ProcessFailure { status } => assert!(!status.success()),
            other => panic!("expected ProcessFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let tool = FfmpegTool::new("mediagate-no-such-tool", None);
        let err = tool
            .run(Operation::Convert, Path::new("a"), Path::new("b"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Spawn { program, .. } if program == "mediagate-no-such-tool"));
    }

    #[tokio::test]
    async fn test_wait_child_kills_on_timeout() {
        let mut child = Command::new("sleep")
            .arg("5")
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        let started = Instant::now();
        let err = wait_child(&mut child, Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_wait_child_without_timeout_returns_status() {
        let mut child = Command::new("true").spawn().unwrap();
        let status = wait_child(&mut child, None).await.unwrap();
        assert!(status.success());
    }
}
