use std::path::PathBuf;
use std::process::ExitStatus;

/// Failures of a single media tool invocation
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for media tool: {0}")]
    Wait(#[source] std::io::Error),

    #[error("media tool exited with {status}")]
    ProcessFailure { status: ExitStatus },

    #[error("media tool killed after {secs}s timeout")]
    Timeout { secs: u64 },

    #[error("media tool succeeded but produced no output at {}", path.display())]
    MissingOutput { path: PathBuf },

    #[error("job pool is closed")]
    PoolClosed,
}
