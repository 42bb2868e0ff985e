//! Upload and output file placement
//!
//! By default every job shares the flat `uploads/` and `processed/`
//! directories, so two requests with the same filename overwrite each other.
//! With `isolate_jobs` each job gets its own `job-<uuid>` subdirectory in both.

mod filename;

pub use filename::secure_filename;

use filename::output_file_name;

use std::io;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::logger;

pub struct Storage {
    upload_dir: PathBuf,
    processed_dir: PathBuf,
    isolate_jobs: bool,
    cleanup: bool,
}

/// On-disk locations of one request's input and output
///
/// With cleanup enabled the job's files are removed when the `Job` is
/// dropped, including when the request future is cancelled mid-run.
#[derive(Debug)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
    /// File name the client receives in `Content-Disposition`
    pub output_name: String,
    /// Per-job directories, only set for isolated jobs
    scope: Option<(PathBuf, PathBuf)>,
    cleanup: bool,
}

impl Drop for Job {
    fn drop(&mut self) {
        if !self.cleanup {
            return;
        }

        let removals = match &self.scope {
            Some((upload, processed)) => [
                std::fs::remove_dir_all(upload),
                std::fs::remove_dir_all(processed),
            ],
            None => [
                std::fs::remove_file(&self.input),
                std::fs::remove_file(&self.output),
            ],
        };

        for result in removals {
            match result {
                Err(e) if e.kind() != io::ErrorKind::NotFound => {
                    logger::log_warning(&format!("Failed to clean up job files: {e}"));
                }
                _ => {}
            }
        }
    }
}

impl Storage {
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            processed_dir: config.processed_dir.clone(),
            isolate_jobs: config.isolate_jobs,
            cleanup: config.cleanup,
        }
    }

    /// Create the upload and processed directories if absent
    pub fn ensure_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::create_dir_all(&self.processed_dir)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// Lay out the paths for a job, creating per-job directories when isolated
    ///
    /// `safe_name` must already be sanitized with [`secure_filename`].
    pub async fn prepare_job(&self, safe_name: &str, target: &str) -> io::Result<Job> {
        let output_name = output_file_name(safe_name, target);

        let (upload_dir, processed_dir, scope) = if self.isolate_jobs {
            let job_dir = format!("job-{}", uuid::Uuid::new_v4().simple());
            let upload = self.upload_dir.join(&job_dir);
            let processed = self.processed_dir.join(&job_dir);
            tokio::fs::create_dir_all(&upload).await?;
            if let Err(e) = tokio::fs::create_dir_all(&processed).await {
                // The upload dir is empty here and belongs to no job yet
                let _ = tokio::fs::remove_dir(&upload).await;
                return Err(e);
            }
            (upload.clone(), processed.clone(), Some((upload, processed)))
        } else {
            (self.upload_dir.clone(), self.processed_dir.clone(), None)
        };

        Ok(Job {
            input: upload_dir.join(safe_name),
            output: processed_dir.join(&output_name),
            output_name,
            scope,
            cleanup: self.cleanup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_in(root: &Path, isolate_jobs: bool, cleanup: bool) -> Storage {
        Storage::from_config(&StorageConfig {
            upload_dir: root.join("uploads"),
            processed_dir: root.join("processed"),
            isolate_jobs,
            cleanup,
        })
    }

    #[test]
    fn test_ensure_dirs_creates_both() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path(), false, false);
        storage.ensure_dirs().unwrap();
        storage.ensure_dirs().unwrap();
        assert!(storage.upload_dir().is_dir());
        assert!(storage.processed_dir().is_dir());
    }

    #[tokio::test]
    async fn test_flat_layout_is_deterministic() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path(), false, false);

        let first = storage.prepare_job("photo.png", "jpg").await.unwrap();
        let second = storage.prepare_job("photo.png", "jpg").await.unwrap();

        assert_eq!(first.input, root.path().join("uploads/photo.png"));
        assert_eq!(first.output, root.path().join("processed/photo_converted.jpg"));
        assert_eq!(first.output_name, "photo_converted.jpg");
        assert_eq!(first.input, second.input);
        assert_eq!(first.output, second.output);
    }

    #[tokio::test]
    async fn test_isolated_jobs_do_not_collide() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path(), true, false);

        let first = storage.prepare_job("clip.mov", "mp4").await.unwrap();
        let second = storage.prepare_job("clip.mov", "mp4").await.unwrap();

        assert_ne!(first.input, second.input);
        assert_ne!(first.output, second.output);
        assert_eq!(first.output_name, second.output_name);
        assert!(first.input.parent().unwrap().is_dir());
        assert!(first.output.parent().unwrap().is_dir());
        assert!(first.input.starts_with(root.path().join("uploads")));
    }

    #[tokio::test]
    async fn test_cleanup_removes_flat_job_files() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path(), false, true);
        storage.ensure_dirs().unwrap();

        let job = storage.prepare_job("photo.png", "jpg").await.unwrap();
        std::fs::write(&job.input, b"in").unwrap();
        std::fs::write(&job.output, b"out").unwrap();

        let (input, output) = (job.input.clone(), job.output.clone());
        drop(job);
        assert!(!input.exists());
        assert!(!output.exists());
        assert!(storage.upload_dir().is_dir());
    }

    #[tokio::test]
    async fn test_cleanup_removes_isolated_job_dirs() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path(), true, true);

        let job = storage.prepare_job("clip.mov", "mp4").await.unwrap();
        std::fs::write(&job.input, b"in").unwrap();

        let upload_scope = job.input.parent().unwrap().to_path_buf();
        let processed_scope = job.output.parent().unwrap().to_path_buf();
        drop(job);
        assert!(!upload_scope.exists());
        assert!(!processed_scope.exists());
    }

    #[tokio::test]
    async fn test_files_kept_without_cleanup() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path(), false, false);
        storage.ensure_dirs().unwrap();

        let job = storage.prepare_job("photo.png", "jpg").await.unwrap();
        std::fs::write(&job.input, b"in").unwrap();

        let input = job.input.clone();
        drop(job);
        assert!(input.exists());
    }

    #[tokio::test]
    async fn test_failed_prepare_leaves_no_upload_dir() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path(), true, true);
        std::fs::create_dir_all(storage.upload_dir()).unwrap();
        // A plain file where the processed dir should be
        std::fs::write(storage.processed_dir(), b"").unwrap();

        assert!(storage.prepare_job("clip.mov", "mp4").await.is_err());
        assert!(std::fs::read_dir(storage.upload_dir()).unwrap().next().is_none());
    }
}
