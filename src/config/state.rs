// Application state module
// Shared per-process state handed to every connection

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::types::Config;
use crate::media::{MediaError, MediaTool, Operation};
use crate::storage::Storage;

/// Application state
pub struct AppState {
    pub config: Config,
    pub storage: Storage,
    tool: Arc<dyn MediaTool>,
    /// Present only when `media.max_concurrent_jobs` is configured
    job_slots: Option<Semaphore>,
}

impl AppState {
    pub fn new(config: Config, tool: Arc<dyn MediaTool>) -> Self {
        let storage = Storage::from_config(&config.storage);
        let job_slots = config
            .media
            .max_concurrent_jobs
            .map(|limit| Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS)));

        Self {
            config,
            storage,
            tool,
            job_slots,
        }
    }

    /// Run one tool invocation, waiting for a free slot when the pool is bounded
    pub async fn run_job(
        &self,
        operation: Operation,
        input: &Path,
        output: &Path,
    ) -> Result<(), MediaError> {
        let _permit = match &self.job_slots {
            Some(slots) => Some(slots.acquire().await.map_err(|_| MediaError::PoolClosed)?),
            None => None,
        };
        self.tool.run(operation, input, output).await
    }
}
