use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::errors::{AppError, AppResult};

/// Bounded pool for toolkit runs, TTS fetches and other blocking work.
///
/// Request handlers stay on the async runtime; anything heavy holds a slot
/// while it runs. There is no queueing policy beyond waiting for a slot.
#[derive(Clone)]
pub struct WorkerPool {
    slots: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            slots: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Run an async job (usually one awaiting a child process) inside a slot.
    pub async fn run<F, T>(&self, job: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        let _permit = self
            .slots
            .acquire()
            .await
            .map_err(|_| AppError::Unknown("Worker pool is closed".to_string()))?;
        job.await
    }

    /// Run a blocking closure on the blocking thread pool inside a slot.
    pub async fn run_blocking<F, T>(&self, job: F) -> AppResult<T>
    where
        F: FnOnce() -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .slots
            .acquire()
            .await
            .map_err(|_| AppError::Unknown("Worker pool is closed".to_string()))?;
        tokio::task::spawn_blocking(job).await?
    }
}
