use crate::ports::outbound::ProgressReporter;
use crate::shared::Result;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::debug;

/// Default number of concurrent workers
pub const DEFAULT_WORKERS: usize = 8;

/// WorkerPool runs hash resolution tasks on a fixed group of workers
///
/// Workers pull tasks from one shared queue and push results to the
/// dispatcher. The dispatcher owns the bookkeeping: it counts submitted
/// against received results, may enqueue follow-up tasks while draining,
/// and stops every worker on the first error. A pass is all-or-nothing, so
/// partial results are discarded on failure.
pub struct WorkerPool {
    workers: usize,
    progress: Option<Arc<dyn ProgressReporter>>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            progress: None,
        }
    }

    /// Reports `received/submitted` counts through `reporter` while draining
    pub fn with_progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(reporter);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Processes every task, returning results in completion order
    ///
    /// # Errors
    /// Returns the first task error. Remaining workers are cancelled.
    pub async fn run<T, R, F, Fut>(&self, tasks: Vec<T>, worker: F) -> Result<Vec<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        self.run_expanding(tasks, worker, |_| Vec::new()).await
    }

    /// Like [`WorkerPool::run`], but `expand` may derive new tasks from each result
    ///
    /// `expand` runs on the dispatcher only, so any deduplication state it
    /// captures needs no synchronization.
    pub async fn run_expanding<T, R, F, Fut, E>(
        &self,
        tasks: Vec<T>,
        worker: F,
        mut expand: E,
    ) -> Result<Vec<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
        E: FnMut(&R) -> Vec<T>,
    {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let (task_tx, task_rx) = mpsc::unbounded_channel::<T>();
        let task_rx = Arc::new(Mutex::new(task_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<Result<R>>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker = Arc::new(worker);

        let mut set = JoinSet::new();
        for _ in 0..self.workers {
            let task_rx = Arc::clone(&task_rx);
            let result_tx = result_tx.clone();
            let cancelled = Arc::clone(&cancelled);
            let worker = Arc::clone(&worker);
            set.spawn(async move {
                loop {
                    if cancelled.load(Ordering::SeqCst) {
                        break;
                    }
                    let task = task_rx.lock().await.recv().await;
                    let Some(task) = task else {
                        break;
                    };
                    if result_tx.send((*worker)(task).await).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let mut submitted = 0usize;
        for task in tasks {
            if task_tx.send(task).is_err() {
                anyhow::bail!("Worker pool stopped before accepting all tasks");
            }
            submitted += 1;
        }

        let mut received = 0usize;
        let mut results = Vec::with_capacity(submitted);
        while received < submitted {
            let Some(result) = result_rx.recv().await else {
                anyhow::bail!(
                    "Worker pool stopped after {} of {} results",
                    received,
                    submitted
                );
            };
            received += 1;

            match result {
                Ok(value) => {
                    for task in expand(&value) {
                        if task_tx.send(task).is_err() {
                            anyhow::bail!("Worker pool stopped before accepting all tasks");
                        }
                        submitted += 1;
                    }
                    results.push(value);
                    if let Some(progress) = &self.progress {
                        progress.report_progress(received, submitted, None);
                    }
                }
                Err(e) => {
                    debug!(received, submitted, "Worker failed, cancelling pool");
                    cancelled.store(true, Ordering::SeqCst);
                    drop(task_tx);
                    set.abort_all();
                    return Err(e);
                }
            }
        }

        // Closing the queue lets idle workers leave their receive loop
        drop(task_tx);
        while let Some(joined) = set.join_next().await {
            joined.map_err(|e| anyhow::anyhow!("Worker task failed: {}", e))?;
        }

        Ok(results)
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}
