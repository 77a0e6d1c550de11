use crate::error::FeaturizeError;
use crate::pipeline::job::{Job, Outcome};
use crate::sink::OutputSink;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Fixed set of workers fed from one FIFO job queue.
///
/// Each worker takes the next queued job, runs it to completion and pushes
/// exactly one outcome onto the result channel before taking another, so at
/// most `size` jobs run at once. The pool belongs to a single run: create it,
/// submit, drain with [`WorkerPool::next_outcome`], then [`WorkerPool::shutdown`].
pub struct WorkerPool {
    queue: Option<mpsc::UnboundedSender<Job>>,
    results: mpsc::UnboundedReceiver<Outcome>,
    workers: Vec<JoinHandle<()>>,
    submitted: usize,
    collected: usize,
}

impl WorkerPool {
    /// Spawn `size` workers (at least one). Must be called inside a tokio runtime.
    pub fn new(size: usize, sink: Arc<dyn OutputSink>) -> Self {
        let size = size.max(1);
        let (job_tx, job_rx) = mpsc::unbounded_channel::<Job>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<Outcome>();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let workers = (0..size)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    job_rx.clone(),
                    result_tx.clone(),
                    sink.clone(),
                ))
            })
            .collect();

        Self {
            queue: Some(job_tx),
            results: result_rx,
            workers,
            submitted: 0,
            collected: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Jobs submitted whose outcome has not been collected yet.
    pub fn pending(&self) -> usize {
        self.submitted - self.collected
    }

    pub fn submit(&mut self, job: Job) -> Result<(), FeaturizeError> {
        let queue = self.queue.as_ref().ok_or(FeaturizeError::PoolClosed)?;
        queue.send(job).map_err(|_| FeaturizeError::PoolClosed)?;
        self.submitted += 1;
        Ok(())
    }

    /// An outcome that is already available, without waiting.
    pub fn try_next_outcome(&mut self) -> Option<Outcome> {
        let outcome = self.results.try_recv().ok()?;
        self.collected += 1;
        Some(outcome)
    }

    /// Wait for the next completed job. `None` once every submitted job has
    /// been collected.
    pub async fn next_outcome(&mut self) -> Option<Outcome> {
        if self.pending() == 0 {
            return None;
        }
        let outcome = self.results.recv().await?;
        self.collected += 1;
        Some(outcome)
    }

    /// Stop accepting jobs; workers exit once the queue is empty.
    pub fn close(&mut self) {
        self.queue.take();
    }

    /// Close the queue and wait for every worker to exit.
    pub async fn shutdown(mut self) {
        self.close();
        for res in join_all(self.workers.drain(..)).await {
            if let Err(e) = res {
                error!("worker exited abnormally: {}", e);
            }
        }
    }
}

async fn worker_loop(
    id: usize,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    results: mpsc::UnboundedSender<Outcome>,
    sink: Arc<dyn OutputSink>,
) {
    loop {
        // the lock is only held while waiting for the next job
        let job = { queue.lock().await.recv().await };
        let Some(job) = job else {
            break;
        };

        debug!(worker = id, dataset = job.dataset_name(), featurizer = job.plugin_name(), "job picked up");
        let outcome = job.execute(sink.clone()).await;
        if results.send(outcome).is_err() {
            break;
        }
    }
    debug!(worker = id, "worker stopped");
}
