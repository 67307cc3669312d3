//! Bounded pool for CPU-bound mining jobs.
//!
//! Each job runs on tokio's blocking thread pool behind a semaphore permit, so at most
//! `workers` nonce searches are in flight and async request handlers never mine inline.
//! A timeout cancels the job's `CancelFlag` and then waits for the job to stop, so the
//! caller always sees what the job actually did. `close()` cancels every in-flight job and
//! refuses new ones.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{error, warn};

use crate::consensus::pow::CancelFlag;
use crate::utils::{LedgerError, Result, METRICS};

#[derive(Clone)]
pub struct MiningPool {
    permits: Arc<Semaphore>,
    workers: usize,
    timeout: Option<Duration>,
    shutdown: CancelFlag,
}

impl MiningPool {
    pub fn new(workers: usize, timeout: Option<Duration>) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
            timeout,
            shutdown: CancelFlag::new(),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `job` on a blocking worker and await its result.
    pub async fn run<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(CancelFlag) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| LedgerError::WorkerUnavailable("mining pool closed".into()))?;

        let cancel = CancelFlag::child_of(&self.shutdown);
        let job_cancel = cancel.clone();
        let mut handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job(job_cancel)
        });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    cancel.cancel();
                    warn!("mining job exceeded {:?}; cancelling", limit);
                    // the job may have committed before it saw the flag; its outcome wins
                    match handle.await {
                        Ok(Err(LedgerError::MiningCancelled)) => {
                            METRICS.inc_counter("mining_cancelled");
                            return Err(LedgerError::MiningTimedOut(limit.as_millis() as u64));
                        }
                        other => other,
                    }
                }
            },
            None => handle.await,
        };

        joined.map_err(|e| {
            error!("mining worker failed: {:?}", e);
            LedgerError::WorkerUnavailable(e.to_string())
        })?
    }

    /// Cancel in-flight jobs and stop accepting new ones.
    pub fn close(&self) {
        self.shutdown.cancel();
        self.permits.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use futures::future::join_all;

    #[tokio::test]
    async fn test_runs_job_and_returns_value() {
        let pool = MiningPool::new(2, None);
        let v = pool.run(|_cancel| Ok(41 + 1)).await.unwrap();
        assert_eq!(v, 42);
    }

    #[tokio::test]
    async fn test_job_error_propagates() {
        let pool = MiningPool::new(1, None);
        let res: Result<()> = pool.run(|_| Err(LedgerError::MiningCancelled)).await;
        assert!(matches!(res, Err(LedgerError::MiningCancelled)));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let pool = MiningPool::new(2, None);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs = (0..6).map(|_| {
            let pool = pool.clone();
            let active = active.clone();
            let peak = peak.clone();
            async move {
                pool.run(move |_| {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(30));
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }
        });

        for res in join_all(jobs).await {
            res.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_timeout_cancels_job() {
        let pool = MiningPool::new(1, Some(Duration::from_millis(20)));
        let observed = Arc::new(AtomicUsize::new(0));
        let seen = observed.clone();

        let res: Result<()> = pool
            .run(move |cancel| {
                while !cancel.is_cancelled() {
                    std::thread::sleep(Duration::from_millis(1));
                }
                seen.store(1, Ordering::SeqCst);
                Err(LedgerError::MiningCancelled)
            })
            .await;

        assert!(matches!(res, Err(LedgerError::MiningTimedOut(20))));
        // run() only returns once the job has stopped
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_late_success_after_timeout_is_reported() {
        let pool = MiningPool::new(1, Some(Duration::from_millis(5)));
        let res = pool
            .run(|_cancel| {
                // finishes past the deadline without polling the flag
                std::thread::sleep(Duration::from_millis(40));
                Ok("appended")
            })
            .await;
        assert_eq!(res.unwrap(), "appended");
    }

    #[tokio::test]
    async fn test_closed_pool_refuses_jobs() {
        let pool = MiningPool::new(1, None);
        pool.close();
        let res = pool.run(|_| Ok(())).await;
        assert!(matches!(res, Err(LedgerError::WorkerUnavailable(_))));
    }
}
