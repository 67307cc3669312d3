use tokio::sync::watch;
use tokio::task::JoinHandle;
use anyhow::Result;

use crate::consensus::MiningPool;

/// Holds running tasks, the mining pool and the shutdown channel for the node.
/// Call `shutdown()` to gracefully stop services.
pub struct ServiceHandle {
    shutdown_tx: watch::Sender<bool>,
    join_handles: Vec<JoinHandle<anyhow::Result<()>>>,
    pools: Vec<MiningPool>,
}

impl ServiceHandle {
    /// Create a new ServiceHandle and return it together with a Receiver clonable by tasks.
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        let handle = ServiceHandle { shutdown_tx: tx, join_handles: vec![], pools: vec![] };
        (handle, rx)
    }

    /// Attach a background task handle (so we wait on it on shutdown).
    pub fn attach(&mut self, h: JoinHandle<anyhow::Result<()>>) {
        self.join_handles.push(h);
    }

    /// Attach a mining pool; shutdown cancels its in-flight jobs.
    pub fn attach_pool(&mut self, pool: MiningPool) {
        self.pools.push(pool);
    }

    /// Cancel mining, signal shutdown to all tasks and await them sequentially.
    pub async fn shutdown(self) -> Result<()> {
        for pool in &self.pools {
            pool.close();
        }
        let _ = self.shutdown_tx.send(true);

        for h in self.join_handles {
            match h.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("service task returned error: {:?}", e),
                Err(e) => tracing::error!("task join error: {:?}", e),
            }
        }
        Ok(())
    }

    /// Return a cloneable shutdown receiver for tasks that need to observe shutdown state.
    pub fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::LedgerError;

    #[tokio::test]
    async fn test_shutdown_signals_tasks_and_closes_pool() {
        let (mut handle, mut rx) = ServiceHandle::new();
        let pool = MiningPool::new(1, None);
        handle.attach_pool(pool.clone());
        handle.attach(tokio::spawn(async move {
            let _ = rx.wait_for(|stop| *stop).await;
            Ok::<(), anyhow::Error>(())
        }));

        let late = handle.shutdown_rx();
        handle.shutdown().await.unwrap();

        assert!(*late.borrow());
        let refused = pool.run(|_| Ok(())).await;
        assert!(matches!(refused, Err(LedgerError::WorkerUnavailable(_))));
    }
}
