//! Node orchestration: wire ledger, mining pool, election store, voting service and rpc.

use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::consensus::MiningPool;
use crate::ledger::VoteLedger;
use crate::node::config::NodeConfig;
use crate::node::service_handle::ServiceHandle;
use crate::rpc::{RpcHandler, RpcServer};
use crate::state::{ElectionStore, InMemElectionStore, RegistrySeed};
use crate::utils::{Clock, SystemClock, METRICS};
use crate::voting::VoteService;

/// Main Node object
pub struct Node {
    cfg: NodeConfig,
    clock: Arc<dyn Clock>,
}

impl Node {
    pub fn new(cfg: NodeConfig) -> Self {
        Self::with_clock(cfg, Arc::new(SystemClock))
    }

    pub fn with_clock(cfg: NodeConfig, clock: Arc<dyn Clock>) -> Self {
        Self { cfg, clock }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.cfg
    }

    /// In-memory store, seeded from `registry.path` when configured.
    pub fn load_store(&self) -> Result<Arc<dyn ElectionStore>> {
        let store = match &self.cfg.registry.path {
            Some(path) => {
                let seed = RegistrySeed::load(path)?;
                info!(
                    voters = seed.voters.len(),
                    elections = seed.elections.len(),
                    candidates = seed.candidates.len(),
                    "registry seeded from {}",
                    path.display()
                );
                InMemElectionStore::from_seed(seed)
            }
            None => InMemElectionStore::new(),
        };
        Ok(Arc::new(store))
    }

    /// Build the voting service on top of `store`.
    pub fn build_service(&self, store: Arc<dyn ElectionStore>) -> Result<Arc<VoteService>> {
        let ledger = Arc::new(VoteLedger::new(
            self.cfg.proof_of_work()?,
            self.cfg.commitments(),
            self.cfg.ledger.vote_lookup,
            self.clock.as_ref(),
        )
        .with_metrics(METRICS.clone()));
        let pool = MiningPool::new(self.cfg.ledger.mining_workers, self.cfg.mining_timeout());

        Ok(Arc::new(VoteService::new(
            ledger,
            pool,
            store,
            self.cfg.encryption(),
            self.cfg.receipt_issuer(self.clock.clone()),
            self.clock.clone(),
        )))
    }

    /// Start the node: spawn the rpc server and return ServiceHandle for graceful shutdown.
    pub async fn start(self) -> Result<ServiceHandle> {
        let store = self.load_store()?;
        let service = self.build_service(store)?;
        let rpc_addr = self.cfg.rpc_addr()?;

        let (mut svc_handle, shutdown_rx) = ServiceHandle::new();
        svc_handle.attach_pool(service.pool().clone());

        let server = RpcServer::new(rpc_addr, RpcHandler::new(service.clone()));
        let h: JoinHandle<anyhow::Result<()>> = tokio::spawn(async move {
            if let Err(e) = server.start(shutdown_rx).await {
                error!("RPC server failed: {:?}", e);
                return Err(e);
            }
            Ok(())
        });
        svc_handle.attach(h);

        info!(
            difficulty = service.ledger().difficulty(),
            workers = service.pool().workers(),
            lookup = ?service.ledger().lookup_scope(),
            "Node started, RPC: {}",
            rpc_addr
        );
        Ok(svc_handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CandidateRecord, ElectionRecord, VoterRecord};
    use crate::voting::CastVoteRequest;

    #[tokio::test]
    async fn test_build_service_from_config() {
        let mut cfg = NodeConfig::default();
        cfg.ledger.difficulty = 1;
        let node = Node::new(cfg);

        let store = InMemElectionStore::new();
        store.put_voter(VoterRecord { id: "V1".into(), is_verified: true, is_active: true });
        store.put_election(ElectionRecord { id: "E1".into(), title: String::new(), is_active: true });
        store.put_candidate(CandidateRecord {
            id: "C1".into(),
            election_id: "E1".into(),
            name: String::new(),
            is_active: true,
        });

        let service = node.build_service(Arc::new(store)).unwrap();
        assert_eq!(service.ledger().difficulty(), 1);
        assert_eq!(service.pool().workers(), 2);

        let resp = service.cast_vote(&CastVoteRequest::new("V1", "C1", "E1")).await;
        assert!(resp.success, "{:?}", resp.error);
        assert_eq!(service.blockchain_stats().total_blocks, 2);
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let mut cfg = NodeConfig::default();
        cfg.rpc.bind = "127.0.0.1:0".into();
        let handle = Node::new(cfg).start().await.unwrap();
        handle.shutdown().await.unwrap();
    }
}
