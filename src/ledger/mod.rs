//! Append-only vote ledger.
//!
//! Blocks live in a contiguous arena guarded by a `RwLock`; readers never wait on mining.
//! `add_vote` holds `append_lock` across read-latest -> mine -> push so two appends cannot
//! interleave and break index monotonicity or previous-hash linkage. The chain is memory
//! only: a restart begins again from a fresh genesis block.

pub mod types;
pub mod index;

pub use types::{Vote, VoteBlock, GENESIS_SENTINEL};
pub use index::BlockIndex;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::consensus::pow::{CancelFlag, ProofOfWork};
use crate::crypto::commitment::Commitments;
use crate::crypto::merkle::merkle_root;
use crate::utils::{Clock, LedgerError, MetricsRegistry, Result, SystemClock};

/// How `verify_vote_exists` treats its election argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteLookupScope {
    /// Match on voter hash alone, across every election.
    #[default]
    Unscoped,
    /// Match on voter hash and the election recorded when the block was appended.
    Scoped,
}

struct Chain {
    blocks: Vec<VoteBlock>,
    index: BlockIndex,
}

pub struct VoteLedger {
    chain: RwLock<Chain>,
    append_lock: Mutex<()>,
    pow: ProofOfWork,
    commitments: Commitments,
    lookup_scope: VoteLookupScope,
    metrics: Option<MetricsRegistry>,
}

impl VoteLedger {
    pub fn new(
        pow: ProofOfWork,
        commitments: Commitments,
        lookup_scope: VoteLookupScope,
        clock: &dyn Clock,
    ) -> Self {
        let genesis = VoteBlock::genesis(clock.now_millis());
        let mut index = BlockIndex::new();
        index.add(&genesis, None);

        Self {
            chain: RwLock::new(Chain { blocks: vec![genesis], index }),
            append_lock: Mutex::new(()),
            pow,
            commitments,
            lookup_scope,
            metrics: None,
        }
    }

    /// Report appends to `registry`. Only the ledger a node serves should publish, since
    /// the gauges describe a single chain.
    pub fn with_metrics(mut self, registry: MetricsRegistry) -> Self {
        registry.set_gauge("chain_length", self.chain_length() as f64);
        self.metrics = Some(registry);
        self
    }

    /// Ledger with legacy salts, unscoped lookups and the system clock.
    pub fn with_difficulty(difficulty: u32) -> Result<Self> {
        Ok(Self::new(
            ProofOfWork::new(difficulty)?,
            Commitments::default(),
            VoteLookupScope::default(),
            &SystemClock,
        ))
    }

    pub fn commitments(&self) -> &Commitments {
        &self.commitments
    }

    pub fn difficulty(&self) -> u32 {
        self.pow.difficulty()
    }

    pub fn lookup_scope(&self) -> VoteLookupScope {
        self.lookup_scope
    }

    /// Anonymize, mine and append one vote; returns the new block's hash.
    /// Blocking and CPU-bound: async callers go through `MiningPool`.
    pub fn add_vote(&self, vote: &Vote, cancel: &CancelFlag) -> Result<String> {
        let _writer = self.append_lock.lock();

        let previous = self.latest_block();
        let mut block = VoteBlock {
            index: previous.index + 1,
            timestamp: vote.timestamp,
            voter_hash: self.commitments.anonymize_voter(&vote.voter_id, &vote.election_id),
            candidate_hash: self.commitments.commit_candidate(&vote.candidate_id, &vote.voter_id),
            previous_hash: previous.hash,
            hash: String::new(),
            nonce: 0,
            merkle_root: merkle_root(std::slice::from_ref(vote)),
        };

        let attempts = self.pow.mine(&mut block, cancel)?;

        let hash = block.hash.clone();
        let length = {
            let mut chain = self.chain.write();
            // a run cancelled after its nonce was found must not append
            if cancel.is_cancelled() {
                debug!(index = block.index, "mined block discarded after cancellation");
                return Err(LedgerError::MiningCancelled);
            }
            chain.index.add(&block, Some(&vote.election_id));
            chain.blocks.push(block);
            chain.blocks.len()
        };

        if let Some(metrics) = &self.metrics {
            metrics.inc_counter("blocks_mined");
            metrics.set_gauge("chain_length", length as f64);
            metrics.set_gauge("last_mining_iterations", attempts as f64);
        }
        info!("vote added to ledger: block {} hash {}", length - 1, hash);
        Ok(hash)
    }

    pub fn latest_block(&self) -> VoteBlock {
        let chain = self.chain.read();
        // genesis is never removed
        chain.blocks[chain.blocks.len() - 1].clone()
    }

    pub fn block_by_index(&self, index: u64) -> Option<VoteBlock> {
        let chain = self.chain.read();
        usize::try_from(index).ok().and_then(|i| chain.blocks.get(i).cloned())
    }

    pub fn chain_length(&self) -> usize {
        self.chain.read().blocks.len()
    }

    /// Streaming O(n) scan: every block after genesis must hash to its stored hash and
    /// link to its predecessor's hash.
    pub fn is_chain_valid(&self) -> bool {
        let chain = self.chain.read();
        for pair in chain.blocks.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if !current.has_valid_hash() {
                warn!("invalid hash at block {}", current.index);
                return false;
            }
            if current.previous_hash != previous.hash {
                warn!("invalid previous hash at block {}", current.index);
                return false;
            }
        }
        true
    }

    /// Block whose hash is `block_hash`, if any.
    pub fn vote_proof(&self, block_hash: &str) -> Option<VoteBlock> {
        let chain = self.chain.read();
        let position = chain.index.position(block_hash)?;
        chain.blocks.get(position as usize).cloned()
    }

    /// Whether any non-genesis block carries `voter_hash`; see `VoteLookupScope` for how
    /// `election_id` participates.
    pub fn verify_vote_exists(&self, voter_hash: &str, election_id: &str) -> bool {
        let chain = self.chain.read();
        chain.blocks.iter().skip(1).any(|block| {
            block.voter_hash == voter_hash
                && match self.lookup_scope {
                    VoteLookupScope::Unscoped => true,
                    VoteLookupScope::Scoped => {
                        chain.index.election_of(block.index) == Some(election_id)
                    }
                }
        })
    }

    #[cfg(test)]
    fn tamper(&self, index: usize, f: impl FnOnce(&mut VoteBlock)) {
        let mut chain = self.chain.write();
        f(&mut chain.blocks[index]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ManualClock;
    use std::sync::Arc;

    const T0: u64 = 1_700_000_000_000;

    fn ledger(scope: VoteLookupScope) -> VoteLedger {
        VoteLedger::new(
            ProofOfWork::new(2).unwrap(),
            Commitments::default(),
            scope,
            &ManualClock::new(T0),
        )
    }

    fn vote(voter: &str, election: &str, ts: u64) -> Vote {
        Vote::new(voter, "C1", election, ts)
    }

    #[test]
    fn test_fresh_ledger_is_genesis_only() {
        let l = ledger(VoteLookupScope::Unscoped);
        assert_eq!(l.chain_length(), 1);
        assert!(l.is_chain_valid());

        let g = l.latest_block();
        assert_eq!(g.index, 0);
        assert_eq!(g.previous_hash, "0");
        assert_eq!(g.timestamp, T0);
        assert!(g.has_valid_hash());
        assert_eq!(l.block_by_index(0), Some(g));
        assert!(l.block_by_index(1).is_none());
    }

    #[test]
    fn test_add_vote_links_and_anonymizes() {
        let l = ledger(VoteLookupScope::Unscoped);
        let v = vote("V1", "E1", T0 + 1);
        let hash = l.add_vote(&v, &CancelFlag::new()).unwrap();

        let block = l.vote_proof(&hash).unwrap();
        assert_eq!(block.index, 1);
        assert_eq!(block.timestamp, T0 + 1);
        assert!(block.hash.starts_with("00"));
        assert_eq!(block.previous_hash, l.block_by_index(0).unwrap().hash);
        assert_eq!(block.voter_hash, l.commitments().anonymize_voter("V1", "E1"));
        assert_eq!(block.candidate_hash, l.commitments().commit_candidate("C1", "V1"));
        assert_eq!(block.merkle_root, merkle_root(&[v]));
        assert!(!serde_json::to_string(&block).unwrap().contains("V1"));
    }

    #[test]
    fn test_n_appends_keep_chain_valid() {
        let l = ledger(VoteLookupScope::Unscoped);
        for i in 0..5u64 {
            l.add_vote(&vote(&format!("V{}", i), "E1", T0 + i), &CancelFlag::new())
                .unwrap();
            assert!(l.is_chain_valid());
        }
        assert_eq!(l.chain_length(), 6);
        for i in 1..6u64 {
            let cur = l.block_by_index(i).unwrap();
            let prev = l.block_by_index(i - 1).unwrap();
            assert_eq!(cur.index, i);
            assert_eq!(cur.previous_hash, prev.hash);
        }
    }

    #[test]
    fn test_tampering_is_detected() {
        let l = ledger(VoteLookupScope::Unscoped);
        l.add_vote(&vote("V1", "E1", T0), &CancelFlag::new()).unwrap();
        l.add_vote(&vote("V2", "E1", T0), &CancelFlag::new()).unwrap();

        l.tamper(1, |b| b.candidate_hash = "f".repeat(64));
        assert!(!l.is_chain_valid());
    }

    #[test]
    fn test_broken_link_is_detected() {
        let l = ledger(VoteLookupScope::Unscoped);
        l.add_vote(&vote("V1", "E1", T0), &CancelFlag::new()).unwrap();
        l.tamper(1, |b| {
            b.previous_hash = "e".repeat(64);
            b.hash = b.calculate_hash();
        });
        assert!(!l.is_chain_valid());
    }

    #[test]
    fn test_cancelled_mining_does_not_append() {
        let l = ledger(VoteLookupScope::Unscoped);
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert!(l.add_vote(&vote("V1", "E1", T0), &cancel).is_err());
        assert_eq!(l.chain_length(), 1);
    }

    #[test]
    fn test_with_difficulty_uses_legacy_defaults() {
        let l = VoteLedger::with_difficulty(1).unwrap();
        assert_eq!(l.difficulty(), 1);
        assert_eq!(l.lookup_scope(), VoteLookupScope::Unscoped);
        assert_eq!(l.commitments(), &Commitments::default());
        assert!(VoteLedger::with_difficulty(65).is_err());
    }

    #[test]
    fn test_metrics_reported_only_when_attached() {
        let registry = MetricsRegistry::new();
        let published = ledger(VoteLookupScope::Unscoped).with_metrics(registry.clone());
        let quiet = ledger(VoteLookupScope::Unscoped);

        published.add_vote(&vote("V1", "E1", T0), &CancelFlag::new()).unwrap();
        quiet.add_vote(&vote("V1", "E1", T0), &CancelFlag::new()).unwrap();
        quiet.add_vote(&vote("V2", "E1", T0), &CancelFlag::new()).unwrap();

        let (counters, gauges) = registry.snapshot();
        assert_eq!(counters.get("blocks_mined"), Some(&1));
        assert_eq!(gauges.get("chain_length"), Some(&2.0));
        assert!(gauges.contains_key("last_mining_iterations"));
    }

    #[test]
    fn test_unknown_hash_has_no_proof() {
        let l = ledger(VoteLookupScope::Unscoped);
        assert!(l.vote_proof(&"a".repeat(64)).is_none());
    }

    #[test]
    fn test_genesis_is_never_a_vote() {
        let l = ledger(VoteLookupScope::Unscoped);
        assert!(!l.verify_vote_exists("0", "E1"));
    }

    #[test]
    fn test_unscoped_lookup_ignores_election() {
        let l = ledger(VoteLookupScope::Unscoped);
        l.add_vote(&vote("V1", "E1", T0), &CancelFlag::new()).unwrap();
        let vh = l.commitments().anonymize_voter("V1", "E1");

        assert!(l.verify_vote_exists(&vh, "E1"));
        assert!(l.verify_vote_exists(&vh, "E2"));
        assert!(!l.verify_vote_exists(&"a".repeat(64), "E1"));
    }

    #[test]
    fn test_scoped_lookup_requires_matching_election() {
        let l = ledger(VoteLookupScope::Scoped);
        l.add_vote(&vote("V1", "E1", T0), &CancelFlag::new()).unwrap();
        let vh = l.commitments().anonymize_voter("V1", "E1");

        assert!(l.verify_vote_exists(&vh, "E1"));
        assert!(!l.verify_vote_exists(&vh, "E2"));
    }

    #[test]
    fn test_concurrent_appends_stay_linked() {
        let l = Arc::new(ledger(VoteLookupScope::Unscoped));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let l = l.clone();
                std::thread::spawn(move || {
                    for i in 0..3 {
                        l.add_vote(&vote(&format!("V{}-{}", t, i), "E1", T0), &CancelFlag::new())
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(l.chain_length(), 13);
        assert!(l.is_chain_valid());
    }
}
