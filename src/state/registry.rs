//! Election registry abstractions: the relational collaborator the casting service consults.
//! - Voter / election / candidate / vote records
//! - ElectionStore trait (pluggable persistence engine)
//! - InMemElectionStore (HashMap-backed, seedable from TOML, for tests/dev)
//!
//! Implementations must reject a second vote row for the same (voter, election): the
//! service's pre-check alone cannot stop two concurrent casts.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub id: String,
    pub is_verified: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    pub election_id: String,
    #[serde(default)]
    pub name: String,
    pub is_active: bool,
}

/// Relational row linking a ledger block to the voter, candidate and election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub election_id: String,
    pub voter_id: String,
    pub candidate_id: String,
    pub blockchain_hash: String,
    /// milliseconds since the Unix epoch
    pub vote_timestamp: u64,
    pub is_verified: bool,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("voter {voter_id} already has a vote in election {election_id}")]
    DuplicateVote { voter_id: String, election_id: String },
}

#[async_trait]
pub trait ElectionStore: Send + Sync + 'static {
    async fn voter(&self, id: &str) -> Result<Option<VoterRecord>>;
    async fn election(&self, id: &str) -> Result<Option<ElectionRecord>>;
    async fn candidate(&self, id: &str) -> Result<Option<CandidateRecord>>;
    async fn existing_vote(&self, voter_id: &str, election_id: &str) -> Result<Option<VoteRecord>>;
    /// Must fail with `StoreError::DuplicateVote` when a row for the pair already exists.
    async fn insert_vote(&self, record: VoteRecord) -> Result<()>;
}

/// Seed file layout for the in-memory store.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegistrySeed {
    #[serde(default)]
    pub voters: Vec<VoterRecord>,
    #[serde(default)]
    pub elections: Vec<ElectionRecord>,
    #[serde(default)]
    pub candidates: Vec<CandidateRecord>,
}

impl RegistrySeed {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&data)?)
    }
}

#[derive(Debug, Default)]
struct Tables {
    voters: HashMap<String, VoterRecord>,
    elections: HashMap<String, ElectionRecord>,
    candidates: HashMap<String, CandidateRecord>,
    // unique on (voter_id, election_id)
    votes: HashMap<(String, String), VoteRecord>,
}

/// In-memory election store (good for tests/dev)
#[derive(Debug, Default, Clone)]
pub struct InMemElectionStore {
    inner: Arc<RwLock<Tables>>,
}

impl InMemElectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: RegistrySeed) -> Self {
        let store = Self::new();
        for v in seed.voters {
            store.put_voter(v);
        }
        for e in seed.elections {
            store.put_election(e);
        }
        for c in seed.candidates {
            store.put_candidate(c);
        }
        store
    }

    pub fn put_voter(&self, voter: VoterRecord) {
        self.inner.write().voters.insert(voter.id.clone(), voter);
    }

    pub fn put_election(&self, election: ElectionRecord) {
        self.inner.write().elections.insert(election.id.clone(), election);
    }

    pub fn put_candidate(&self, candidate: CandidateRecord) {
        self.inner.write().candidates.insert(candidate.id.clone(), candidate);
    }

    pub fn vote_count(&self) -> usize {
        self.inner.read().votes.len()
    }
}

#[async_trait]
impl ElectionStore for InMemElectionStore {
    async fn voter(&self, id: &str) -> Result<Option<VoterRecord>> {
        Ok(self.inner.read().voters.get(id).cloned())
    }

    async fn election(&self, id: &str) -> Result<Option<ElectionRecord>> {
        Ok(self.inner.read().elections.get(id).cloned())
    }

    async fn candidate(&self, id: &str) -> Result<Option<CandidateRecord>> {
        Ok(self.inner.read().candidates.get(id).cloned())
    }

    async fn existing_vote(&self, voter_id: &str, election_id: &str) -> Result<Option<VoteRecord>> {
        let key = (voter_id.to_string(), election_id.to_string());
        Ok(self.inner.read().votes.get(&key).cloned())
    }

    async fn insert_vote(&self, record: VoteRecord) -> Result<()> {
        let key = (record.voter_id.clone(), record.election_id.clone());
        let mut tables = self.inner.write();
        if tables.votes.contains_key(&key) {
            return Err(StoreError::DuplicateVote {
                voter_id: record.voter_id,
                election_id: record.election_id,
            }
            .into());
        }
        tables.votes.insert(key, record);
        Ok(())
    }
}
