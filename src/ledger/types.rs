use serde::{Deserialize, Serialize};

use crate::crypto::hash::sha256_hex;

/// Placeholder used for every genesis field that has no real content.
pub const GENESIS_SENTINEL: &str = "0";

/// Ephemeral vote input. Never stored verbatim in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub voter_id: String,
    pub candidate_id: String,
    pub election_id: String,
    pub timestamp: u64,
}

impl Vote {
    pub fn new(
        voter_id: impl Into<String>,
        candidate_id: impl Into<String>,
        election_id: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Self {
            voter_id: voter_id.into(),
            candidate_id: candidate_id.into(),
            election_id: election_id.into(),
            timestamp,
        }
    }
}

/// A finalized ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBlock {
    pub index: u64,
    pub timestamp: u64,
    pub voter_hash: String,
    pub candidate_hash: String,
    pub previous_hash: String,
    pub hash: String,
    pub nonce: u64,
    pub merkle_root: String,
}

impl VoteBlock {
    pub fn genesis(timestamp: u64) -> Self {
        let mut block = Self {
            index: 0,
            timestamp,
            voter_hash: GENESIS_SENTINEL.into(),
            candidate_hash: GENESIS_SENTINEL.into(),
            previous_hash: GENESIS_SENTINEL.into(),
            hash: String::new(),
            nonce: 0,
            merkle_root: GENESIS_SENTINEL.into(),
        };
        block.hash = block.calculate_hash();
        block
    }

    /// SHA-256 over the unseparated concatenation
    /// `index ++ timestamp ++ voter_hash ++ candidate_hash ++ previous_hash ++ nonce ++ merkle_root`.
    /// The field order is part of the receipt format and must not change.
    pub fn calculate_hash(&self) -> String {
        sha256_hex(format!(
            "{}{}{}{}{}{}{}",
            self.index,
            self.timestamp,
            self.voter_hash,
            self.candidate_hash,
            self.previous_hash,
            self.nonce,
            self.merkle_root
        ))
    }

    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.calculate_hash()
    }
}
