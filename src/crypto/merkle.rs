//! Merkle aggregation over vote commitments.
//!
//! Leaves are SHA-256 of `voter_id ++ candidate_id ++ election_id ++ timestamp`; each level
//! pairs adjacent hex hashes and hashes their concatenation, duplicating the last element
//! of an odd level. An empty batch yields the sentinel "0".

use crate::crypto::hash::sha256_hex;
use crate::ledger::types::{Vote, GENESIS_SENTINEL};

pub fn leaf_hash(vote: &Vote) -> String {
    sha256_hex(format!(
        "{}{}{}{}",
        vote.voter_id, vote.candidate_id, vote.election_id, vote.timestamp
    ))
}

pub fn merkle_root(votes: &[Vote]) -> String {
    root_of_leaves(votes.iter().map(leaf_hash).collect())
}

pub fn root_of_leaves(mut level: Vec<String>) -> String {
    if level.is_empty() {
        return GENESIS_SENTINEL.to_string();
    }

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                sha256_hex(format!("{}{}", left, right))
            })
            .collect();
    }

    level.swap_remove(0)
}
