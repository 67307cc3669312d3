use std::collections::HashMap;

use crate::ledger::types::VoteBlock;

/// Side index over the chain: block hash -> position, and position -> election id.
///
/// Election ids are kept here rather than in the block so block hashes stay byte-compatible.
#[derive(Debug, Default)]
pub struct BlockIndex {
    by_hash: HashMap<String, u64>,
    elections: HashMap<u64, String>,
}

impl BlockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, block: &VoteBlock, election_id: Option<&str>) {
        self.by_hash.insert(block.hash.clone(), block.index);
        if let Some(e) = election_id {
            self.elections.insert(block.index, e.to_string());
        }
    }

    pub fn position(&self, hash: &str) -> Option<u64> {
        self.by_hash.get(hash).copied()
    }

    pub fn election_of(&self, index: u64) -> Option<&str> {
        self.elections.get(&index).map(String::as_str)
    }
}
