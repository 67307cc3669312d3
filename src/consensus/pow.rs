//! Proof-of-work nonce search.
//!
//! The miner increments `nonce` and rehashes until the block hash starts with `difficulty`
//! hex zeros. There is no iteration cap; the only way out short of success is the
//! cooperative `CancelFlag`, polled every `CANCEL_POLL_INTERVAL` attempts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::ledger::types::VoteBlock;
use crate::utils::{LedgerError, Result};

pub const DEFAULT_DIFFICULTY: u32 = 4;
/// Hard ceiling: a SHA-256 hex digest has 64 characters.
pub const MAX_DIFFICULTY: u32 = 64;

const CANCEL_POLL_INTERVAL: u64 = 1024;

/// Cooperative cancellation shared between a mining job and whoever may abort it.
/// A flag created with `child_of` also observes its parent (e.g. pool shutdown).
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    own: Arc<AtomicBool>,
    parent: Option<Arc<AtomicBool>>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child_of(parent: &CancelFlag) -> Self {
        Self {
            own: Arc::new(AtomicBool::new(false)),
            parent: Some(parent.own.clone()),
        }
    }

    pub fn cancel(&self) {
        self.own.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.own.load(Ordering::SeqCst)
            || self.parent.as_ref().map_or(false, |p| p.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: u32,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self { difficulty: DEFAULT_DIFFICULTY }
    }
}

impl ProofOfWork {
    pub fn new(difficulty: u32) -> Result<Self> {
        if difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::Config(format!(
                "difficulty {} exceeds hash width {}",
                difficulty, MAX_DIFFICULTY
            )));
        }
        Ok(Self { difficulty })
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn is_satisfied(&self, hash: &str) -> bool {
        let d = self.difficulty as usize;
        hash.len() >= d && hash.bytes().take(d).all(|b| b == b'0')
    }

    /// Search for a nonce in place. Always hashes at least once, so `block.hash` is
    /// populated on success. Returns the number of attempts.
    pub fn mine(&self, block: &mut VoteBlock, cancel: &CancelFlag) -> Result<u64> {
        let mut attempts: u64 = 0;
        loop {
            if attempts % CANCEL_POLL_INTERVAL == 0 && cancel.is_cancelled() {
                debug!(index = block.index, attempts, "mining cancelled");
                return Err(LedgerError::MiningCancelled);
            }

            block.nonce = block.nonce.wrapping_add(1);
            block.hash = block.calculate_hash();
            attempts += 1;

            if self.is_satisfied(&block.hash) {
                debug!(index = block.index, nonce = block.nonce, attempts, "block mined");
                return Ok(attempts);
            }
        }
    }
}
