//! Consensus module (proof-of-work)
//!
//! Public surface:
//! - ProofOfWork: nonce search against a leading-zero target
//! - CancelFlag: cooperative cancellation polled by the miner
//! - MiningPool: bounded blocking workers that run mining jobs off the async runtime

pub mod pow;
pub mod worker;

pub use pow::{CancelFlag, ProofOfWork, DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
pub use worker::MiningPool;
