//! Append-only proof-of-work vote ledger.
//!
//! - utils: errors, logging, metrics, clock
//! - crypto: commitments, merkle roots, transport encryption, receipts
//! - consensus: proof-of-work miner and the bounded mining pool
//! - ledger: vote blocks and the chain
//! - state: election store (voters, elections, candidates, vote rows)
//! - voting: casting orchestrator
//! - rpc: HTTP / JSON-RPC boundary
//! - node: config, wiring, CLI

pub mod utils;
pub mod crypto;
pub mod consensus;
pub mod ledger;
pub mod state;
pub mod voting;
pub mod rpc;
pub mod node;
