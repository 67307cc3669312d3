//! RPC module
//!
//! - REST endpoints: POST /vote/cast, POST /vote/verify, GET /blockchain/stats
//! - JSON-RPC 2.0 endpoint at POST /rpc (cast_vote, verify_vote, blockchain_stats)
//! - Diagnostic endpoints: /health, /metrics
//!
//! Request validation happens here; nothing malformed reaches the voting service.

pub mod server;
pub mod handlers;

pub use server::RpcServer;
pub use handlers::{CastVotePayload, RpcError, RpcHandler, VerifyVotePayload};
