//! Voting module: the casting orchestrator and its caller-facing results.

pub mod types;
pub mod eligibility;
pub mod service;

pub use types::{
    BlockchainStats, CastState, CastVoteRequest, CastVoteResponse, Rejection, VoteVerification,
};
pub use eligibility::EligibilityChecker;
pub use service::VoteService;
