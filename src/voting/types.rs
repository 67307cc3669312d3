use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::receipt::VoteProof;
use crate::ledger::VoteBlock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub voter_id: String,
    pub candidate_id: String,
    pub election_id: String,
}

impl CastVoteRequest {
    pub fn new(
        voter_id: impl Into<String>,
        candidate_id: impl Into<String>,
        election_id: impl Into<String>,
    ) -> Self {
        Self {
            voter_id: voter_id.into(),
            candidate_id: candidate_id.into(),
            election_id: election_id.into(),
        }
    }
}

/// Outcome of a cast. Every path, including failures, is expressed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_proof: Option<VoteProof>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CastVoteResponse {
    pub fn accepted(blockchain_hash: String, vote_proof: VoteProof) -> Self {
        Self {
            success: true,
            blockchain_hash: Some(blockchain_hash),
            vote_proof: Some(vote_proof),
            error: None,
        }
    }

    pub fn rejected(reason: &Rejection) -> Self {
        Self {
            success: false,
            blockchain_hash: None,
            vote_proof: None,
            error: Some(reason.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteVerification {
    pub is_valid: bool,
    pub blockchain_hash: String,
    pub timestamp: u64,
    /// the block's voter commitment
    pub voter_proof: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainStats {
    pub total_blocks: usize,
    pub is_valid: bool,
    pub latest_block: VoteBlock,
}

/// Why a cast was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("voter not found or not verified")]
    VoterNotEligible,

    #[error("already voted")]
    AlreadyVoted,

    #[error("election not active")]
    ElectionNotActive,

    #[error("candidate not found")]
    CandidateNotFound,

    #[error("eligibility check failed: {0}")]
    StoreUnavailable(String),

    #[error("ledger append failed: {0}")]
    LedgerUnavailable(String),

    #[error("failed to record vote")]
    PersistenceFailed,
}

/// Casting state machine:
/// `Pending -> VoterValidated -> ElectionValidated -> CandidateValidated -> Recorded -> ProofIssued`,
/// or `Rejected` from any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastState {
    Pending,
    VoterValidated,
    ElectionValidated,
    CandidateValidated,
    Recorded { blockchain_hash: String },
    ProofIssued,
    Rejected(Rejection),
}

impl CastState {
    pub fn name(&self) -> &'static str {
        match self {
            CastState::Pending => "pending",
            CastState::VoterValidated => "voter_validated",
            CastState::ElectionValidated => "election_validated",
            CastState::CandidateValidated => "candidate_validated",
            CastState::Recorded { .. } => "recorded",
            CastState::ProofIssued => "proof_issued",
            CastState::Rejected(_) => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CastState::ProofIssued | CastState::Rejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(Rejection::VoterNotEligible.to_string(), "voter not found or not verified");
        assert_eq!(Rejection::AlreadyVoted.to_string(), "already voted");
        assert_eq!(Rejection::ElectionNotActive.to_string(), "election not active");
        assert_eq!(Rejection::CandidateNotFound.to_string(), "candidate not found");
    }

    #[test]
    fn test_rejected_response_shape() {
        let resp = CastVoteResponse::rejected(&Rejection::AlreadyVoted);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "already voted");
        assert!(json.get("blockchainHash").is_none());
        assert!(json.get("voteProof").is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(CastState::ProofIssued.is_terminal());
        assert!(CastState::Rejected(Rejection::AlreadyVoted).is_terminal());
        assert!(!CastState::Recorded { blockchain_hash: String::new() }.is_terminal());
        assert_eq!(CastState::CandidateValidated.name(), "candidate_validated");
    }
}
