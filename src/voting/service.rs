//! Casting orchestrator.
//!
//! `cast_vote` runs the eligibility gates, mines the vote into the ledger on the mining
//! pool, writes the relational linkage row and issues a receipt. It never returns an
//! error: every outcome is a `CastVoteResponse`.
//!
//! If the linkage insert fails after the block was appended, the block stays in the chain
//! without a relational row. There is no compensating rollback.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::consensus::MiningPool;
use crate::crypto::receipt::{ReceiptIssuer, VoteProof};
use crate::crypto::transport::VoteEncryption;
use crate::ledger::{Vote, VoteLedger};
use crate::state::{ElectionStore, VoteRecord};
use crate::utils::{Clock, METRICS};
use crate::voting::eligibility::{advance, EligibilityChecker};
use crate::voting::types::{
    BlockchainStats, CastState, CastVoteRequest, CastVoteResponse, Rejection, VoteVerification,
};

pub struct VoteService {
    ledger: Arc<VoteLedger>,
    pool: MiningPool,
    store: Arc<dyn ElectionStore>,
    eligibility: EligibilityChecker,
    encryption: VoteEncryption,
    receipts: ReceiptIssuer,
    clock: Arc<dyn Clock>,
}

impl VoteService {
    pub fn new(
        ledger: Arc<VoteLedger>,
        pool: MiningPool,
        store: Arc<dyn ElectionStore>,
        encryption: VoteEncryption,
        receipts: ReceiptIssuer,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            pool,
            eligibility: EligibilityChecker::new(store.clone()),
            store,
            encryption,
            receipts,
            clock,
        }
    }

    pub fn ledger(&self) -> &Arc<VoteLedger> {
        &self.ledger
    }

    pub fn pool(&self) -> &MiningPool {
        &self.pool
    }

    pub fn receipts(&self) -> &ReceiptIssuer {
        &self.receipts
    }

    pub async fn cast_vote(&self, req: &CastVoteRequest) -> CastVoteResponse {
        let (state, outcome) = self.execute(req).await;
        match outcome {
            Ok((blockchain_hash, proof)) => {
                METRICS.inc_counter("votes_cast");
                info!(state = state.name(), "vote cast successfully: block {}", blockchain_hash);
                CastVoteResponse::accepted(blockchain_hash, proof)
            }
            Err(reason) => {
                METRICS.inc_counter("votes_rejected");
                warn!(
                    voter = %req.voter_id,
                    election = %req.election_id,
                    state = state.name(),
                    "vote cast refused: {}",
                    reason
                );
                CastVoteResponse::rejected(&reason)
            }
        }
    }

    /// Drive one cast to a terminal state: `ProofIssued` or `Rejected`.
    async fn execute(
        &self,
        req: &CastVoteRequest,
    ) -> (CastState, Result<(String, VoteProof), Rejection>) {
        let mut state = CastState::Pending;
        let outcome = self.run_cast(req, &mut state).await;
        if let Err(reason) = &outcome {
            advance(&mut state, CastState::Rejected(reason.clone()));
        }
        (state, outcome)
    }

    async fn run_cast(
        &self,
        req: &CastVoteRequest,
        state: &mut CastState,
    ) -> Result<(String, VoteProof), Rejection> {
        self.eligibility.check(req, state).await?;

        let timestamp = self.clock.now_millis();
        let vote = Vote::new(&req.voter_id, &req.candidate_id, &req.election_id, timestamp);

        // transport copy of the vote; only its voter proof is surfaced
        match self
            .encryption
            .encrypt_vote(&req.voter_id, &req.candidate_id, &req.election_id, timestamp)
        {
            Ok(sealed) => debug!(voter_proof = %sealed.voter_proof, "vote sealed for transport"),
            Err(e) => warn!("transport encryption failed: {}", e),
        }

        let ledger = self.ledger.clone();
        let mined = vote.clone();
        let blockchain_hash = self
            .pool
            .run(move |cancel| ledger.add_vote(&mined, &cancel))
            .await
            .map_err(|e| Rejection::LedgerUnavailable(e.to_string()))?;
        advance(state, CastState::Recorded { blockchain_hash: blockchain_hash.clone() });

        let record = VoteRecord {
            election_id: vote.election_id.clone(),
            voter_id: vote.voter_id.clone(),
            candidate_id: vote.candidate_id.clone(),
            blockchain_hash: blockchain_hash.clone(),
            vote_timestamp: timestamp,
            is_verified: true,
        };
        if let Err(e) = self.store.insert_vote(record).await {
            warn!(
                "block {} appended but vote row insert failed; ledger and store diverge: {:?}",
                blockchain_hash, e
            );
            return Err(Rejection::PersistenceFailed);
        }

        let proof = self.receipts.issue(&req.voter_id, &req.candidate_id, &req.election_id);
        advance(state, CastState::ProofIssued);
        Ok((blockchain_hash, proof))
    }

    pub fn verify_vote(&self, blockchain_hash: &str) -> Option<VoteVerification> {
        let block = self.ledger.vote_proof(blockchain_hash)?;
        Some(VoteVerification {
            is_valid: true,
            blockchain_hash: block.hash,
            timestamp: block.timestamp,
            voter_proof: block.voter_hash,
        })
    }

    pub fn blockchain_stats(&self) -> BlockchainStats {
        BlockchainStats {
            total_blocks: self.ledger.chain_length(),
            is_valid: self.ledger.is_chain_valid(),
            latest_block: self.ledger.latest_block(),
        }
    }

    pub async fn can_voter_vote(&self, voter_id: &str, election_id: &str) -> bool {
        self.eligibility.can_vote(voter_id, election_id).await
    }

    pub fn verify_receipt(&self, proof: &VoteProof, election_id: &str) -> bool {
        self.receipts.verify(proof, election_id)
    }
}
