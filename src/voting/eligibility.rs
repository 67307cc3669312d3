//! Eligibility gates 1-4 of the casting state machine, each a lookup against the
//! election store. The first failing gate short-circuits with its `Rejection`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::state::ElectionStore;
use crate::voting::types::{CastState, CastVoteRequest, Rejection};

pub struct EligibilityChecker {
    store: Arc<dyn ElectionStore>,
}

impl EligibilityChecker {
    pub fn new(store: Arc<dyn ElectionStore>) -> Self {
        Self { store }
    }

    /// Advance `state` from `Pending` through `CandidateValidated`. On failure `state` is
    /// left at the last gate passed.
    pub async fn check(&self, req: &CastVoteRequest, state: &mut CastState) -> Result<(), Rejection> {
        // gate 1: voter exists, verified, active
        match self.store.voter(&req.voter_id).await {
            Ok(Some(v)) if v.is_verified && v.is_active => {}
            Ok(_) => return Err(Rejection::VoterNotEligible),
            Err(e) => {
                warn!("voter lookup failed for {}: {:?}", req.voter_id, e);
                return Err(Rejection::VoterNotEligible);
            }
        }
        advance(state, CastState::VoterValidated);

        // gate 2: no prior vote in this election; a failed lookup refuses rather than guesses
        match self.store.existing_vote(&req.voter_id, &req.election_id).await {
            Ok(None) => {}
            Ok(Some(_)) => return Err(Rejection::AlreadyVoted),
            Err(e) => return Err(Rejection::StoreUnavailable(e.to_string())),
        }

        // gate 3: election exists and is active
        match self.store.election(&req.election_id).await {
            Ok(Some(e)) if e.is_active => {}
            Ok(_) => return Err(Rejection::ElectionNotActive),
            Err(e) => {
                warn!("election lookup failed for {}: {:?}", req.election_id, e);
                return Err(Rejection::ElectionNotActive);
            }
        }
        advance(state, CastState::ElectionValidated);

        // gate 4: candidate exists, belongs to the election, active
        match self.store.candidate(&req.candidate_id).await {
            Ok(Some(c)) if c.election_id == req.election_id && c.is_active => {}
            Ok(_) => return Err(Rejection::CandidateNotFound),
            Err(e) => {
                warn!("candidate lookup failed for {}: {:?}", req.candidate_id, e);
                return Err(Rejection::CandidateNotFound);
            }
        }
        advance(state, CastState::CandidateValidated);
        Ok(())
    }

    /// True iff no vote row exists for the pair. Store errors answer `false`.
    pub async fn can_vote(&self, voter_id: &str, election_id: &str) -> bool {
        match self.store.existing_vote(voter_id, election_id).await {
            Ok(existing) => existing.is_none(),
            Err(e) => {
                warn!("vote eligibility lookup failed: {:?}", e);
                false
            }
        }
    }
}

pub(crate) fn advance(state: &mut CastState, to: CastState) {
    debug!(
        from = state.name(),
        to = to.name(),
        terminal = to.is_terminal(),
        "cast state transition"
    );
    *state = to;
}
