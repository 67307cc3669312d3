//! One-way commitments that stand in for voter identity and candidate choice on the chain.
//!
//! Neither value can be recovered from a block: the voter hash only allows duplicate
//! detection for a known (voter, election) pair, and the candidate hash hides the choice
//! for good. Reversible transport encryption lives in `crypto::transport`.

use crate::crypto::hash::sha256_hex;

pub const LEGACY_VOTER_SALT: &str = "voter_salt_2024";
pub const LEGACY_CANDIDATE_SALT: &str = "candidate_salt_2024";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commitments {
    voter_salt: String,
    candidate_salt: String,
}

impl Default for Commitments {
    fn default() -> Self {
        Self::new(LEGACY_VOTER_SALT, LEGACY_CANDIDATE_SALT)
    }
}

impl Commitments {
    pub fn new(voter_salt: impl Into<String>, candidate_salt: impl Into<String>) -> Self {
        Self {
            voter_salt: voter_salt.into(),
            candidate_salt: candidate_salt.into(),
        }
    }

    /// SHA-256 over `voter_id ++ election_id ++ salt`. Deterministic per (voter, election).
    pub fn anonymize_voter(&self, voter_id: &str, election_id: &str) -> String {
        sha256_hex(format!("{}{}{}", voter_id, election_id, self.voter_salt))
    }

    /// SHA-256 over `candidate_id ++ voter_id ++ salt`. Irreversible by construction.
    pub fn commit_candidate(&self, candidate_id: &str, voter_id: &str) -> String {
        sha256_hex(format!("{}{}{}", candidate_id, voter_id, self.candidate_salt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::is_hex_digest;

    #[test]
    fn test_anonymize_is_deterministic() {
        let c = Commitments::default();
        let a = c.anonymize_voter("V1", "E1");
        assert_eq!(a, c.anonymize_voter("V1", "E1"));
        assert!(is_hex_digest(&a));
        assert_eq!(a, sha256_hex("V1E1voter_salt_2024"));
    }

    #[test]
    fn test_anonymize_changes_with_either_input() {
        let c = Commitments::default();
        let base = c.anonymize_voter("V1", "E1");
        assert_ne!(base, c.anonymize_voter("V2", "E1"));
        assert_ne!(base, c.anonymize_voter("V1", "E2"));
    }

    #[test]
    fn test_candidate_commitment_binds_voter_and_salt() {
        let c = Commitments::default();
        let h = c.commit_candidate("C1", "V1");
        assert_eq!(h, sha256_hex("C1V1candidate_salt_2024"));
        assert_ne!(h, c.commit_candidate("C1", "V2"));

        let other = Commitments::new("s1", "s2");
        assert_ne!(h, other.commit_candidate("C1", "V1"));
    }
}
