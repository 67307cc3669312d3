//! Caller-facing vote receipts.
//!
//! A receipt is a structural artifact: its block hash is derived from the voter commitment,
//! candidate id and issue time, and the two merkle siblings are derived from that block hash.
//! It is not a path into the ledger's tree, and verification checks shape and freshness only.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::hash::{is_hex_digest, sha256_hex};
use crate::utils::Clock;

pub const LEGACY_RECEIPT_SALT: &str = "zk_proof_salt_2024";
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteProof {
    pub voter_hash: String,
    pub block_hash: String,
    pub merkle_proof: Vec<String>,
    pub timestamp: u64,
}

#[derive(Clone)]
pub struct ReceiptIssuer {
    salt: String,
    freshness: Duration,
    clock: Arc<dyn Clock>,
}

impl ReceiptIssuer {
    pub fn new(salt: impl Into<String>, freshness: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { salt: salt.into(), freshness, clock }
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::new(LEGACY_RECEIPT_SALT, DEFAULT_FRESHNESS, clock)
    }

    pub fn issue(&self, voter_id: &str, candidate_id: &str, election_id: &str) -> VoteProof {
        let timestamp = self.clock.now_millis();
        let voter_hash = sha256_hex(format!("{}:{}:{}", voter_id, election_id, self.salt));
        let block_hash = sha256_hex(format!("{}:{}:{}", voter_hash, candidate_id, timestamp));
        let merkle_proof = vec![
            sha256_hex(format!("merkle_1:{}", block_hash)),
            sha256_hex(format!("merkle_2:{}", block_hash)),
        ];

        VoteProof { voter_hash, block_hash, merkle_proof, timestamp }
    }

    /// Shape and freshness check. `_election_id` is accepted for API symmetry and not consulted.
    pub fn verify(&self, proof: &VoteProof, _election_id: &str) -> bool {
        if proof.merkle_proof.is_empty() {
            debug!("receipt rejected: empty merkle proof");
            return false;
        }

        let now = self.clock.now_millis();
        let window = self.freshness.as_millis() as u64;
        if proof.timestamp > now || proof.timestamp < now.saturating_sub(window) {
            debug!(timestamp = proof.timestamp, now, "receipt rejected: outside freshness window");
            return false;
        }

        let shapes_ok = is_hex_digest(&proof.voter_hash)
            && is_hex_digest(&proof.block_hash)
            && proof.merkle_proof.iter().all(|h| is_hex_digest(h));
        if !shapes_ok {
            debug!("receipt rejected: malformed hash field");
        }
        shapes_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ManualClock;

    const NOW: u64 = 1_700_000_000_000;
    const DAY_MS: u64 = 24 * 60 * 60 * 1000;

    fn issuer() -> (Arc<ManualClock>, ReceiptIssuer) {
        let clock = Arc::new(ManualClock::new(NOW));
        let issuer = ReceiptIssuer::with_clock(clock.clone());
        (clock, issuer)
    }

    #[test]
    fn test_issue_layout() {
        let (_clock, issuer) = issuer();
        let p = issuer.issue("V1", "C1", "E1");
        assert_eq!(p.timestamp, NOW);
        assert_eq!(p.voter_hash, sha256_hex("V1:E1:zk_proof_salt_2024"));
        assert_eq!(p.block_hash, sha256_hex(format!("{}:C1:{}", p.voter_hash, NOW)));
        assert_eq!(p.merkle_proof.len(), 2);
        assert_eq!(p.merkle_proof[0], sha256_hex(format!("merkle_1:{}", p.block_hash)));
        assert!(issuer.verify(&p, "E1"));
    }

    #[test]
    fn test_freshness_window() {
        let (clock, issuer) = issuer();
        let p = issuer.issue("V1", "C1", "E1");

        clock.set(NOW + DAY_MS);
        assert!(issuer.verify(&p, "E1"));

        clock.set(NOW + DAY_MS + 1);
        assert!(!issuer.verify(&p, "E1"));

        clock.set(NOW - 1);
        assert!(!issuer.verify(&p, "E1"), "future-dated receipts are rejected");
    }

    #[test]
    fn test_rejects_malformed_hashes() {
        let (_clock, issuer) = issuer();
        let good = issuer.issue("V1", "C1", "E1");

        let mut p = good.clone();
        p.voter_hash = p.voter_hash.to_uppercase();
        assert!(!issuer.verify(&p, "E1"));

        let mut p = good.clone();
        p.block_hash.truncate(63);
        assert!(!issuer.verify(&p, "E1"));

        let mut p = good.clone();
        p.merkle_proof[1] = "zz".into();
        assert!(!issuer.verify(&p, "E1"));

        let mut p = good;
        p.merkle_proof.clear();
        assert!(!issuer.verify(&p, "E1"));
    }

    #[test]
    fn test_election_id_not_consulted() {
        let (_clock, issuer) = issuer();
        let p = issuer.issue("V1", "C1", "E1");
        assert!(issuer.verify(&p, "some-other-election"));
    }
}
