//! Reversible, voter-keyed encryption of a vote payload for transport.
//!
//! The AES-256-GCM key is SHA-256 of `"{voter_id}:{election_id}:{timestamp}:{salt}"`. Election
//! id and timestamp travel in clear next to the ciphertext, so anyone holding the voter id
//! and the salt can decrypt: confidentiality rests entirely on the salt staying secret.
//! This object never enters the ledger.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::crypto::hash::{sha256_bytes, sha256_hex};
use crate::ledger::types::Vote;
use crate::utils::{LedgerError, Result};

pub const LEGACY_VOTE_KEY_SALT: &str = "vote_key_salt_2024";
pub const LEGACY_VOTER_PROOF_SALT: &str = "voter_proof_salt_2024";

const AES_IV_LENGTH: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedVote {
    /// `hex(iv):hex(ciphertext)`
    pub encrypted_data: String,
    pub voter_proof: String,
    pub timestamp: u64,
    pub election_id: String,
}

#[derive(Debug, Clone)]
pub struct VoteEncryption {
    key_salt: String,
    proof_salt: String,
}

impl Default for VoteEncryption {
    fn default() -> Self {
        Self::new(LEGACY_VOTE_KEY_SALT, LEGACY_VOTER_PROOF_SALT)
    }
}

impl VoteEncryption {
    pub fn new(key_salt: impl Into<String>, proof_salt: impl Into<String>) -> Self {
        Self {
            key_salt: key_salt.into(),
            proof_salt: proof_salt.into(),
        }
    }

    pub fn derive_key(&self, voter_id: &str, election_id: &str, timestamp: u64) -> [u8; 32] {
        sha256_bytes(format!("{}:{}:{}:{}", voter_id, election_id, timestamp, self.key_salt))
    }

    /// Anonymous but re-derivable proof that `voter_id` produced this object.
    pub fn voter_proof(&self, voter_id: &str, election_id: &str, timestamp: u64) -> String {
        sha256_hex(format!("{}:{}:{}:{}", voter_id, election_id, timestamp, self.proof_salt))
    }

    pub fn verify_voter_proof(
        &self,
        proof: &str,
        voter_id: &str,
        election_id: &str,
        timestamp: u64,
    ) -> bool {
        self.voter_proof(voter_id, election_id, timestamp) == proof
    }

    pub fn encrypt_vote(
        &self,
        voter_id: &str,
        candidate_id: &str,
        election_id: &str,
        timestamp: u64,
    ) -> Result<EncryptedVote> {
        self.encrypt_vote_with_rng(&mut OsRng, voter_id, candidate_id, election_id, timestamp)
    }

    pub fn encrypt_vote_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        voter_id: &str,
        candidate_id: &str,
        election_id: &str,
        timestamp: u64,
    ) -> Result<EncryptedVote> {
        let payload = Vote::new(voter_id, candidate_id, election_id, timestamp);
        let plaintext =
            serde_json::to_vec(&payload).map_err(|e| LedgerError::Crypto(e.to_string()))?;

        let key = self.derive_key(voter_id, election_id, timestamp);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

        let mut iv = [0u8; AES_IV_LENGTH];
        rng.fill_bytes(&mut iv);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_slice())
            .map_err(|_| LedgerError::Crypto("vote encryption failed".into()))?;

        Ok(EncryptedVote {
            encrypted_data: format!("{}:{}", hex::encode(iv), hex::encode(ciphertext)),
            voter_proof: self.voter_proof(voter_id, election_id, timestamp),
            timestamp,
            election_id: election_id.to_string(),
        })
    }

    /// Re-derive the key from `voter_id` and the object's clear fields. Any failure is `None`.
    pub fn decrypt_vote(&self, encrypted: &EncryptedVote, voter_id: &str) -> Option<Vote> {
        match self.try_decrypt(encrypted, voter_id) {
            Ok(vote) => Some(vote),
            Err(e) => {
                warn!("vote decryption failed: {}", e);
                None
            }
        }
    }

    fn try_decrypt(&self, encrypted: &EncryptedVote, voter_id: &str) -> Result<Vote> {
        let (iv_hex, data_hex) = encrypted
            .encrypted_data
            .split_once(':')
            .ok_or_else(|| LedgerError::Crypto("missing iv separator".into()))?;

        let iv = hex::decode(iv_hex).map_err(|e| LedgerError::Crypto(e.to_string()))?;
        if iv.len() != AES_IV_LENGTH {
            return Err(LedgerError::Crypto(format!("iv must be {} bytes", AES_IV_LENGTH)));
        }
        let ciphertext = hex::decode(data_hex).map_err(|e| LedgerError::Crypto(e.to_string()))?;

        let key = self.derive_key(voter_id, &encrypted.election_id, encrypted.timestamp);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&iv), ciphertext.as_slice())
            .map_err(|_| LedgerError::Crypto("authentication failed".into()))?;

        serde_json::from_slice(&plaintext).map_err(|e| LedgerError::Crypto(e.to_string()))
    }
}
