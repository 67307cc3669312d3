//! Crypto module: hashing, commitments, merkle aggregation, transport encryption, receipts.
//!
//! - Commitment: irreversible voter / candidate hashes stored on the chain
//! - Merkle: batch root over vote leaves
//! - Transport: voter-keyed AES-256-GCM for votes in flight (never chain-resident)
//! - Receipt: shape-and-freshness vote proofs handed back to voters

pub mod hash;
pub mod commitment;
pub mod merkle;
pub mod transport;
pub mod receipt;

pub use hash::{is_hex_digest, sha256_hex};
pub use commitment::Commitments;
pub use merkle::merkle_root;
pub use transport::{EncryptedVote, VoteEncryption};
pub use receipt::{ReceiptIssuer, VoteProof};
