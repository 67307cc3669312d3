//! TOML node configuration.
//!
//! Every key has a default, so an empty file (or no file) yields a working service whose
//! hashes match the legacy deployments.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consensus::pow::{ProofOfWork, DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use crate::crypto::commitment::{Commitments, LEGACY_CANDIDATE_SALT, LEGACY_VOTER_SALT};
use crate::crypto::receipt::{ReceiptIssuer, DEFAULT_FRESHNESS, LEGACY_RECEIPT_SALT};
use crate::crypto::transport::{VoteEncryption, LEGACY_VOTER_PROOF_SALT, LEGACY_VOTE_KEY_SALT};
use crate::ledger::VoteLookupScope;
use crate::utils::{Clock, LedgerError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "voteledger.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub log_level: String,
    pub ledger: LedgerConfig,
    pub salts: SaltConfig,
    pub receipt: ReceiptConfig,
    pub rpc: RpcConfig,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub difficulty: u32,
    pub max_difficulty: u32,
    pub mining_workers: usize,
    /// 0 disables the timeout.
    pub mining_timeout_ms: u64,
    pub vote_lookup: VoteLookupScope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaltConfig {
    pub voter: String,
    pub candidate: String,
    pub vote_key: String,
    pub voter_proof: String,
    pub receipt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    pub freshness_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub path: Option<PathBuf>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            ledger: LedgerConfig::default(),
            salts: SaltConfig::default(),
            receipt: ReceiptConfig::default(),
            rpc: RpcConfig::default(),
            registry: RegistryConfig::default(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_difficulty: 8,
            mining_workers: 2,
            mining_timeout_ms: 0,
            vote_lookup: VoteLookupScope::Unscoped,
        }
    }
}

impl Default for SaltConfig {
    fn default() -> Self {
        Self {
            voter: LEGACY_VOTER_SALT.into(),
            candidate: LEGACY_CANDIDATE_SALT.into(),
            vote_key: LEGACY_VOTE_KEY_SALT.into(),
            voter_proof: LEGACY_VOTER_PROOF_SALT.into(),
            receipt: LEGACY_RECEIPT_SALT.into(),
        }
    }
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self { freshness_secs: DEFAULT_FRESHNESS.as_secs() }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:8080".into() }
    }
}

impl NodeConfig {
    /// Load and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_toml_str(&data)
    }

    pub fn from_toml_str(data: &str) -> Result<Self> {
        let cfg: NodeConfig =
            toml::from_str(data).map_err(|e| LedgerError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LedgerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let l = &self.ledger;
        if l.difficulty == 0 {
            return Err(LedgerError::Config("ledger.difficulty must be at least 1".into()));
        }
        if l.max_difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::Config(format!(
                "ledger.max_difficulty {} exceeds {}",
                l.max_difficulty, MAX_DIFFICULTY
            )));
        }
        if l.difficulty > l.max_difficulty {
            return Err(LedgerError::Config(format!(
                "ledger.difficulty {} exceeds ledger.max_difficulty {}",
                l.difficulty, l.max_difficulty
            )));
        }
        if l.mining_workers == 0 {
            return Err(LedgerError::Config("ledger.mining_workers must be at least 1".into()));
        }
        if self.receipt.freshness_secs == 0 {
            return Err(LedgerError::Config("receipt.freshness_secs must be positive".into()));
        }

        let s = &self.salts;
        for (name, value) in [
            ("voter", &s.voter),
            ("candidate", &s.candidate),
            ("vote_key", &s.vote_key),
            ("voter_proof", &s.voter_proof),
            ("receipt", &s.receipt),
        ] {
            if value.is_empty() {
                return Err(LedgerError::Config(format!("salts.{} must not be empty", name)));
            }
        }

        self.rpc_addr()?;
        Ok(())
    }

    pub fn rpc_addr(&self) -> Result<SocketAddr> {
        self.rpc
            .bind
            .parse()
            .map_err(|e| LedgerError::Config(format!("rpc.bind {:?}: {}", self.rpc.bind, e)))
    }

    pub fn mining_timeout(&self) -> Option<Duration> {
        match self.ledger.mining_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn proof_of_work(&self) -> Result<ProofOfWork> {
        ProofOfWork::new(self.ledger.difficulty)
    }

    pub fn commitments(&self) -> Commitments {
        Commitments::new(&self.salts.voter, &self.salts.candidate)
    }

    pub fn encryption(&self) -> VoteEncryption {
        VoteEncryption::new(&self.salts.vote_key, &self.salts.voter_proof)
    }

    pub fn receipt_issuer(&self, clock: Arc<dyn Clock>) -> ReceiptIssuer {
        ReceiptIssuer::new(
            &self.salts.receipt,
            Duration::from_secs(self.receipt.freshness_secs),
            clock,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg = NodeConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, NodeConfig::default());
        assert_eq!(cfg.ledger.difficulty, 4);
        assert_eq!(cfg.ledger.vote_lookup, VoteLookupScope::Unscoped);
        assert!(cfg.mining_timeout().is_none());
        assert_eq!(cfg.rpc_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_partial_sections() {
        let cfg = NodeConfig::from_toml_str(
            r#"
            log_level = "debug"

            [ledger]
            difficulty = 2
            mining_timeout_ms = 1500
            vote_lookup = "scoped"

            [salts]
            voter = "pepper"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.ledger.difficulty, 2);
        assert_eq!(cfg.ledger.mining_workers, 2);
        assert_eq!(cfg.mining_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(cfg.ledger.vote_lookup, VoteLookupScope::Scoped);
        assert_eq!(cfg.salts.voter, "pepper");
        assert_eq!(cfg.salts.candidate, LEGACY_CANDIDATE_SALT);
    }

    #[test]
    fn test_default_salts_reproduce_legacy_commitments() {
        let cfg = NodeConfig::default();
        let legacy = Commitments::default();
        assert_eq!(
            cfg.commitments().anonymize_voter("V1", "E1"),
            legacy.anonymize_voter("V1", "E1")
        );
    }

    #[test]
    fn test_validation_failures() {
        let bad = [
            "[ledger]\ndifficulty = 0",
            "[ledger]\ndifficulty = 9",
            "[ledger]\nmax_difficulty = 65",
            "[ledger]\nmining_workers = 0",
            "[receipt]\nfreshness_secs = 0",
            "[salts]\nreceipt = \"\"",
            "[rpc]\nbind = \"not an address\"",
            "[ledger]\nvote_lookup = \"global\"",
        ];
        for doc in bad {
            assert!(
                matches!(NodeConfig::from_toml_str(doc), Err(LedgerError::Config(_))),
                "{} should be rejected",
                doc
            );
        }
    }

    #[test]
    fn test_written_config_loads_back() {
        let mut cfg = NodeConfig::default();
        cfg.ledger.difficulty = 3;
        cfg.registry.path = Some(PathBuf::from("registry.toml"));
        let text = cfg.to_toml().unwrap();
        assert_eq!(NodeConfig::from_toml_str(&text).unwrap(), cfg);
    }
}
