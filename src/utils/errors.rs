use thiserror::Error;

/// Unified error type for the vote ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Mining cancelled before a valid nonce was found")]
    MiningCancelled,

    #[error("Mining timed out after {0} ms")]
    MiningTimedOut(u64),

    #[error("Mining worker unavailable: {0}")]
    WorkerUnavailable(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, LedgerError>;
