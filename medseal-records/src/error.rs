//! Record storage error types.

use medseal_crypto::CryptoError;
use thiserror::Error;

/// Result type for record operations.
pub type RecordsResult<T> = Result<T, RecordsError>;

/// Errors that can occur while storing or fetching records.
#[derive(Debug, Error)]
pub enum RecordsError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("blob not found: {0}")]
    BlobNotFound(String),

    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecordsError {
    /// The underlying crypto failure, if this error came from the core.
    pub fn crypto_kind(&self) -> Option<&CryptoError> {
        match self {
            RecordsError::Crypto(e) => Some(e),
            _ => None,
        }
    }
}
