//! Error types for the envelope encryption core.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur while sealing or opening a payload.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The OS random source could not be read. Fatal, never retried.
    #[error("secure random source unavailable")]
    RandomSourceUnavailable,

    /// Key-wrapping input exceeds what the recipient's modulus can carry.
    #[error("payload too large to wrap: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    /// The AEAD tag did not verify (tampered ciphertext, wrong key or nonce).
    #[error("authentication failed: ciphertext, key or nonce does not match tag")]
    AuthenticationFailure,

    /// The wrapped key could not be recovered. Deliberately carries no detail.
    #[error("key recovery failed")]
    KeyRecoveryError,

    /// Recomputed content digest disagrees with the recorded one.
    #[error("integrity mismatch: expected digest {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CryptoError {
    /// True for failures that signal tampering or a key mismatch.
    ///
    /// These must never be retried automatically.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            CryptoError::AuthenticationFailure
                | CryptoError::KeyRecoveryError
                | CryptoError::IntegrityMismatch { .. }
        )
    }
}
