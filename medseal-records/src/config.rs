//! Record storage configuration.
//!
//! Passed explicitly into [`RecordVault`](crate::RecordVault) at construction;
//! nothing here is global.

use crate::error::{RecordsError, RecordsResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default upload limit (10 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Configuration for the record vault and the stores it builds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Directory for the filesystem blob store. `None` keeps blobs in memory.
    pub blob_root: Option<PathBuf>,

    /// Pin blobs as they are stored so they survive garbage collection.
    pub pin_on_store: bool,

    /// Compare the recovered plaintext against the ledger digest on fetch.
    pub verify_digest_on_fetch: bool,

    /// Largest plaintext accepted by `store_record`.
    pub max_payload_bytes: u64,

    /// Prefix for generated record ids (`<prefix>-<uuid>`).
    pub record_id_prefix: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            blob_root: None,
            pin_on_store: true,
            verify_digest_on_fetch: true,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            record_id_prefix: "EHR".to_string(),
        }
    }
}

impl RecordsConfig {
    /// In-memory configuration rooted at nothing; handy for tests and tools.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Filesystem-backed configuration storing blobs under `root`.
    pub fn with_blob_root(root: impl Into<PathBuf>) -> Self {
        Self {
            blob_root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Parses a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> RecordsResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RecordsResult<()> {
        if self.max_payload_bytes == 0 {
            return Err(RecordsError::Config(
                "max_payload_bytes must be greater than zero".to_string(),
            ));
        }
        if self.record_id_prefix.trim().is_empty() {
            return Err(RecordsError::Config(
                "record_id_prefix must not be empty".to_string(),
            ));
        }
        if let Some(root) = &self.blob_root {
            if root.as_os_str().is_empty() {
                return Err(RecordsError::Config("blob_root must not be empty".to_string()));
            }
        }
        Ok(())
    }
}
