//! Record storage workflow for medseal.
//!
//! Wires the envelope core into an upload/download flow:
//! - [`BlobStore`]: content-addressed storage for ciphertext (memory or filesystem)
//! - [`MetadataLedger`]: wrapped key, nonce, tag and digest per record id
//! - [`RecordVault`]: seals on store, opens (and optionally digest-checks) on fetch
//!
//! Neither store ever sees plaintext or an unwrapped key.

pub mod blob_store;
pub mod config;
pub mod error;
pub mod ledger;
pub mod vault;

pub use blob_store::{BlobHandle, BlobStats, BlobStore, FsBlobStore, MemoryBlobStore};
pub use config::{RecordsConfig, DEFAULT_MAX_PAYLOAD_BYTES};
pub use error::{RecordsError, RecordsResult};
pub use ledger::{MemoryLedger, MetadataLedger, RecordMetadata};
pub use vault::{NewRecord, RecordReceipt, RecordVault};
