//! Metadata ledger for stored records.
//!
//! Holds the non-secret envelope fields (wrapped key, nonce, tag, digest)
//! together with the blob handle, keyed by record id. Entries are
//! write-once: inserting an existing id is an error.

use crate::blob_store::BlobHandle;
use crate::error::{RecordsError, RecordsResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use medseal_crypto::{EncodedBundle, EncryptedBundle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Ledger entry for one encrypted record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub record_id: String,
    pub patient_id: String,
    pub blob_handle: BlobHandle,
    /// Base64 RSA-OAEP wrapped key.
    pub wrapped_key: String,
    /// Base64 GCM nonce.
    pub nonce: String,
    /// Base64 GCM tag.
    pub authentication_tag: String,
    /// Hex SHA-256 of the plaintext.
    pub digest: String,
    pub record_type: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl RecordMetadata {
    /// Reassembles the envelope from this entry and the fetched ciphertext.
    pub fn to_bundle(&self, ciphertext: Vec<u8>) -> RecordsResult<EncryptedBundle> {
        let encoded = EncodedBundle {
            ciphertext,
            wrapped_key: self.wrapped_key.clone(),
            nonce: self.nonce.clone(),
            authentication_tag: self.authentication_tag.clone(),
            digest: self.digest.clone(),
        };
        Ok(EncryptedBundle::try_from(&encoded)?)
    }
}

/// Persistent store for record metadata.
#[async_trait]
pub trait MetadataLedger: Send + Sync {
    /// Records a new entry. Fails with `AlreadyExists` if the id is taken.
    async fn insert(&self, record: RecordMetadata) -> RecordsResult<()>;

    async fn get(&self, record_id: &str) -> RecordsResult<RecordMetadata>;

    /// All entries for a patient, newest first.
    async fn list_for_patient(&self, patient_id: &str) -> RecordsResult<Vec<RecordMetadata>>;

    /// Removes an entry, returning it.
    async fn remove(&self, record_id: &str) -> RecordsResult<RecordMetadata>;
}

/// Thread-safe in-memory ledger.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    records: Arc<RwLock<HashMap<String, RecordMetadata>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if the ledger holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl MetadataLedger for MemoryLedger {
    async fn insert(&self, record: RecordMetadata) -> RecordsResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.record_id) {
            return Err(RecordsError::AlreadyExists(record.record_id));
        }
        records.insert(record.record_id.clone(), record);
        Ok(())
    }

    async fn get(&self, record_id: &str) -> RecordsResult<RecordMetadata> {
        self.records
            .read()
            .await
            .get(record_id)
            .cloned()
            .ok_or_else(|| RecordsError::NotFound(record_id.to_string()))
    }

    async fn list_for_patient(&self, patient_id: &str) -> RecordsResult<Vec<RecordMetadata>> {
        let mut list: Vec<RecordMetadata> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        Ok(list)
    }

    async fn remove(&self, record_id: &str) -> RecordsResult<RecordMetadata> {
        self.records
            .write()
            .await
            .remove(record_id)
            .ok_or_else(|| RecordsError::NotFound(record_id.to_string()))
    }
}
