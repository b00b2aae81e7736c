//! Record vault: seals uploads before they reach the blob store and opens
//! them again for authorized readers.
//!
//! The ciphertext goes to a [`BlobStore`]; everything needed to open it
//! except the private key (wrapped key, nonce, tag, digest) goes to the
//! [`MetadataLedger`] under a generated record id.

use crate::blob_store::{BlobHandle, BlobStore, FsBlobStore, MemoryBlobStore};
use crate::config::RecordsConfig;
use crate::error::{RecordsError, RecordsResult};
use crate::ledger::{MemoryLedger, MetadataLedger, RecordMetadata};
use chrono::{DateTime, Utc};
use medseal_crypto::{
    decrypt_from_storage, encrypt_for_storage, ContentDigest, EncodedBundle, EncryptedBundle,
    PrivateKey, PublicKey,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Caller-supplied description of a record being stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub patient_id: String,
    pub record_type: String,
    pub created_by: String,
}

/// What the caller gets back after a successful store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordReceipt {
    pub record_id: String,
    pub blob_handle: BlobHandle,
    pub digest: ContentDigest,
    pub created_at: DateTime<Utc>,
}

/// Stores and retrieves encrypted records.
pub struct RecordVault {
    blobs: Arc<dyn BlobStore>,
    ledger: Arc<dyn MetadataLedger>,
    config: RecordsConfig,
}

impl RecordVault {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        ledger: Arc<dyn MetadataLedger>,
        config: RecordsConfig,
    ) -> RecordsResult<Self> {
        config.validate()?;
        Ok(Self {
            blobs,
            ledger,
            config,
        })
    }

    /// Builds a vault with the stores `config` describes: a filesystem blob
    /// store when `blob_root` is set, memory otherwise. The ledger is
    /// always in memory.
    pub async fn from_config(config: RecordsConfig) -> RecordsResult<Self> {
        config.validate()?;
        let blobs: Arc<dyn BlobStore> = match &config.blob_root {
            Some(root) => Arc::new(FsBlobStore::open(root.clone()).await?),
            None => Arc::new(MemoryBlobStore::new()),
        };
        Self::new(blobs, Arc::new(MemoryLedger::new()), config)
    }

    pub fn config(&self) -> &RecordsConfig {
        &self.config
    }

    /// Encrypts `plaintext` for `recipient`, stores the ciphertext and
    /// records the envelope metadata.
    ///
    /// If pinning or the ledger insert fails the stored blob is removed again.
    pub async fn store_record(
        &self,
        record: &NewRecord,
        plaintext: &[u8],
        recipient: &PublicKey,
    ) -> RecordsResult<RecordReceipt> {
        let size = plaintext.len() as u64;
        if size > self.config.max_payload_bytes {
            return Err(RecordsError::PayloadTooLarge {
                size,
                max: self.config.max_payload_bytes,
            });
        }

        let bundle = encrypt_for_storage(plaintext, recipient)?;
        let digest = *bundle.digest();
        let encoded = EncodedBundle::from(bundle);

        let blob_handle = self.blobs.put(&encoded.ciphertext).await?;

        let record_id = format!("{}-{}", self.config.record_id_prefix, Uuid::new_v4());
        let created_at = Utc::now();
        let metadata = RecordMetadata {
            record_id: record_id.clone(),
            patient_id: record.patient_id.clone(),
            blob_handle: blob_handle.clone(),
            wrapped_key: encoded.wrapped_key,
            nonce: encoded.nonce,
            authentication_tag: encoded.authentication_tag,
            digest: encoded.digest,
            record_type: record.record_type.clone(),
            created_by: record.created_by.clone(),
            created_at,
        };

        if let Err(e) = self.pin_and_record(&blob_handle, metadata).await {
            warn!("could not record {record_id}, removing blob {blob_handle}: {e}");
            if let Err(cleanup) = self.blobs.delete(&blob_handle).await {
                warn!("failed to remove orphaned blob {blob_handle}: {cleanup}");
            }
            return Err(e);
        }

        info!(
            record_id = %record_id,
            patient_id = %record.patient_id,
            size,
            "stored encrypted record"
        );
        Ok(RecordReceipt {
            record_id,
            blob_handle,
            digest,
            created_at,
        })
    }

    /// Fetches and decrypts a record.
    ///
    /// With `verify_digest_on_fetch` set, the plaintext must also match the
    /// digest recorded at upload.
    pub async fn fetch_record(
        &self,
        record_id: &str,
        recipient: &PrivateKey,
    ) -> RecordsResult<Vec<u8>> {
        let (_, bundle) = self.load_bundle(record_id).await?;

        let plaintext = decrypt_from_storage(&bundle, recipient).inspect_err(|e| {
            warn!("record {record_id} could not be opened: {e}");
        })?;

        if self.config.verify_digest_on_fetch {
            bundle.verify_plaintext(&plaintext).inspect_err(|_| {
                warn!("record {record_id} does not match its upload digest");
            })?;
        }

        debug!("fetched record {record_id} ({} bytes)", plaintext.len());
        Ok(plaintext)
    }

    /// Returns a record's metadata and still-sealed bundle without opening it.
    pub async fn fetch_encrypted(
        &self,
        record_id: &str,
    ) -> RecordsResult<(RecordMetadata, EncryptedBundle)> {
        self.load_bundle(record_id).await
    }

    /// Metadata for every record of `patient_id`, newest first.
    pub async fn list_records(&self, patient_id: &str) -> RecordsResult<Vec<RecordMetadata>> {
        self.ledger.list_for_patient(patient_id).await
    }

    /// Removes a record's blob and then its ledger entry.
    ///
    /// If the blob cannot be deleted the ledger entry is left in place, so
    /// the record stays fetchable and the removal can be retried.
    pub async fn remove_record(&self, record_id: &str) -> RecordsResult<RecordMetadata> {
        let handle = self.ledger.get(record_id).await?.blob_handle;

        match self.blobs.delete(&handle).await {
            // A blob already gone is not an error; the ledger entry still has to go.
            Ok(()) | Err(RecordsError::BlobNotFound(_)) => {}
            Err(e) => {
                warn!("could not delete blob {handle} of record {record_id}: {e}");
                return Err(e);
            }
        }
        self.blobs.unpin(&handle).await?;

        let metadata = self.ledger.remove(record_id).await?;
        info!("removed record {record_id}");
        Ok(metadata)
    }

    /// Drops every unpinned blob from the store. Returns how many went.
    ///
    /// Records stored with `pin_on_store` off lose their ciphertext here.
    pub async fn collect_garbage(&self) -> RecordsResult<usize> {
        let removed = self.blobs.garbage_collect().await?;
        info!("garbage collection removed {removed} blobs");
        Ok(removed)
    }

    async fn pin_and_record(
        &self,
        blob_handle: &BlobHandle,
        metadata: RecordMetadata,
    ) -> RecordsResult<()> {
        if self.config.pin_on_store {
            self.blobs.pin(blob_handle).await?;
        }
        self.ledger.insert(metadata).await
    }

    async fn load_bundle(
        &self,
        record_id: &str,
    ) -> RecordsResult<(RecordMetadata, EncryptedBundle)> {
        let metadata = self.ledger.get(record_id).await?;
        let ciphertext = self.blobs.get(&metadata.blob_handle).await?;
        let bundle = metadata.to_bundle(ciphertext)?;
        Ok((metadata, bundle))
    }
}
