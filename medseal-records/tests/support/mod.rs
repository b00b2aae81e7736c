//! Shared fixtures for medseal-records integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use medseal_crypto::KeyPair;
use medseal_records::{
    BlobHandle, BlobStats, BlobStore, MemoryBlobStore, MemoryLedger, MetadataLedger, NewRecord,
    RecordMetadata, RecordVault, RecordsConfig, RecordsError, RecordsResult,
};
use std::sync::{Arc, LazyLock};
use tracing_subscriber::EnvFilter;

/// Key pair of the clinic that records are sealed for.
pub static CLINIC: LazyLock<KeyPair> =
    LazyLock::new(|| KeyPair::generate().expect("clinic key generation"));

/// Key pair of an unrelated party.
pub static OUTSIDER: LazyLock<KeyPair> =
    LazyLock::new(|| KeyPair::generate().expect("outsider key generation"));

/// Routes vault logs to the test writer; set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn new_record(patient_id: &str) -> NewRecord {
    NewRecord {
        patient_id: patient_id.to_string(),
        record_type: "lab-result".to_string(),
        created_by: "dr-okafor".to_string(),
    }
}

/// In-memory vault plus handles on its stores for inspection.
pub struct Harness {
    pub vault: RecordVault,
    pub blobs: MemoryBlobStore,
    pub ledger: MemoryLedger,
}

pub fn harness(config: RecordsConfig) -> Harness {
    init_tracing();
    let blobs = MemoryBlobStore::new();
    let ledger = MemoryLedger::new();
    let vault = RecordVault::new(Arc::new(blobs.clone()), Arc::new(ledger.clone()), config)
        .expect("valid config");
    Harness {
        vault,
        blobs,
        ledger,
    }
}

/// Ledger that refuses every insert.
#[derive(Default)]
pub struct RejectingLedger {
    inner: MemoryLedger,
}

#[async_trait]
impl MetadataLedger for RejectingLedger {
    async fn insert(&self, record: RecordMetadata) -> RecordsResult<()> {
        Err(RecordsError::Storage(format!(
            "ledger is read-only, cannot insert {}",
            record.record_id
        )))
    }

    async fn get(&self, record_id: &str) -> RecordsResult<RecordMetadata> {
        self.inner.get(record_id).await
    }

    async fn list_for_patient(&self, patient_id: &str) -> RecordsResult<Vec<RecordMetadata>> {
        self.inner.list_for_patient(patient_id).await
    }

    async fn remove(&self, record_id: &str) -> RecordsResult<RecordMetadata> {
        self.inner.remove(record_id).await
    }
}

/// Memory blob store whose pin or delete can be made to fail.
#[derive(Clone, Default)]
pub struct FaultyBlobStore {
    pub inner: MemoryBlobStore,
    pub fail_pin: bool,
    pub fail_delete: bool,
}

#[async_trait]
impl BlobStore for FaultyBlobStore {
    async fn put(&self, bytes: &[u8]) -> RecordsResult<BlobHandle> {
        self.inner.put(bytes).await
    }

    async fn get(&self, handle: &BlobHandle) -> RecordsResult<Vec<u8>> {
        self.inner.get(handle).await
    }

    async fn delete(&self, handle: &BlobHandle) -> RecordsResult<()> {
        if self.fail_delete {
            return Err(RecordsError::Storage(format!("delete of {handle} refused")));
        }
        self.inner.delete(handle).await
    }

    async fn contains(&self, handle: &BlobHandle) -> RecordsResult<bool> {
        self.inner.contains(handle).await
    }

    async fn pin(&self, handle: &BlobHandle) -> RecordsResult<()> {
        if self.fail_pin {
            return Err(RecordsError::Storage(format!("pin of {handle} refused")));
        }
        self.inner.pin(handle).await
    }

    async fn unpin(&self, handle: &BlobHandle) -> RecordsResult<()> {
        self.inner.unpin(handle).await
    }

    async fn is_pinned(&self, handle: &BlobHandle) -> RecordsResult<bool> {
        self.inner.is_pinned(handle).await
    }

    async fn stats(&self) -> RecordsResult<BlobStats> {
        self.inner.stats().await
    }

    async fn garbage_collect(&self) -> RecordsResult<usize> {
        self.inner.garbage_collect().await
    }
}
