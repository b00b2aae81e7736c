//! Opaque blob storage for ciphertext.
//!
//! Blobs are content-addressed: the handle is the lowercase hex SHA-256 of
//! the stored bytes, so storing the same bytes twice yields the same handle
//! and a handle can never name different content.

use crate::error::{RecordsError, RecordsResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Retrieval handle for a stored blob.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobHandle(String);

impl BlobHandle {
    /// Computes the handle `bytes` will be stored under.
    pub fn for_content(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Validates an externally supplied handle.
    pub fn parse(s: &str) -> RecordsResult<Self> {
        if s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            Ok(Self(s.to_string()))
        } else {
            Err(RecordsError::Storage(format!("invalid blob handle: {s:?}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BlobHandle {
    type Error = RecordsError;

    fn try_from(s: String) -> RecordsResult<Self> {
        Self::parse(&s)
    }
}

impl From<BlobHandle> for String {
    fn from(handle: BlobHandle) -> Self {
        handle.0
    }
}

/// Repository statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BlobStats {
    pub blob_count: usize,
    pub total_bytes: u64,
    pub pinned_count: usize,
}

/// Storage for opaque ciphertext blobs.
///
/// Implementations must return exactly the bytes that were stored.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes`, returning their content handle. Idempotent.
    async fn put(&self, bytes: &[u8]) -> RecordsResult<BlobHandle>;

    /// Returns the bytes stored under `handle`.
    async fn get(&self, handle: &BlobHandle) -> RecordsResult<Vec<u8>>;

    /// Removes a blob and its pin.
    async fn delete(&self, handle: &BlobHandle) -> RecordsResult<()>;

    async fn contains(&self, handle: &BlobHandle) -> RecordsResult<bool>;

    /// Marks a blob as retained.
    async fn pin(&self, handle: &BlobHandle) -> RecordsResult<()>;

    async fn unpin(&self, handle: &BlobHandle) -> RecordsResult<()>;

    async fn is_pinned(&self, handle: &BlobHandle) -> RecordsResult<bool>;

    async fn stats(&self) -> RecordsResult<BlobStats>;

    /// Removes every blob that is not pinned, returning how many were removed.
    async fn garbage_collect(&self) -> RecordsResult<usize>;
}

// ── In-memory ───────────────────────────────────────────────────

#[derive(Default)]
struct MemoryState {
    blobs: HashMap<BlobHandle, Vec<u8>>,
    pinned: HashSet<BlobHandle>,
}

/// Thread-safe in-memory blob store.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: &[u8]) -> RecordsResult<BlobHandle> {
        let handle = BlobHandle::for_content(bytes);
        self.state
            .write()
            .await
            .blobs
            .entry(handle.clone())
            .or_insert_with(|| bytes.to_vec());
        debug!("stored blob {handle} ({} bytes)", bytes.len());
        Ok(handle)
    }

    async fn get(&self, handle: &BlobHandle) -> RecordsResult<Vec<u8>> {
        self.state
            .read()
            .await
            .blobs
            .get(handle)
            .cloned()
            .ok_or_else(|| RecordsError::BlobNotFound(handle.to_string()))
    }

    async fn delete(&self, handle: &BlobHandle) -> RecordsResult<()> {
        let mut state = self.state.write().await;
        state.pinned.remove(handle);
        state
            .blobs
            .remove(handle)
            .map(|_| ())
            .ok_or_else(|| RecordsError::BlobNotFound(handle.to_string()))
    }

    async fn contains(&self, handle: &BlobHandle) -> RecordsResult<bool> {
        Ok(self.state.read().await.blobs.contains_key(handle))
    }

    async fn pin(&self, handle: &BlobHandle) -> RecordsResult<()> {
        let mut state = self.state.write().await;
        if !state.blobs.contains_key(handle) {
            return Err(RecordsError::BlobNotFound(handle.to_string()));
        }
        state.pinned.insert(handle.clone());
        Ok(())
    }

    async fn unpin(&self, handle: &BlobHandle) -> RecordsResult<()> {
        self.state.write().await.pinned.remove(handle);
        Ok(())
    }

    async fn is_pinned(&self, handle: &BlobHandle) -> RecordsResult<bool> {
        Ok(self.state.read().await.pinned.contains(handle))
    }

    async fn stats(&self) -> RecordsResult<BlobStats> {
        let state = self.state.read().await;
        Ok(BlobStats {
            blob_count: state.blobs.len(),
            total_bytes: state.blobs.values().map(|b| b.len() as u64).sum(),
            pinned_count: state.pinned.len(),
        })
    }

    async fn garbage_collect(&self) -> RecordsResult<usize> {
        let mut state = self.state.write().await;
        let MemoryState { blobs, pinned } = &mut *state;
        let before = blobs.len();
        blobs.retain(|handle, _| pinned.contains(handle));
        let removed = before - blobs.len();
        debug!("collected {removed} unpinned blobs");
        Ok(removed)
    }
}

// ── Filesystem ──────────────────────────────────────────────────

/// Blob store keeping one file per handle under a root directory.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// reader never observes a partially written blob. Pins live in memory.
pub struct FsBlobStore {
    root: PathBuf,
    pinned: RwLock<HashSet<BlobHandle>>,
    /// Held shared by writers and pinners, exclusively by garbage collection.
    gc_lock: RwLock<()>,
}

impl FsBlobStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> RecordsResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        debug!("opened blob store at {}", root.display());
        Ok(Self {
            root,
            pinned: RwLock::new(HashSet::new()),
            gc_lock: RwLock::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, handle: &BlobHandle) -> PathBuf {
        self.root.join(handle.as_str())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, bytes: &[u8]) -> RecordsResult<BlobHandle> {
        let handle = BlobHandle::for_content(bytes);
        let path = self.path_for(&handle);
        let _gc = self.gc_lock.read().await;
        if tokio::fs::try_exists(&path).await? {
            return Ok(handle);
        }

        let tmp = self
            .root
            .join(format!(".{}.{}.tmp", handle.as_str(), uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!("stored blob {handle} ({} bytes) on disk", bytes.len());
        Ok(handle)
    }

    async fn get(&self, handle: &BlobHandle) -> RecordsResult<Vec<u8>> {
        tokio::fs::read(self.path_for(handle))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => RecordsError::BlobNotFound(handle.to_string()),
                _ => e.into(),
            })
    }

    async fn delete(&self, handle: &BlobHandle) -> RecordsResult<()> {
        self.pinned.write().await.remove(handle);
        tokio::fs::remove_file(self.path_for(handle))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => RecordsError::BlobNotFound(handle.to_string()),
                _ => e.into(),
            })
    }

    async fn contains(&self, handle: &BlobHandle) -> RecordsResult<bool> {
        Ok(tokio::fs::try_exists(self.path_for(handle)).await?)
    }

    async fn pin(&self, handle: &BlobHandle) -> RecordsResult<()> {
        let _gc = self.gc_lock.read().await;
        if !self.contains(handle).await? {
            return Err(RecordsError::BlobNotFound(handle.to_string()));
        }
        self.pinned.write().await.insert(handle.clone());
        Ok(())
    }

    async fn unpin(&self, handle: &BlobHandle) -> RecordsResult<()> {
        self.pinned.write().await.remove(handle);
        Ok(())
    }

    async fn is_pinned(&self, handle: &BlobHandle) -> RecordsResult<bool> {
        Ok(self.pinned.read().await.contains(handle))
    }

    async fn stats(&self) -> RecordsResult<BlobStats> {
        let mut stats = BlobStats::default();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            // Skip temp files and anything else that is not a handle.
            if name.to_str().and_then(|n| BlobHandle::parse(n).ok()).is_none() {
                continue;
            }
            let meta = entry.metadata().await?;
            if meta.is_file() {
                stats.blob_count += 1;
                stats.total_bytes += meta.len();
            }
        }
        stats.pinned_count = self.pinned.read().await.len();
        Ok(stats)
    }

    async fn garbage_collect(&self) -> RecordsResult<usize> {
        let _gc = self.gc_lock.write().await;
        let pinned = self.pinned.read().await;

        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            // No write is in flight while the lock is held, so any temp file is stale.
            if name.starts_with('.') && name.ends_with(".tmp") {
                remove_if_present(&entry.path()).await?;
                debug!("swept stale temp file {name}");
                continue;
            }

            let Ok(handle) = BlobHandle::parse(name) else {
                continue;
            };
            if !pinned.contains(&handle) && remove_if_present(&entry.path()).await? {
                removed += 1;
            }
        }

        debug!("collected {removed} unpinned blobs under {}", self.root.display());
        Ok(removed)
    }
}

/// Removes `path`, returning false if it was already gone.
async fn remove_if_present(path: &Path) -> RecordsResult<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
