//! # Result Cache Module
//!
//! A durable key-to-bytes store backed by one file per key under a cache directory.
//! It is used by the search client to avoid refetching provider pages across runs.
//!
//! ## Key Components
//!
//! - `ResultCache`: The store itself, safe to share between tasks behind an `Arc`
//! - `CacheError`: Errors raised by cache reads and writes
//!
//! ## Features
//!
//! - Any opaque key maps to a deterministic, filesystem-safe file name
//! - Per-key reader/writer locking: one writer at a time, readers otherwise shared
//! - Writes land in a temporary file and are renamed into place
//!
//! There is no expiry or eviction, so the directory grows without bound. Per-key
//! locks are dropped from memory as soon as no task holds them.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Error as CrateError;

/// Keys longer than this many bytes are shortened with a hash suffix
const MAX_ENCODED_KEY_BYTES: usize = 64;

const ENTRY_EXTENSION: &str = "bin";

/// Error type for cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<CacheError> for CrateError {
    fn from(err: CacheError) -> Self {
        CrateError::Cache(err.to_string())
    }
}

type Result<T> = std::result::Result<T, CacheError>;

/// File-per-key byte cache
#[derive(Debug)]
pub struct ResultCache {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl ResultCache {
    /// Open a cache rooted at `dir`, creating it if necessary
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Root directory of the cache
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the stored value for `key`, if any
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let lock = self.lock_for(key);
        let result = {
            let _guard = lock.read().await;
            self.read_entry(key).await
        };
        self.release(key, lock);
        result
    }

    /// Store `value` under `key`, replacing any previous value
    pub async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let lock = self.lock_for(key);
        let result = {
            let _guard = lock.write().await;
            self.write_entry(key, value).await
        };
        self.release(key, lock);
        result
    }

    async fn read_entry(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.entry_path(key)).await {
            Ok(bytes) => {
                debug!("Cache hit for {}", key);
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_entry(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.entry_path(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    fn lock_for(&self, key: &str) -> Arc<RwLock<()>> {
        self.lock_table().entry(key.to_string()).or_default().clone()
    }

    /// Drop the table entry for `key` once no other task holds its lock
    fn release(&self, key: &str, lock: Arc<RwLock<()>>) {
        drop(lock);
        let mut locks = self.lock_table();
        if locks.get(key).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            locks.remove(key);
        }
    }

    fn lock_table(&self) -> MutexGuard<'_, HashMap<String, Arc<RwLock<()>>>> {
        match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", encode_key(key), ENTRY_EXTENSION))
    }
}

/// Hex-encode a key into a file stem; long keys keep a prefix plus a SHA-256 suffix
fn encode_key(key: &str) -> String {
    let bytes = key.as_bytes();
    if bytes.len() <= MAX_ENCODED_KEY_BYTES {
        return hex(bytes);
    }

    let digest = Sha256::digest(bytes);
    format!(
        "{}-{}-{}",
        hex(&bytes[..MAX_ENCODED_KEY_BYTES]),
        hex(&digest[..8]),
        bytes.len()
    )
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
