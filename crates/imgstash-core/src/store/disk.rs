//! Directory-backed store.
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//!   imgstash/
//!     store.json                 # Manifest written once at creation
//!     images/
//!       3f2a...e1.bin            # One file per URL (SHA-256 of the URL)
//! ```

use std::fmt::Write;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info};

use super::Store;
use crate::{Error, Result, STORE_NAME, STORE_TABLE, STORE_VERSION};

const MANIFEST_FILE: &str = "store.json";

/// File-name-safe key derived from a URL.
///
/// The full SHA-256 hex digest of the URL, so the same URL always maps to the
/// same entry file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey(String);

impl EntryKey {
    /// Derive the key for `url`.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let digest = Sha256::digest(url.as_bytes());
        let hex = digest.iter().fold(String::with_capacity(64), |mut acc, b| {
            // write! to String is infallible
            let _ = write!(acc, "{b:02x}");
            acc
        });
        Self(hex)
    }

    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a store on disk, written when the store is first created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreManifest {
    /// Fixed store identifier.
    pub name: String,
    /// Layout version used at creation time.
    pub version: u32,
    /// Name of the single logical table.
    pub table: String,
    /// When the store was created.
    pub created_at: DateTime<Utc>,
}

impl StoreManifest {
    fn current() -> Self {
        Self {
            name: STORE_NAME.to_string(),
            version: STORE_VERSION,
            table: STORE_TABLE.to_string(),
            created_at: Utc::now(),
        }
    }

    fn is_compatible(&self) -> bool {
        self.name == STORE_NAME && self.version == STORE_VERSION && self.table == STORE_TABLE
    }
}

/// Durable store keeping one file per URL.
///
/// Writes go through a temp file and a rename, so a crash mid-write never
/// leaves a truncated entry behind.
#[derive(Debug)]
pub struct DiskStore {
    dir: PathBuf,
    table_dir: PathBuf,
    manifest: StoreManifest,
    tmp_seq: AtomicU64,
}

impl DiskStore {
    /// Open the store under `root`, creating it when missing.
    ///
    /// Opening is idempotent: an existing store with a compatible manifest is
    /// reused as is.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let dir = root.as_ref().join(STORE_NAME);
        let table_dir = dir.join(STORE_TABLE);

        fs::create_dir_all(&table_dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create store directory: {e}")))?;

        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest = match fs::read(&manifest_path).await {
            Ok(raw) => {
                let manifest: StoreManifest = serde_json::from_slice(&raw)
                    .map_err(|e| Error::Storage(format!("Corrupt store manifest: {e}")))?;
                if !manifest.is_compatible() {
                    return Err(Error::Storage(format!(
                        "Incompatible store at {}: {} v{} (expected {} v{})",
                        dir.display(),
                        manifest.name,
                        manifest.version,
                        STORE_NAME,
                        STORE_VERSION
                    )));
                }
                debug!("Opened existing store at {}", dir.display());
                manifest
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let manifest = StoreManifest::current();
                let json = serde_json::to_vec_pretty(&manifest)?;
                write_atomic(&manifest_path, &manifest_path.with_extension("json.tmp"), &json)
                    .await?;
                info!("Created image store at {}", dir.display());
                manifest
            },
            Err(e) => {
                return Err(Error::Storage(format!("Failed to read store manifest: {e}")));
            },
        };

        Ok(Self {
            dir,
            table_dir,
            manifest,
            tmp_seq: AtomicU64::new(0),
        })
    }

    /// Directory holding the manifest and table.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Manifest the store was opened with.
    #[must_use]
    pub const fn manifest(&self) -> &StoreManifest {
        &self.manifest
    }

    fn entry_path(&self, key: &EntryKey) -> PathBuf {
        self.table_dir.join(format!("{key}.bin"))
    }
}

#[async_trait]
impl Store for DiskStore {
    async fn put(&self, key: &str, blob: Bytes) -> Result<()> {
        let entry = EntryKey::from_url(key);
        let path = self.entry_path(&entry);
        // Concurrent writers of the same key each get their own temp file.
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let tmp_path = self.table_dir.join(format!("{entry}.{seq}.tmp"));

        write_atomic(&path, &tmp_path, &blob).await?;

        debug!("Stored {} bytes for {}", blob.len(), key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let path = self.entry_path(&EntryKey::from_url(key));
        match fs::read(&path).await {
            Ok(raw) => Ok(Some(Bytes::from(raw))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to read entry for {key}: {e}"))),
        }
    }
}

async fn write_atomic(path: &Path, tmp_path: &Path, contents: &[u8]) -> Result<()> {
    let result = commit(path, tmp_path, contents).await;
    if result.is_err() {
        // Best effort; the temp file may never have been created.
        let _ = fs::remove_file(tmp_path).await;
    }
    result
}

async fn commit(path: &Path, tmp_path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(tmp_path, contents)
        .await
        .map_err(|e| Error::Storage(format!("Failed to write temp file: {e}")))?;

    // Handle Windows: remove target before rename
    #[cfg(target_os = "windows")]
    if fs::try_exists(path).await.unwrap_or(false) {
        fs::remove_file(path)
            .await
            .map_err(|e| Error::Storage(format!("Failed to remove existing entry: {e}")))?;
    }

    fs::rename(tmp_path, path)
        .await
        .map_err(|e| Error::Storage(format!("Failed to commit entry: {e}")))
}
