//! Single-slot snapshot cache.
//!
//! The cache holds at most one [`CacheEntry`]: the identifier of the last
//! snapshot that decoded successfully, together with its catalog. Entries
//! never expire on their own; they are only superseded by a `put` for a
//! different identifier.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use lista_core::{Catalog, SnapshotId};
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub identifier: SnapshotId,
    pub catalog: Catalog,
}

/// Storage for the last successfully decoded snapshot.
pub trait SnapshotCache: Send + Sync {
    /// Returns the stored entry, or `None` when the cache is empty.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Storage`] when the backing store cannot be read.
    fn get(&self) -> Result<Option<CacheEntry>, FeedError>;

    /// Replaces the stored entry. Identifier and catalog are written as one unit.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Storage`] when the backing store cannot be written.
    fn put(&self, identifier: &SnapshotId, catalog: &Catalog) -> Result<(), FeedError>;

    /// `true` iff an entry exists and its identifier equals `identifier`.
    /// An unreadable store counts as empty.
    fn is_fresh(&self, identifier: &SnapshotId) -> bool {
        matches!(self.get(), Ok(Some(entry)) if entry.identifier == *identifier)
    }
}

/// In-process cache, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: Mutex<Option<CacheEntry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entry(identifier: SnapshotId, catalog: Catalog) -> Self {
        Self {
            slot: Mutex::new(Some(CacheEntry {
                identifier,
                catalog,
            })),
        }
    }
}

impl SnapshotCache for MemoryCache {
    fn get(&self) -> Result<Option<CacheEntry>, FeedError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn put(&self, identifier: &SnapshotId, catalog: &Catalog) -> Result<(), FeedError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        *slot = Some(CacheEntry {
            identifier: identifier.clone(),
            catalog: catalog.clone(),
        });
        Ok(())
    }
}

#[derive(Serialize)]
struct StoredEntryRef<'a> {
    identifier: &'a SnapshotId,
    stored_at: DateTime<Utc>,
    products: &'a Catalog,
}

#[derive(Deserialize)]
struct StoredEntry {
    identifier: SnapshotId,
    #[serde(default)]
    stored_at: Option<DateTime<Utc>>,
    products: Catalog,
}

#[derive(Deserialize)]
struct StoredIdentifier {
    identifier: SnapshotId,
}

/// Cache persisted as one JSON file holding both the identifier and the
/// catalog, so the two can never be observed out of step.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read(&self) -> Result<Option<Vec<u8>>, FeedError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FeedError::storage(&self.path, e)),
        }
    }
}

impl SnapshotCache for FileCache {
    fn get(&self) -> Result<Option<CacheEntry>, FeedError> {
        let Some(bytes) = self.read()? else {
            return Ok(None);
        };
        let stored: StoredEntry =
            serde_json::from_slice(&bytes).map_err(|e| FeedError::storage(&self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            identifier = %stored.identifier,
            stored_at = ?stored.stored_at,
            products = stored.products.len(),
            "read snapshot cache"
        );
        Ok(Some(CacheEntry {
            identifier: stored.identifier,
            catalog: stored.products,
        }))
    }

    fn put(&self, identifier: &SnapshotId, catalog: &Catalog) -> Result<(), FeedError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| FeedError::storage(parent, e))?;
        }

        let json = serde_json::to_vec(&StoredEntryRef {
            identifier,
            stored_at: Utc::now(),
            products: catalog,
        })
        .map_err(|e| FeedError::storage(&self.path, e))?;

        // Drop the old entry before writing the new one so both never
        // occupy storage at once.
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(FeedError::storage(&self.path, e)),
        }

        let temp = self.temp_path();
        std::fs::write(&temp, json).map_err(|e| FeedError::storage(&temp, e))?;
        std::fs::rename(&temp, &self.path).map_err(|e| FeedError::storage(&self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            %identifier,
            products = catalog.len(),
            "wrote snapshot cache"
        );
        Ok(())
    }

    fn is_fresh(&self, identifier: &SnapshotId) -> bool {
        let stored = self.read().and_then(|bytes| {
            bytes
                .map(|b| serde_json::from_slice::<StoredIdentifier>(&b))
                .transpose()
                .map_err(|e| FeedError::storage(&self.path, e))
        });
        match stored {
            Ok(Some(stored)) => stored.identifier == *identifier,
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "snapshot cache unreadable; treating as empty");
                false
            }
        }
    }
}
