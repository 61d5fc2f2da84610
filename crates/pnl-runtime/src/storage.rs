#![forbid(unsafe_code)]

//! String key-value storage in the shape of the browser's `localStorage` and
//! `sessionStorage`.
//!
//! Locale preference and the auth token both persist through a
//! [`KeyValueStore`]. Hosts pick the backend: [`MemoryStore`] for tests and
//! ephemeral sessions, `FileStore` (feature `state-persistence`) for state
//! that must survive a restart.
//!
//! # Design Invariants
//!
//! 1. Storage failures never panic; every operation returns [`StorageResult`].
//! 2. `FileStore` writes are atomic (write to a temp file, then rename).
//! 3. A missing file reads as an empty store.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `StorageError::Io` | File I/O failure | Returns error, file unchanged |
//! | `StorageError::Serialization` | JSON encode/decode | Returns error |
//! | `StorageError::Corruption` | Poisoned lock, unknown format version | Returns error |

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Serialization or deserialization error.
    #[cfg(feature = "state-persistence")]
    Serialization(String),
    /// Stored data is unreadable or a lock was poisoned.
    Corruption(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "state-persistence")]
            StorageError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StorageError::Corruption(msg) => write!(f, "storage corruption: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            #[cfg(feature = "state-persistence")]
            StorageError::Serialization(_) => None,
            StorageError::Corruption(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// ─────────────────────────────────────────────────────────────────────────────
// Store Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A pluggable string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Read a value. `Ok(None)` if the key is absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Delete every key.
    fn clear(&self) -> StorageResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Store (always available)
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory store. Contents are lost when it is dropped.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().map(|g| g.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Corruption("lock poisoned".into())
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        "MemoryStore"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let guard = self.data.read().map_err(poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut guard = self.data.write().map_err(poisoned)?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut guard = self.data.write().map_err(poisoned)?;
        guard.remove(key);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut guard = self.data.write().map_err(poisoned)?;
        guard.clear();
        Ok(())
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Store (requires state-persistence feature)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "state-persistence")]
mod file_store {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Write};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// On-disk layout.
    #[derive(Serialize, Deserialize)]
    struct StoreFile {
        format_version: u32,
        entries: BTreeMap<String, String>,
    }

    impl StoreFile {
        const FORMAT_VERSION: u32 = 1;

        fn new(entries: BTreeMap<String, String>) -> Self {
            Self {
                format_version: Self::FORMAT_VERSION,
                entries,
            }
        }
    }

    /// JSON file store.
    ///
    /// Every write rewrites the whole file:
    /// 1. Write to `{path}.tmp`
    /// 2. Flush and sync
    /// 3. Rename over `{path}`
    ///
    /// ```json
    /// {
    ///   "format_version": 1,
    ///   "entries": { "paynetlink-locale": "en" }
    /// }
    /// ```
    pub struct FileStore {
        path: PathBuf,
        write_lock: Mutex<()>,
    }

    impl FileStore {
        /// Store backed by `path`. The file is created on first write.
        #[must_use]
        pub fn new(path: impl AsRef<Path>) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
                write_lock: Mutex::new(()),
            }
        }

        /// The backing file.
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn temp_path(&self) -> PathBuf {
            let mut tmp = self.path.clone();
            tmp.set_extension("json.tmp");
            tmp
        }

        fn load(&self) -> StorageResult<BTreeMap<String, String>> {
            if !self.path.exists() {
                return Ok(BTreeMap::new());
            }
            let reader = BufReader::new(File::open(&self.path)?);
            let file: StoreFile = serde_json::from_reader(reader).map_err(|e| {
                StorageError::Serialization(format!("failed to parse store file: {e}"))
            })?;
            if file.format_version != StoreFile::FORMAT_VERSION {
                return Err(StorageError::Corruption(format!(
                    "unsupported format version {} (expected {})",
                    file.format_version,
                    StoreFile::FORMAT_VERSION
                )));
            }
            Ok(file.entries)
        }

        fn save(&self, entries: BTreeMap<String, String>) -> StorageResult<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let tmp_path = self.temp_path();
            {
                let mut writer = BufWriter::new(File::create(&tmp_path)?);
                serde_json::to_writer_pretty(&mut writer, &StoreFile::new(entries)).map_err(
                    |e| StorageError::Serialization(format!("failed to serialize store: {e}")),
                )?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
            }
            fs::rename(&tmp_path, &self.path)?;
            tracing::debug!(path = %self.path.display(), "store file written");
            Ok(())
        }

        fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> StorageResult<()> {
            let _guard = self.write_lock.lock().map_err(poisoned)?;
            let mut entries = self.load()?;
            f(&mut entries);
            self.save(entries)
        }
    }

    impl KeyValueStore for FileStore {
        fn name(&self) -> &str {
            "FileStore"
        }

        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            Ok(self.load()?.remove(key))
        }

        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            self.modify(|entries| {
                entries.insert(key.to_string(), value.to_string());
            })
        }

        fn remove(&self, key: &str) -> StorageResult<()> {
            self.modify(|entries| {
                entries.remove(key);
            })
        }

        fn clear(&self) -> StorageResult<()> {
            let _guard = self.write_lock.lock().map_err(poisoned)?;
            if self.path.exists() {
                fs::remove_file(&self.path)?;
            }
            Ok(())
        }
    }

    impl fmt::Debug for FileStore {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FileStore")
                .field("path", &self.path)
                .finish()
        }
    }
}

#[cfg(feature = "state-persistence")]
pub use file_store::FileStore;
