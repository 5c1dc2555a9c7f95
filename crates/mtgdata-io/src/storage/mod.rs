//! Storage backends for cached datasets and raw downloads.
//!
//! - `fs`: local filesystem (default).
//! - `MemoryStorage` (crate root): in-process map, selected by `memory://`.
//!
//! `build_storage_from_config` picks the backend from the cache URI scheme
//! (e.g. `file:///var/cache/mtgdata`, `memory://`, or a bare path).

mod fs;
pub use fs::FsStorage;

use std::sync::Arc;

use mtgdata_core::config::StorageConfig;

use crate::error::{Error, Result};
use crate::memory_storage::MemoryStorage;

/// Byte-oriented storage keyed by slash-separated paths.
pub trait Storage: Send + Sync {
    /// Write bytes to a path. Creates parent directories if needed.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Read up to `len` bytes starting at `offset`.
    fn read_range(&self, path: &str, offset: u64, len: usize) -> Result<Vec<u8>>;

    /// Move `from` over `to`, replacing any existing object at `to`.
    fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Delete a path. Idempotent (no error if path doesn't exist).
    fn delete(&self, path: &str) -> Result<()>;

    /// List all paths under a prefix.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Get size of a path in bytes.
    fn size(&self, path: &str) -> Result<u64>;

    fn exists(&self, path: &str) -> bool {
        self.size(path).is_ok()
    }

    /// Read a whole object.
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let len = self.size(path)?;
        let len = usize::try_from(len)
            .map_err(|_| Error::Storage(format!("{path}: {len} bytes does not fit in memory")))?;
        self.read_range(path, 0, len)
    }

    /// Write to a sibling temp path, then rename into place so readers never
    /// observe a partially-written object.
    fn write_atomic(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let tmp = format!("{path}.tmp");
        self.write(&tmp, bytes)?;
        self.rename(&tmp, path)
    }
}

/// Build the correct storage backend using the provided configuration.
pub fn build_storage_from_config(cfg: &StorageConfig) -> Result<Arc<dyn Storage>> {
    match cfg.scheme() {
        Some("memory") => Ok(Arc::new(MemoryStorage::new())),
        Some("file") | None => {
            // Default to filesystem (treat URI as file:// or bare path).
            Ok(Arc::new(FsStorage::new()))
        }
        Some(other) => Err(Error::Config(format!("unsupported cache scheme '{other}'"))),
    }
}
