//! In-memory storage backend.
//!
//! HashMap-backed `Storage`, selected by the `memory://` cache URI. Used by
//! tests and by callers that want a throwaway cache for a single process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::storage::Storage;

/// Thread-safe in-memory storage using a HashMap.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.data
            .lock()
            .map_err(|_| Error::Storage("memory storage lock poisoned".into()))
    }

    /// Overwrite the bytes at `path` in place (tests use this to corrupt entries).
    pub fn insert(&self, path: impl Into<String>, bytes: Vec<u8>) -> Result<()> {
        self.data()?.insert(path.into(), bytes);
        Ok(())
    }

    /// Get the number of stored objects
    pub fn len(&self) -> usize {
        self.data().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.data()?.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read_range(&self, path: &str, offset: u64, len: usize) -> Result<Vec<u8>> {
        let data = self.data()?;
        let bytes = data
            .get(path)
            .ok_or_else(|| Error::Storage(format!("path not found: {path}")))?;

        let start = offset as usize;
        if start > bytes.len() {
            return Err(Error::Storage(format!(
                "offset {offset} exceeds size {}",
                bytes.len()
            )));
        }
        let end = start.saturating_add(len).min(bytes.len());
        Ok(bytes[start..end].to_vec())
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        let mut data = self.data()?;
        let bytes = data
            .remove(from)
            .ok_or_else(|| Error::Storage(format!("path not found: {from}")))?;
        data.insert(to.to_string(), bytes);
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.data()?.remove(path);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut result: Vec<String> = self
            .data()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        result.sort();
        Ok(result)
    }

    fn size(&self, path: &str) -> Result<u64> {
        let data = self.data()?;
        let bytes = data
            .get(path)
            .ok_or_else(|| Error::Storage(format!("path not found: {path}")))?;
        Ok(bytes.len() as u64)
    }
}
