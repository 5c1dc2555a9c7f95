//! Keyed, durable cache of columnar datasets.
//!
//! Each key owns one directory under the cache root holding a single
//! `dataset.seg` segment. Writes are atomic (temp file + rename). Reads are
//! fail-soft: any I/O, checksum, or decode failure is logged and reported as
//! a miss so the caller recomputes instead of failing.

use std::sync::Arc;

use tracing::{debug, info, warn};

use mtgdata_core::dataset::Dataset;

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::segment;
use crate::storage::Storage;

pub const SEGMENT_FILE: &str = "dataset.seg";

#[derive(Clone)]
pub struct CacheStore {
    storage: Arc<dyn Storage>,
    root: String,
    codec: Codec,
}

impl CacheStore {
    pub fn new(storage: Arc<dyn Storage>, root: impl Into<String>, codec: Codec) -> Self {
        Self {
            storage,
            root: root.into().trim_end_matches('/').to_string(),
            codec,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> String {
        format!("{}/{}/{}", self.root, key, SEGMENT_FILE)
    }

    /// Persist `dataset` under `key`, replacing any previous contents.
    pub fn write(&self, key: &str, dataset: &Dataset) -> Result<()> {
        validate_key(key)?;
        let bytes = segment::encode(dataset, self.codec)?;
        let path = self.path_for(key);
        self.storage.write_atomic(&path, &bytes)?;
        info!(
            key,
            rows = dataset.num_rows(),
            columns = dataset.num_columns(),
            bytes = bytes.len(),
            "cached dataset"
        );
        Ok(())
    }

    /// Load the dataset under `key`; `None` on a miss or any failure.
    pub fn read(&self, key: &str) -> Option<Dataset> {
        let path = self.path_for(key);
        if !self.storage.exists(&path) {
            debug!(key, "cache miss");
            return None;
        }
        match self.storage.read(&path).and_then(|bytes| segment::decode(&bytes)) {
            Ok(dataset) => {
                debug!(key, rows = dataset.num_rows(), "cache hit");
                Some(dataset)
            }
            Err(e) => {
                warn!(key, path = %path, error = %e, "unreadable cache entry; treating as miss");
                None
            }
        }
    }

    /// Remove the entry under `key` (no-op if absent).
    pub fn invalidate(&self, key: &str) -> Result<()> {
        self.storage.delete(&self.path_for(key))
    }

    /// Keys that currently have a segment on storage.
    pub fn keys(&self) -> Result<Vec<String>> {
        let prefix = format!("{}/", self.root);
        let suffix = format!("/{SEGMENT_FILE}");
        let mut keys: Vec<String> = self
            .storage
            .list(&prefix)?
            .into_iter()
            .filter_map(|p| {
                p.strip_prefix(&prefix)
                    .and_then(|rest| rest.strip_suffix(&suffix))
                    .map(|k| k.to_string())
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}

fn validate_key(key: &str) -> Result<()> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        && key != "."
        && key != "..";
    if ok {
        Ok(())
    } else {
        Err(Error::Config(format!("invalid cache key '{key}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_storage::MemoryStorage;
    use crate::storage::FsStorage;
    use mtgdata_core::schema::{DataType, Field, Schema};
    use mtgdata_core::types::Scalar;

    fn dataset(rows: usize) -> Dataset {
        let mut ds = Dataset::empty(Schema::new(vec![
            Field::new("name", DataType::Utf8),
            Field::new("mana_value", DataType::Int32),
        ]));
        for i in 0..rows {
            ds.batch
                .push_row(vec![Scalar::Str(format!("Card {i}")), Scalar::I32(i as i32)])
                .unwrap();
        }
        ds
    }

    #[test]
    fn test_write_then_read_roundtrips() {
        let store = CacheStore::new(Arc::new(MemoryStorage::new()), "mem", Codec::None);
        assert!(store.read("cards").is_none());
        store.write("cards", &dataset(3)).unwrap();
        let back = store.read("cards").unwrap();
        assert_eq!(back, dataset(3));
        assert_eq!(back.column_names(), vec!["name", "mana_value"]);
    }

    #[test]
    fn test_corrupted_entry_reads_as_absent() {
        let mem = MemoryStorage::new();
        let store = CacheStore::new(Arc::new(mem.clone()), "mem", Codec::None);
        store.write("cards", &dataset(2)).unwrap();

        mem.insert(store.path_for("cards"), b"garbage".to_vec()).unwrap();
        assert!(store.read("cards").is_none());

        store.write("cards", &dataset(4)).unwrap();
        assert_eq!(store.read("cards").unwrap(), dataset(4));
    }

    #[test]
    fn test_fs_truncated_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy().into_owned();
        let store = CacheStore::new(Arc::new(FsStorage::new()), &root, Codec::None);
        store.write("cards", &dataset(10)).unwrap();

        let path = store.path_for("cards");
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
        assert!(store.read("cards").is_none());
    }

    #[test]
    fn test_keys_and_invalidate() {
        let store = CacheStore::new(Arc::new(MemoryStorage::new()), "mem", Codec::None);
        store.write("cards", &dataset(1)).unwrap();
        store.write("cards_with_stats", &dataset(1)).unwrap();
        assert_eq!(store.keys().unwrap(), vec!["cards", "cards_with_stats"]);

        store.invalidate("cards").unwrap();
        assert!(store.read("cards").is_none());
        assert_eq!(store.keys().unwrap(), vec!["cards_with_stats"]);
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let store = CacheStore::new(Arc::new(MemoryStorage::new()), "mem", Codec::None);
        assert!(store.write("../escape", &dataset(1)).is_err());
        assert!(store.write("", &dataset(1)).is_err());
    }
}
