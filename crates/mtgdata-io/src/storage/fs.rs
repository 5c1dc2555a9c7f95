use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::storage::Storage;

/// Local filesystem storage (rooted at the host filesystem).
#[derive(Debug, Clone, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FsStorage {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Storage(format!("mkparent: {e}")))?;
        }
        let mut f = File::create(p).map_err(|e| Error::Storage(format!("create: {e}")))?;
        f.write_all(bytes)
            .map_err(|e| Error::Storage(format!("write: {e}")))?;
        f.sync_all()
            .map_err(|e| Error::Storage(format!("sync: {e}")))?;
        Ok(())
    }

    fn read_range(&self, path: &str, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut f =
            File::open(Path::new(path)).map_err(|e| Error::Storage(format!("open: {e}")))?;
        f.seek(SeekFrom::Start(offset))
            .map_err(|e| Error::Storage(format!("seek: {e}")))?;
        let mut buf = Vec::with_capacity(len);
        f.take(len as u64)
            .read_to_end(&mut buf)
            .map_err(|e| Error::Storage(format!("read: {e}")))?;
        Ok(buf)
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        let to = Path::new(to);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Storage(format!("mkparent: {e}")))?;
        }
        fs::rename(from, to).map_err(|e| Error::Storage(format!("rename: {e}")))
    }

    fn delete(&self, path: &str) -> Result<()> {
        let p = Path::new(path);
        if p.exists() {
            fs::remove_file(p).map_err(|e| Error::Storage(format!("delete: {e}")))?;
        }
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix_path = Path::new(prefix);
        let mut results = Vec::new();

        if !prefix_path.exists() {
            return Ok(results);
        }

        if prefix_path.is_file() {
            if let Some(s) = prefix_path.to_str() {
                results.push(s.to_string());
            }
            return Ok(results);
        }

        fn visit_dirs(dir: &Path, results: &mut Vec<String>) -> std::io::Result<()> {
            if dir.is_dir() {
                for entry in fs::read_dir(dir)? {
                    let entry = entry?;
                    let path = entry.path();
                    if path.is_dir() {
                        visit_dirs(&path, results)?;
                    } else if let Some(s) = path.to_str() {
                        results.push(s.to_string());
                    }
                }
            }
            Ok(())
        }

        visit_dirs(prefix_path, &mut results).map_err(|e| Error::Storage(format!("list: {e}")))?;
        results.sort();

        Ok(results)
    }

    fn size(&self, path: &str) -> Result<u64> {
        let meta = fs::metadata(Path::new(path)).map_err(|e| Error::Storage(format!("size: {e}")))?;
        if !meta.is_file() {
            return Err(Error::Storage(format!("size: {path} is not a file")));
        }
        Ok(meta.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().to_string_lossy().into_owned();
        (dir, root)
    }

    #[test]
    fn test_write_read_roundtrip() {
        let (_dir, root) = root();
        let storage = FsStorage::new();
        let path = format!("{root}/cards/dataset.seg");
        storage.write(&path, b"hello world").unwrap();
        assert_eq!(storage.read(&path).unwrap(), b"hello world");
        assert_eq!(storage.read_range(&path, 6, 5).unwrap(), b"world");
        assert_eq!(storage.size(&path).unwrap(), 11);
    }

    #[test]
    fn test_atomic_write_replaces_and_cleans_tmp() {
        let (_dir, root) = root();
        let storage = FsStorage::new();
        let path = format!("{root}/k/dataset.seg");
        storage.write_atomic(&path, b"first").unwrap();
        storage.write_atomic(&path, b"second").unwrap();
        assert_eq!(storage.read(&path).unwrap(), b"second");
        assert!(!storage.exists(&format!("{path}.tmp")));
    }

    #[test]
    fn test_list_and_delete() {
        let (_dir, root) = root();
        let storage = FsStorage::new();
        storage.write(&format!("{root}/a/x"), b"1").unwrap();
        storage.write(&format!("{root}/b/y"), b"2").unwrap();
        assert_eq!(storage.list(&root).unwrap().len(), 2);

        storage.delete(&format!("{root}/a/x")).unwrap();
        storage.delete(&format!("{root}/a/x")).unwrap();
        assert_eq!(storage.list(&root).unwrap(), vec![format!("{root}/b/y")]);
        assert!(storage.list(&format!("{root}/missing")).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_errors() {
        let (_dir, root) = root();
        let storage = FsStorage::new();
        assert!(storage.read(&format!("{root}/nope")).is_err());
        assert!(!storage.exists(&format!("{root}/nope")));
        assert!(!storage.exists(&root));
    }
}
