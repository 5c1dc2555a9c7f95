//! Bulk archive extraction.
//!
//! The card archive may be served raw or zip-compressed. Zip bodies are
//! detected by their local-file-header magic; the first `*.json` member is
//! returned.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::{Error, Result};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Upper bound on the buffer reserved from a member's declared size.
const MAX_PREALLOC: usize = 64 << 20;

pub fn is_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
}

/// The JSON document inside `bytes`, decompressing if needed.
pub fn extract_json(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !is_zip(&bytes) {
        return Ok(bytes);
    }
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| Error::Archive(format!("open: {e}")))?;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| Error::Archive(format!("entry {i}: {e}")))?;
        if entry.is_file() && entry.name().ends_with(".json") {
            let mut out = Vec::with_capacity(capacity_hint(entry.size()));
            entry.read_to_end(&mut out)?;
            return Ok(out);
        }
    }
    Err(Error::Archive("zip archive has no .json member".into()))
}

fn capacity_hint(declared: u64) -> usize {
    usize::try_from(declared)
        .unwrap_or(usize::MAX)
        .min(MAX_PREALLOC)
}
