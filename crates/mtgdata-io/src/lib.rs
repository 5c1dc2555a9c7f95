#![forbid(unsafe_code)]
//! mtgdata-io: everything that touches disk or network.
//!
//! - `storage`: the `Storage` trait plus filesystem and in-memory backends
//! - `segment`/`codec`: checksummed on-disk format for cached datasets
//! - `cache`: `CacheStore`, a fail-soft keyed dataset cache
//! - `fetch`/`download`: remote fetch abstraction and the raw-download cache
//! - `archive`: zip extraction for bulk archives
//! - `frame`: conversion of a dataset into an Arrow `RecordBatch`

pub mod archive;
pub mod cache;
pub mod codec;
pub mod download;
pub mod error;
pub mod fetch;
pub mod frame;
pub mod memory_storage;
pub mod segment;
pub mod storage;

pub use cache::CacheStore;
pub use codec::Codec;
pub use download::DownloadCache;
pub use error::{Error, Result};
pub use fetch::{Fetcher, HttpFetcher, MemoryFetcher};
pub use memory_storage::MemoryStorage;
pub use storage::{build_storage_from_config, FsStorage, Storage};
