//! Raw-download cache: remote bodies stored once, keyed by request URL.

use std::sync::Arc;

use tracing::{debug, info};

use mtgdata_core::hash::hash_str;

use crate::error::Result;
use crate::fetch::Fetcher;
use crate::storage::Storage;

pub const DOWNLOADS_DIR: &str = "downloads";

#[derive(Clone)]
pub struct DownloadCache {
    storage: Arc<dyn Storage>,
    fetcher: Arc<dyn Fetcher>,
    root: String,
}

impl DownloadCache {
    pub fn new(storage: Arc<dyn Storage>, fetcher: Arc<dyn Fetcher>, root: &str) -> Self {
        Self {
            storage,
            fetcher,
            root: format!("{}/{DOWNLOADS_DIR}", root.trim_end_matches('/')),
        }
    }

    /// Storage path of the cached body for `url`.
    pub fn path_for(&self, url: &str) -> String {
        format!("{}/{}", self.root, hash_str(url).to_hex())
    }

    /// Whether a body for `url` is cached.
    pub fn contains(&self, url: &str) -> bool {
        self.storage.exists(&self.path_for(url))
    }

    /// Body for `url`, fetched only if not cached or when `refresh` is set.
    pub fn get(&self, url: &str, refresh: bool) -> Result<Vec<u8>> {
        let path = self.path_for(url);
        if !refresh && self.contains(url) {
            match self.storage.read(&path) {
                Ok(bytes) => {
                    debug!(url, bytes = bytes.len(), "download cache hit");
                    return Ok(bytes);
                }
                Err(e) => debug!(url, error = %e, "download cache unreadable; refetching"),
            }
        }
        let bytes = self.fetcher.fetch(url)?;
        self.storage.write_atomic(&path, &bytes)?;
        info!(url, bytes = bytes.len(), refresh, "downloaded");
        Ok(bytes)
    }

    pub fn evict(&self, url: &str) -> Result<()> {
        self.storage.delete(&self.path_for(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;
    use crate::memory_storage::MemoryStorage;

    const URL: &str = "https://example.com/AllPrintings.json";

    fn cache() -> (DownloadCache, MemoryFetcher) {
        let fetcher = MemoryFetcher::new();
        fetcher.insert(URL, "{\"data\":{}}").unwrap();
        let cache = DownloadCache::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(fetcher.clone()),
            "mem/",
        );
        (cache, fetcher)
    }

    #[test]
    fn test_second_get_is_served_from_cache() {
        let (cache, fetcher) = cache();
        assert!(!cache.contains(URL));
        cache.get(URL, false).unwrap();
        cache.get(URL, false).unwrap();
        assert_eq!(fetcher.calls(), 1);
        assert!(cache.contains(URL));
        assert!(cache.path_for(URL).starts_with("mem/downloads/"));
    }

    #[test]
    fn test_refresh_refetches() {
        let (cache, fetcher) = cache();
        cache.get(URL, false).unwrap();
        fetcher.insert(URL, "{\"data\":{\"VOW\":{}}}").unwrap();
        let body = cache.get(URL, true).unwrap();
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(body, b"{\"data\":{\"VOW\":{}}}");
        assert_eq!(cache.get(URL, false).unwrap(), body);
    }

    #[test]
    fn test_evict_forces_refetch() {
        let (cache, fetcher) = cache();
        cache.get(URL, false).unwrap();
        cache.evict(URL).unwrap();
        cache.get(URL, false).unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_fetch_failure_propagates() {
        let (cache, _) = cache();
        assert!(cache.get("https://example.com/missing", false).is_err());
    }

    #[test]
    fn test_prepopulated_body_is_served_without_fetching() {
        let storage = Arc::new(MemoryStorage::new());
        let fetcher = MemoryFetcher::new();
        let cache = DownloadCache::new(storage.clone(), Arc::new(fetcher.clone()), "mem/");
        storage.write(&cache.path_for(URL), b"{\"data\":{}}").unwrap();

        assert!(cache.contains(URL));
        assert_eq!(cache.get(URL, false).unwrap(), b"{\"data\":{}}");
        assert_eq!(fetcher.calls(), 0);
    }
}
