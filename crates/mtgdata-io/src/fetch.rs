//! Remote fetch abstraction.
//!
//! The loader only needs "give me the body at this URL"; transport details
//! (TLS, proxies, redirects) belong to the implementation. `HttpFetcher` is
//! the real client, `MemoryFetcher` serves canned bodies for tests and
//! offline runs and counts every request it sees.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

pub trait Fetcher: Send + Sync {
    /// Fetch the full response body for `url`. Non-success statuses are errors.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP client.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let fail = |e: reqwest::Error| Error::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };
        debug!(url, "fetching");
        let resp = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(fail)?;
        let body = resp.bytes().map_err(fail)?;
        debug!(url, bytes = body.len(), "fetched");
        Ok(body.to_vec())
    }
}

/// Canned responses keyed by exact URL.
#[derive(Clone, Default)]
pub struct MemoryFetcher {
    bodies: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    calls: Arc<AtomicUsize>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Result<()> {
        self.bodies
            .lock()
            .map_err(|_| Error::Storage("memory fetcher lock poisoned".into()))?
            .insert(url.into(), body.into());
        Ok(())
    }

    /// Total number of `fetch` calls, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bodies = self.bodies.lock().map_err(|_| Error::Fetch {
            url: url.to_string(),
            reason: "memory fetcher lock poisoned".into(),
        })?;
        bodies.get(url).cloned().ok_or_else(|| Error::Fetch {
            url: url.to_string(),
            reason: "404 Not Found".into(),
        })
    }
}
