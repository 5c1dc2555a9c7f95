//! Per-printing stats from the stats service.
//!
//! Responses are cached raw on storage (via `DownloadCache`) and parsed maps
//! are memoized in process with an LRU keyed by `(printing, format)`.
//! Printings outside the configured allow-list are never requested.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use url::Url;

use mtgdata_io::download::DownloadCache;

use crate::card::CardStats;
use crate::error::{Error, Result};

/// Stats entries of one printing, keyed by the service's card name.
pub type StatsMap = HashMap<String, CardStats>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatsQuery {
    pub printing: String,
    pub format: String,
}

impl StatsQuery {
    pub fn new(printing: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            printing: printing.into(),
            format: format.into(),
        }
    }

    /// Request URL for this query against `base`.
    pub fn url(&self, base: &str) -> Result<String> {
        let url = Url::parse_with_params(
            base,
            &[
                ("expansion", self.printing.as_str()),
                ("format", self.format.as_str()),
            ],
        )
        .map_err(|e| Error::InvalidArguments(format!("stats url '{base}': {e}")))?;
        Ok(url.into())
    }
}

pub struct StatsFetcher {
    downloads: DownloadCache,
    base_url: String,
    supported: HashSet<String>,
    memo: LruCache<StatsQuery, Arc<StatsMap>>,
    // Set by `invalidate`; each query then refetches once.
    refetch: bool,
    refetched: HashSet<StatsQuery>,
}

impl StatsFetcher {
    pub fn new(
        downloads: DownloadCache,
        base_url: impl Into<String>,
        supported: impl IntoIterator<Item = String>,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            downloads,
            base_url: base_url.into(),
            supported: supported.into_iter().collect(),
            memo: LruCache::new(capacity),
            refetch: false,
            refetched: HashSet::new(),
        }
    }

    pub fn supports(&self, printing: &str) -> bool {
        self.supported.contains(printing)
    }

    /// Stats for `printing` in `format`, or `None` if the printing is not
    /// covered by the service.
    ///
    /// An empty response is an error, and its raw cache entry is dropped so
    /// the next call asks the service again.
    pub fn fetch_stats(&mut self, printing: &str, format: &str) -> Result<Option<Arc<StatsMap>>> {
        if !self.supports(printing) {
            debug!(printing, "printing not covered by stats service");
            return Ok(None);
        }
        let query = StatsQuery::new(printing, format);
        if let Some(stats) = self.memo.get(&query) {
            return Ok(Some(Arc::clone(stats)));
        }

        let url = query.url(&self.base_url)?;
        let refresh = self.refetch && self.refetched.insert(query.clone());
        let body = self.downloads.get(&url, refresh)?;
        let stats = parse_stats(&body, &query)?;
        if stats.is_empty() {
            warn!(printing, format, "stats service returned no cards");
            self.downloads.evict(&url)?;
            return Err(Error::EmptyStats {
                printing: printing.to_string(),
                format: format.to_string(),
            });
        }
        info!(printing, format, cards = stats.len(), "loaded stats");

        let stats = Arc::new(stats);
        self.memo.put(query, Arc::clone(&stats));
        Ok(Some(stats))
    }

    /// Forget memoized maps and refetch each query once on its next use.
    pub fn invalidate(&mut self) {
        self.memo.clear();
        self.refetch = true;
        self.refetched.clear();
    }

    pub fn memoized(&self) -> usize {
        self.memo.len()
    }
}

/// Parse a stats-service body: a JSON array of per-card objects.
///
/// The service's `color` becomes `stats_colors` and the requested format is
/// stamped on every entry. On duplicate names the first entry wins.
pub fn parse_stats(body: &[u8], query: &StatsQuery) -> Result<StatsMap> {
    let bad = |reason: String| Error::StatsResponse {
        printing: query.printing.clone(),
        reason,
    };
    let entries: Vec<Map<String, Value>> =
        serde_json::from_slice(body).map_err(|e| bad(e.to_string()))?;

    let mut stats = StatsMap::with_capacity(entries.len());
    for mut entry in entries {
        let colors = entry
            .remove("color")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        entry.insert("stats_colors".into(), Value::String(colors));
        entry.insert("stats_format".into(), Value::String(query.format.clone()));
        let card: CardStats =
            serde_json::from_value(Value::Object(entry)).map_err(|e| bad(e.to_string()))?;
        stats.entry(card.name.clone()).or_insert(card);
    }
    Ok(stats)
}
