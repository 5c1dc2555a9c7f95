//! Loader configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

pub const DEFAULT_CARDS_URL: &str = "https://mtgjson.com/api/v5/AllPrintings.json.zip";
pub const DEFAULT_STATS_URL: &str = "https://www.17lands.com/card_ratings/data";
pub const DEFAULT_STATS_FORMAT: &str = "PremierDraft";

/// Printings the stats service is known to cover.
pub const DEFAULT_STATS_PRINTINGS: &[&str] = &[
    "KLR", "AKR", "ZNR", "KHM", "STX", "AFR", "MID", "VOW", "NEO", "SNC", "DMU", "BRO", "ONE",
    "MOM", "WOE", "LCI", "MKM", "OTJ", "BLB", "DSK",
];

/// The five basic lands; players do not rate them individually.
pub const BASIC_LANDS: &[&str] = &["Plains", "Island", "Swamp", "Mountain", "Forest"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Local directory holding cached datasets and raw downloads.
    pub cache_dir: String,

    /// Optional fully-qualified cache URI (`file:///...` or `memory://`).
    pub cache_uri: Option<String>,

    /// Codec for cached dataset segments: `none`, `zstd` or `lz4`.
    pub cache_codec: String,

    /// Bulk card archive location (JSON, optionally zip-compressed).
    pub cards_url: String,

    /// Stats service endpoint; queried with `expansion` and `format` params.
    pub stats_url: String,
    pub stats_format: String,
    pub stats_printings: Vec<String>,

    /// How many (printing, format) stats maps stay memoized in process.
    pub stats_cache_capacity: usize,

    /// Card names never joined against stats.
    pub excluded_names: Vec<String>,

    /// Name prefix marking rebalanced/alternate variants of a card.
    pub variant_prefix: String,

    /// Optional seed for deterministic shuffles.
    pub seed: Option<u64>,

    pub http_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir()
                .join("mtgdata-cache")
                .to_string_lossy()
                .into_owned(),
            cache_uri: None,
            cache_codec: "none".to_string(),
            cards_url: DEFAULT_CARDS_URL.to_string(),
            stats_url: DEFAULT_STATS_URL.to_string(),
            stats_format: DEFAULT_STATS_FORMAT.to_string(),
            stats_printings: DEFAULT_STATS_PRINTINGS.iter().map(|s| s.to_string()).collect(),
            stats_cache_capacity: 128,
            excluded_names: BASIC_LANDS.iter().map(|s| s.to_string()).collect(),
            variant_prefix: "A-".to_string(),
            seed: None,
            http_timeout_secs: 300,
            user_agent: concat!("mtgdata/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub uri: Option<String>,
    pub root: String,
}

impl StorageConfig {
    /// URI scheme, or `None` for a bare path (no `://`).
    pub fn scheme(&self) -> Option<&str> {
        self.uri.as_deref().and_then(uri_scheme)
    }
}

impl LoaderConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `MTGDATA_CACHE_DIR`: local cache directory
    /// - `MTGDATA_CACHE_URI`: cache URI (`file://`, `memory://`)
    /// - `MTGDATA_CACHE_CODEC`: segment codec
    /// - `MTGDATA_CARDS_URL`: bulk archive URL
    /// - `MTGDATA_STATS_URL`: stats endpoint
    /// - `MTGDATA_STATS_FORMAT`: stats format (e.g. `PremierDraft`)
    /// - `MTGDATA_STATS_PRINTINGS`: comma-separated supported printings
    /// - `MTGDATA_STATS_CACHE_CAPACITY`: memoized stats maps
    /// - `MTGDATA_SEED`: shuffle seed
    /// - `MTGDATA_HTTP_TIMEOUT_SECS`: remote fetch timeout
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("MTGDATA_CACHE_DIR") {
            cfg.cache_dir = s;
        }

        if let Ok(s) = std::env::var("MTGDATA_CACHE_URI") {
            cfg.cache_uri = Some(s);
        }

        if let Ok(s) = std::env::var("MTGDATA_CACHE_CODEC") {
            cfg.cache_codec = s.trim().to_ascii_lowercase();
        }

        if let Ok(s) = std::env::var("MTGDATA_CARDS_URL") {
            cfg.cards_url = s;
        }

        if let Ok(s) = std::env::var("MTGDATA_STATS_URL") {
            cfg.stats_url = s;
        }

        if let Ok(s) = std::env::var("MTGDATA_STATS_FORMAT") {
            cfg.stats_format = s;
        }

        if let Ok(s) = std::env::var("MTGDATA_STATS_PRINTINGS") {
            cfg.stats_printings = parse_list(&s);
        }

        if let Ok(s) = std::env::var("MTGDATA_STATS_CACHE_CAPACITY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.stats_cache_capacity = v;
            }
        }

        if let Ok(s) = std::env::var("MTGDATA_SEED") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.seed = Some(v);
            }
        }

        if let Ok(s) = std::env::var("MTGDATA_HTTP_TIMEOUT_SECS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.http_timeout_secs = v;
            }
        }

        cfg
    }

    /// Produce a storage configuration snapshot used by the IO layer.
    pub fn storage_config(&self) -> StorageConfig {
        let uri = self.cache_uri.as_deref();
        let root = match (uri.and_then(uri_scheme), uri) {
            (Some("file"), Some(uri)) => {
                file_uri_to_path(uri).unwrap_or_else(|| self.cache_dir.clone())
            }
            (Some("memory"), Some(_)) => "mem".to_string(),
            (None, Some(path)) if !path.trim().is_empty() => {
                path.trim().trim_end_matches('/').to_string()
            }
            _ => self.cache_dir.trim_end_matches('/').to_string(),
        };

        StorageConfig {
            uri: self.cache_uri.clone(),
            root,
        }
    }
}

fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect()
}

fn uri_scheme(uri: &str) -> Option<&str> {
    uri.split_once("://")
        .map(|(scheme, _)| scheme.trim())
        .filter(|s| !s.is_empty())
}

fn file_uri_to_path(uri: &str) -> Option<String> {
    let stripped = uri.strip_prefix("file://")?;
    if stripped.starts_with('/') {
        Some(stripped.trim_end_matches('/').to_string())
    } else {
        Some(format!("/{}", stripped.trim_end_matches('/')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = LoaderConfig::default();
        assert_eq!(cfg.stats_format, "PremierDraft");
        assert!(cfg.stats_printings.iter().any(|p| p == "VOW"));
        assert!(!cfg.stats_printings.iter().any(|p| p == "LEA"));
        assert_eq!(cfg.excluded_names.len(), 5);
        assert_eq!(cfg.stats_cache_capacity, 128);
    }

    #[test]
    fn test_storage_config_from_file_uri() {
        let cfg = LoaderConfig {
            cache_uri: Some("file:///var/cache/mtgdata/".into()),
            ..Default::default()
        };
        let sc = cfg.storage_config();
        assert_eq!(sc.scheme(), Some("file"));
        assert_eq!(sc.root, "/var/cache/mtgdata");
    }

    #[test]
    fn test_storage_config_bare_dir() {
        let cfg = LoaderConfig {
            cache_dir: "/tmp/cards/".into(),
            ..Default::default()
        };
        let sc = cfg.storage_config();
        assert_eq!(sc.scheme(), None);
        assert_eq!(sc.root, "/tmp/cards");
    }

    #[test]
    fn test_storage_config_bare_path_uri() {
        let cfg = LoaderConfig {
            cache_uri: Some("/srv/mtgdata/cache/".into()),
            ..Default::default()
        };
        let sc = cfg.storage_config();
        assert_eq!(sc.scheme(), None);
        assert_eq!(sc.root, "/srv/mtgdata/cache");

        let relative = LoaderConfig {
            cache_uri: Some("cache".into()),
            ..Default::default()
        };
        assert_eq!(relative.storage_config().scheme(), None);
        assert_eq!(relative.storage_config().root, "cache");
    }

    #[test]
    fn test_uri_scheme_requires_separator() {
        assert_eq!(uri_scheme("file:///tmp"), Some("file"));
        assert_eq!(uri_scheme("memory://"), Some("memory"));
        assert_eq!(uri_scheme("/tmp/cache"), None);
        assert_eq!(uri_scheme("://x"), None);
    }

    #[test]
    fn test_parse_list_skips_blanks() {
        assert_eq!(parse_list(" VOW, MID,,NEO "), vec!["VOW", "MID", "NEO"]);
    }
}
