#![forbid(unsafe_code)]
//! mtgdata-cards: the card domain on top of `mtgdata-core` and `mtgdata-io`.
//!
//! Flow: `CardLoader::load` → cached `cards` dataset or `CardNormalizer`
//! (bulk archive → deduplicated `Card` rows) → optionally the cached
//! `cards_with_stats` dataset or `StatsJoiner` (per-printing stats from the
//! stats service, matched by name with split-card fallbacks) → the requested
//! output shape.

pub mod card;
pub mod error;
pub mod join;
pub mod loader;
pub mod normalize;
pub mod stats;

pub use card::{Card, CardStats, CardWithStats, StatLine};
pub use error::{Error, Result};
pub use join::{JoinPolicy, MatchKind, StatsJoiner};
pub use loader::{load_cards, CardLoader, LoadOptions, LoadOutput, OutputShape};
pub use normalize::CardNormalizer;
pub use stats::{StatsFetcher, StatsMap, StatsQuery};

/// Cache key of the normalized card dataset.
pub const CARDS_KEY: &str = "cards";

/// Cache key of the cards-joined-with-stats dataset.
pub const CARDS_WITH_STATS_KEY: &str = "cards_with_stats";
