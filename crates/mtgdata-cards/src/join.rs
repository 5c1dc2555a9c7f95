//! Joining normalized cards with per-printing stats.
//!
//! A card matches a stats entry by exact name first. Split cards are then
//! retried by their front face (`"Fire // Ice"` → `"Fire"`) and finally by
//! the service's triple-slash spelling (`"Fire /// Ice"`). Cards from
//! printings the service does not cover, excluded names (basic lands) and
//! rebalanced variants are dropped, as are cards with no match.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use mtgdata_core::config::LoaderConfig;
use mtgdata_core::dataset::Dataset;
use mtgdata_io::cache::CacheStore;

use crate::card::{Card, CardStats, CardWithStats};
use crate::error::Result;
use crate::stats::{StatsFetcher, StatsMap};
use crate::CARDS_WITH_STATS_KEY;

const SPLIT: &str = " // ";
const TRIPLE_SPLIT: &str = " /// ";

/// Which lookup produced a stats match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Direct,
    FrontFace,
    TripleSlash,
}

/// Find the stats entry for `name`, trying the split-card fallbacks in order.
pub fn match_stats<'a>(stats: &'a StatsMap, name: &str) -> Option<(&'a CardStats, MatchKind)> {
    if let Some(s) = stats.get(name) {
        return Some((s, MatchKind::Direct));
    }
    if !name.contains(SPLIT) {
        return None;
    }
    if let Some((front, _)) = name.split_once(SPLIT) {
        if let Some(s) = stats.get(front) {
            return Some((s, MatchKind::FrontFace));
        }
    }
    stats
        .get(&name.replace(SPLIT, TRIPLE_SPLIT))
        .map(|s| (s, MatchKind::TripleSlash))
}

/// Which cards take part in the join.
#[derive(Debug, Clone)]
pub struct JoinPolicy {
    pub format: String,
    pub excluded_names: HashSet<String>,
    pub variant_prefix: String,
}

impl JoinPolicy {
    pub fn from_config(cfg: &LoaderConfig) -> Self {
        Self {
            format: cfg.stats_format.clone(),
            excluded_names: cfg.excluded_names.iter().cloned().collect(),
            variant_prefix: cfg.variant_prefix.clone(),
        }
    }

    pub fn admits(&self, card: &Card) -> bool {
        !self.excluded_names.contains(&card.name)
            && (self.variant_prefix.is_empty() || !card.name.starts_with(&self.variant_prefix))
    }
}

pub struct StatsJoiner {
    fetcher: StatsFetcher,
    cache: CacheStore,
    policy: JoinPolicy,
}

impl StatsJoiner {
    pub fn new(fetcher: StatsFetcher, cache: CacheStore, policy: JoinPolicy) -> Self {
        Self {
            fetcher,
            cache,
            policy,
        }
    }

    pub fn fetcher_mut(&mut self) -> &mut StatsFetcher {
        &mut self.fetcher
    }

    /// Join every eligible card of `cards` with its stats and persist the
    /// result under `cards_with_stats`. Row order follows `cards`.
    pub fn join(&mut self, cards: &Dataset) -> Result<Dataset> {
        let cards: Vec<Card> = cards.to_records()?;
        let total = cards.len();
        let mut joined = Vec::new();
        let mut unmatched = 0usize;

        for card in cards {
            if !self.policy.admits(&card) || !self.fetcher.supports(&card.printing) {
                continue;
            }
            let Some(stats) = self.fetcher.fetch_stats(&card.printing, &self.policy.format)? else {
                continue;
            };
            match match_stats(&stats, &card.name) {
                Some((entry, kind)) => {
                    if kind != MatchKind::Direct {
                        debug!(card = %card.name, stats = %entry.name, ?kind, "split-card match");
                    }
                    joined.push(CardWithStats::new(card, entry));
                }
                None => {
                    unmatched += 1;
                    warn!(card = %card.name, printing = %card.printing, "no stats entry; dropping card");
                }
            }
        }

        let dataset = Dataset::from_records(&joined)?;
        info!(cards = total, joined = joined.len(), unmatched, "joined stats");
        if let Err(e) = self.cache.write(CARDS_WITH_STATS_KEY, &dataset) {
            warn!(error = %e, "failed to cache joined stats");
        }
        Ok(dataset)
    }
}
