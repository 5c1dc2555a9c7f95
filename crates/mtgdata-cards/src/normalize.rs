//! Bulk archive → normalized `cards` dataset.

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use mtgdata_core::dataset::Dataset;
use mtgdata_io::archive::extract_json;
use mtgdata_io::cache::CacheStore;
use mtgdata_io::download::DownloadCache;

use crate::card::Card;
use crate::error::{Error, Result};
use crate::CARDS_KEY;

#[derive(Deserialize)]
struct RawArchive {
    data: BTreeMap<String, RawPrinting>,
}

#[derive(Deserialize)]
struct RawPrinting {
    cards: Vec<Map<String, Value>>,
}

pub struct CardNormalizer {
    downloads: DownloadCache,
    cache: CacheStore,
    url: String,
}

impl CardNormalizer {
    pub fn new(downloads: DownloadCache, cache: CacheStore, url: impl Into<String>) -> Self {
        Self {
            downloads,
            cache,
            url: url.into(),
        }
    }

    /// Download (or reuse) the bulk archive, normalize it and persist the
    /// result under `cards`.
    pub fn process_raw_cards(&self, refresh: bool) -> Result<Dataset> {
        let body = self.downloads.get(&self.url, refresh)?;
        let json = extract_json(body)?;
        let cards = parse_archive(&json)?;
        let dataset = Dataset::from_records(&cards)?;
        info!(cards = dataset.num_rows(), "normalized card archive");
        if let Err(e) = self.cache.write(CARDS_KEY, &dataset) {
            warn!(error = %e, "failed to cache normalized cards");
        }
        Ok(dataset)
    }
}

/// Flatten every printing's card list into `Card`s, dropping repeated
/// `(name, printing)` pairs. Printings are visited in code order.
pub fn parse_archive(json: &[u8]) -> Result<Vec<Card>> {
    let archive: RawArchive =
        serde_json::from_slice(json).map_err(|e| Error::Archive(e.to_string()))?;

    let printings = archive.data.len();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut cards = Vec::new();
    for (code, printing) in archive.data {
        let before = cards.len();
        for (index, raw) in printing.cards.into_iter().enumerate() {
            let card = Card::from_raw(raw, &code).map_err(|e| match e {
                Error::Record {
                    printing, reason, ..
                } => Error::Record {
                    printing,
                    index,
                    reason,
                },
                other => other,
            })?;
            if seen.insert((card.name.clone(), card.printing.clone())) {
                cards.push(card);
            }
        }
        debug!(printing = %code, cards = cards.len() - before, "normalized printing");
    }
    info!(printings, cards = cards.len(), "parsed card archive");
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCHIVE: &str = r#"{
        "meta": {"version": "5.2.2"},
        "data": {
            "VOW": {"name": "Innistrad: Crimson Vow", "cards": [
                {"name": "Opt", "manaCost": "{U}", "manaValue": 1.0, "types": ["Instant"]},
                {"name": "Opt", "manaCost": "{U}", "manaValue": 1.0, "types": ["Instant"]},
                {"name": "Island", "types": ["Land"], "supertypes": ["Basic"]}
            ]},
            "MH2": {"cards": [
                {"name": "Opt", "manaCost": "{U}", "manaValue": 1}
            ]}
        }
    }"#;

    #[test]
    fn test_parse_dedups_per_printing() {
        let cards = parse_archive(ARCHIVE.as_bytes()).unwrap();
        let keys: Vec<(&str, &str)> = cards
            .iter()
            .map(|c| (c.name.as_str(), c.printing.as_str()))
            .collect();
        assert_eq!(keys, vec![("Opt", "MH2"), ("Opt", "VOW"), ("Island", "VOW")]);
        assert_eq!(cards[0].mana_value, Some(1));
        assert_eq!(cards[2].mana_cost, "");
    }

    #[test]
    fn test_missing_data_is_an_archive_error() {
        assert!(matches!(
            parse_archive(b"{\"meta\": {}}"),
            Err(Error::Archive(_))
        ));
        assert!(matches!(parse_archive(b"not json"), Err(Error::Archive(_))));
    }

    #[test]
    fn test_malformed_card_reports_its_position() {
        let json = r#"{"data": {"VOW": {"cards": [{"name": "Opt"}, {"name": ["bad"]}]}}}"#;
        match parse_archive(json.as_bytes()) {
            Err(Error::Record {
                printing, index, ..
            }) => {
                assert_eq!(printing, "VOW");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
