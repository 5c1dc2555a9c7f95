//! Public entry point: cached card loading in one of three output shapes.

use std::sync::Arc;
use std::time::Duration;

use arrow_array::RecordBatch;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use mtgdata_core::config::LoaderConfig;
use mtgdata_core::dataset::Dataset;
use mtgdata_core::record::Record;
use mtgdata_core::schema::Schema;
use mtgdata_io::cache::CacheStore;
use mtgdata_io::codec::Codec;
use mtgdata_io::download::DownloadCache;
use mtgdata_io::fetch::{Fetcher, HttpFetcher};
use mtgdata_io::frame::to_record_batch;
use mtgdata_io::storage::{build_storage_from_config, Storage};

use crate::card::{Card, CardWithStats};
use crate::error::{Error, Result};
use crate::join::{JoinPolicy, StatsJoiner};
use crate::normalize::CardNormalizer;
use crate::stats::StatsFetcher;
use crate::{CARDS_KEY, CARDS_WITH_STATS_KEY};

/// What to load and in which shape. At most one of `as_dataset`,
/// `as_objects` and `as_dataframe` may be set; none means a dataset.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub as_dataset: bool,
    pub as_objects: bool,
    pub as_dataframe: bool,
    pub with_stats: bool,
    /// Re-download and re-normalize the card archive. With `with_stats`
    /// a cached `cards_with_stats` join is still served unless
    /// `refresh_stats` is also set.
    pub refresh_cards: bool,
    pub refresh_stats: bool,
    pub shuffle: bool,
    /// Shuffle seed; falls back to the loader's configured seed.
    pub seed: Option<u64>,
}

impl LoadOptions {
    pub fn dataset() -> Self {
        Self {
            as_dataset: true,
            ..Self::default()
        }
    }

    pub fn objects() -> Self {
        Self {
            as_objects: true,
            ..Self::default()
        }
    }

    pub fn dataframe() -> Self {
        Self {
            as_dataframe: true,
            ..Self::default()
        }
    }

    pub fn with_stats(mut self) -> Self {
        self.with_stats = true;
        self
    }

    /// See [`LoadOptions::refresh_cards`]; pair with `refresh_stats` to
    /// rebuild the join from the refreshed cards.
    pub fn refresh_cards(mut self) -> Self {
        self.refresh_cards = true;
        self
    }

    pub fn refresh_stats(mut self) -> Self {
        self.refresh_stats = true;
        self
    }

    pub fn shuffled(mut self, seed: Option<u64>) -> Self {
        self.shuffle = true;
        self.seed = seed;
        self
    }

    pub fn shape(&self) -> Result<OutputShape> {
        match (self.as_dataset, self.as_objects, self.as_dataframe) {
            (true, false, false) => Ok(OutputShape::Dataset),
            (false, true, false) => Ok(OutputShape::Objects),
            (false, false, true) => Ok(OutputShape::Frame),
            (false, false, false) => Ok(OutputShape::Dataset),
            _ => Err(Error::InvalidArguments(
                "as_dataset, as_objects and as_dataframe are mutually exclusive".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    Dataset,
    Objects,
    Frame,
}

#[derive(Debug)]
pub enum LoadOutput {
    Dataset(Dataset),
    Cards(Vec<Card>),
    CardsWithStats(Vec<CardWithStats>),
    Frame(RecordBatch),
}

impl LoadOutput {
    pub fn len(&self) -> usize {
        match self {
            LoadOutput::Dataset(ds) => ds.num_rows(),
            LoadOutput::Cards(cards) => cards.len(),
            LoadOutput::CardsWithStats(cards) => cards.len(),
            LoadOutput::Frame(rb) => rb.num_rows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_dataset(self) -> Option<Dataset> {
        match self {
            LoadOutput::Dataset(ds) => Some(ds),
            _ => None,
        }
    }

    pub fn into_cards(self) -> Option<Vec<Card>> {
        match self {
            LoadOutput::Cards(cards) => Some(cards),
            _ => None,
        }
    }

    pub fn into_cards_with_stats(self) -> Option<Vec<CardWithStats>> {
        match self {
            LoadOutput::CardsWithStats(cards) => Some(cards),
            _ => None,
        }
    }

    pub fn into_frame(self) -> Option<RecordBatch> {
        match self {
            LoadOutput::Frame(rb) => Some(rb),
            _ => None,
        }
    }
}

pub struct CardLoader {
    cache: CacheStore,
    normalizer: CardNormalizer,
    joiner: StatsJoiner,
    seed: Option<u64>,
}

impl CardLoader {
    /// Loader over the configured cache location and a real HTTP client.
    pub fn new(cfg: LoaderConfig) -> Result<Self> {
        let storage = build_storage_from_config(&cfg.storage_config())?;
        let fetcher = HttpFetcher::new(&cfg.user_agent, Duration::from_secs(cfg.http_timeout_secs))?;
        Self::with_backends(cfg, storage, Arc::new(fetcher))
    }

    pub fn with_backends(
        cfg: LoaderConfig,
        storage: Arc<dyn Storage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let root = cfg.storage_config().root;
        let codec = Codec::from_name(&cfg.cache_codec)?;
        let cache = CacheStore::new(Arc::clone(&storage), root.clone(), codec);
        let downloads = DownloadCache::new(storage, fetcher, &root);
        debug!(root = %root, codec = ?codec, "card loader ready");

        let normalizer = CardNormalizer::new(downloads.clone(), cache.clone(), cfg.cards_url.clone());
        let policy = JoinPolicy::from_config(&cfg);
        let stats = StatsFetcher::new(
            downloads,
            cfg.stats_url,
            cfg.stats_printings,
            cfg.stats_cache_capacity,
        );
        Ok(Self {
            joiner: StatsJoiner::new(stats, cache.clone(), policy),
            cache,
            normalizer,
            seed: cfg.seed,
        })
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn load(&mut self, opts: &LoadOptions) -> Result<LoadOutput> {
        let shape = opts.shape()?;

        let cards = if opts.refresh_cards {
            self.normalizer.process_raw_cards(true)?
        } else {
            match self.cached(CARDS_KEY, &Card::schema()?) {
                Some(ds) => ds,
                None => self.normalizer.process_raw_cards(false)?,
            }
        };

        let mut dataset = if opts.with_stats {
            let cached = if opts.refresh_stats {
                self.joiner.fetcher_mut().invalidate();
                None
            } else {
                self.cached(CARDS_WITH_STATS_KEY, &CardWithStats::schema()?)
            };
            match cached {
                Some(ds) => ds,
                None => self.joiner.join(&cards)?,
            }
        } else {
            cards
        };

        if opts.shuffle {
            dataset = shuffle(&dataset, opts.seed.or(self.seed))?;
        }
        info!(rows = dataset.num_rows(), with_stats = opts.with_stats, ?shape, "loaded cards");

        Ok(match shape {
            OutputShape::Dataset => LoadOutput::Dataset(dataset),
            OutputShape::Objects if opts.with_stats => {
                LoadOutput::CardsWithStats(dataset.to_records()?)
            }
            OutputShape::Objects => LoadOutput::Cards(dataset.to_records()?),
            OutputShape::Frame => LoadOutput::Frame(to_record_batch(&dataset)?),
        })
    }

    /// Cached dataset under `key` if present, readable and shaped like
    /// `expected`.
    fn cached(&self, key: &str, expected: &Schema) -> Option<Dataset> {
        let ds = self.cache.read(key)?;
        if &ds.schema != expected {
            let fingerprint = |s: &Schema| s.fingerprint().map(|h| h.short(12)).unwrap_or_default();
            warn!(
                key,
                cached = %fingerprint(&ds.schema),
                expected = %fingerprint(expected),
                "cached dataset has a stale schema; rebuilding"
            );
            return None;
        }
        Some(ds)
    }
}

fn shuffle(dataset: &Dataset, seed: Option<u64>) -> Result<Dataset> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut order: Vec<usize> = (0..dataset.num_rows()).collect();
    order.shuffle(&mut rng);
    Ok(dataset.take(&order)?)
}

/// Load cards with a loader configured from the environment.
pub fn load_cards(opts: &LoadOptions) -> Result<LoadOutput> {
    CardLoader::new(LoaderConfig::from_env())?.load(opts)
}
