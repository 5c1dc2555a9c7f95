//! mtgdata: a cached, normalized Magic: The Gathering card database with
//! optional per-printing play statistics.
//!
//! ```no_run
//! use mtgdata::{load_cards, LoadOptions};
//!
//! let cards = load_cards(&LoadOptions::objects().with_stats())?
//!     .into_cards_with_stats()
//!     .unwrap_or_default();
//! for card in cards.iter().take(3) {
//!     println!("{card}: win rate {:?}", card.line.win_rate);
//! }
//! # Ok::<(), mtgdata::Error>(())
//! ```

pub use mtgdata_cards::{
    load_cards, Card, CardLoader, CardStats, CardWithStats, Error, LoadOptions, LoadOutput,
    OutputShape, Result, StatLine, CARDS_KEY, CARDS_WITH_STATS_KEY,
};
pub use mtgdata_core::config::LoaderConfig;
pub use mtgdata_core::dataset::Dataset;
pub use mtgdata_core::record::Record;
pub use mtgdata_core::schema::Schema;

pub use arrow_array::RecordBatch;

pub use mtgdata_cards as cards;
pub use mtgdata_core as model;
pub use mtgdata_io as io;
