#![forbid(unsafe_code)]
//! mtgdata-core: pure data types shared by the I/O and card crates.
//!
//! - `record`: declarative record descriptors and schema derivation
//! - `schema`: storage-level schema (`DataType`, `Field`, `Schema`)
//! - `types`: lightweight columnar values (`Scalar`, `Column`, `RowBatch`)
//! - `dataset`: a named columnar table with its schema
//! - `config`: loader configuration (env-driven)
//!
//! No filesystem or network access lives here.

pub mod config;
pub mod dataset;
pub mod error;
pub mod hash;
pub mod prelude;
pub mod record;
pub mod schema;
pub mod types;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
