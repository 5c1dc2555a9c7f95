//! Convenient re-exports for downstream crates.

pub use crate::config::{LoaderConfig, StorageConfig};
pub use crate::dataset::Dataset;
pub use crate::error::{Error, Result};
pub use crate::hash::Hash256;
pub use crate::record::{FieldDesc, Kind, Record, RecordDesc};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{Column, RowBatch, Scalar};
