use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("malformed card archive: {0}")]
    Archive(String),

    #[error("card {index} of printing '{printing}' is malformed: {reason}")]
    Record {
        printing: String,
        index: usize,
        reason: String,
    },

    #[error("stats service returned no cards for printing '{printing}' ({format})")]
    EmptyStats { printing: String, format: String },

    #[error("malformed stats response for printing '{printing}': {reason}")]
    StatsResponse { printing: String, reason: String },

    #[error(transparent)]
    Io(#[from] mtgdata_io::Error),

    #[error(transparent)]
    Core(#[from] mtgdata_core::error::Error),
}
