use thiserror::Error;

/// Result type local to mtgdata-io.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("unsupported codec: {0}")]
    CodecUnsupported(&'static str),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("fetch of {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("frame conversion error: {0}")]
    Frame(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] mtgdata_core::error::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
