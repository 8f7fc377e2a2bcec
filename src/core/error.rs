// Error handling for the race statistics engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Unknown statistic: {0}")]
    UnknownStatistic(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("Malformed race manifest: {0}")]
    Manifest(String),

    #[error("Race not found: {0}")]
    RaceNotFound(String),
}
