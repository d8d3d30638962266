//! Error types for farmsight

use thiserror::Error;

/// Main error type for farmsight
#[derive(Error, Debug)]
pub enum FarmsightError {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Feature error: {0}")]
    FeatureError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Scoring error: {0}")]
    ScoringError(String),

    #[error("Ranking error: {0}")]
    RankingError(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Result type alias for farmsight operations
pub type Result<T> = std::result::Result<T, FarmsightError>;
