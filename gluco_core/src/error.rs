//! Error types for the gluco_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for gluco_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Simulation precondition violation
    #[error("Simulation error: {0}")]
    Simulation(String),

    /// Analysis precondition violation or numeric failure
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Transcript extraction error
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
