//! Error types for the stretch_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for stretch_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No routine with the requested id exists in the catalog
    #[error("Routine not found: {0}")]
    RoutineNotFound(String),

    /// The routine resolved but has nothing to play
    #[error("Invalid routine '{0}': routine has no exercises")]
    InvalidRoutine(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),
}
