//! Unified error type for the challenge tracker.
//!
//! Validation failures (incomplete selections, locked days) are not errors: those
//! operations return `false`. This type covers the failures callers have to handle.

use thiserror::Error;

/// Errors surfaced by configuration loading, the record store and week navigation.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Record store failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The referenced cohort does not exist
    #[error("Cohort not found: {id}")]
    CohortNotFound {
        /// Cohort identifier that was looked up
        id: String,
    },

    /// Navigation to a meal week the user may not open yet.
    /// The message is meant to be shown to the user as-is.
    #[error("{message}")]
    WeekNotAccessible {
        /// Week the user tried to open
        week: u32,
        /// User-facing explanation
        message: String,
    },

    /// A stored row holds a value the domain cannot represent
    #[error("Invalid record: {message}")]
    InvalidRecord {
        /// What was wrong with the row
        message: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
