//! Error types for the CLI application.

use geoping_domain::ResolveError;
use geoping_engine::EngineError;
use geoping_resolver::ResolverError;
use geoping_store::StoreError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reminder storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Resolver could not be set up
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// A postcode could not be resolved
    #[error("Could not resolve '{query}': {source}")]
    Resolve {
        /// The query that failed
        query: String,
        /// Why it failed
        source: ResolveError,
    },

    /// Engine worker error
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
