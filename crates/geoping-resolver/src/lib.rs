//! Geoping Location Resolvers
//!
//! Implementations of the `LocationResolver` trait from `geoping-domain`.
//!
//! # Resolvers
//!
//! - `MockResolver`: Deterministic in-memory resolver for testing
//! - `PostcodesIoResolver`: UK postcode lookups against postcodes.io
//!
//! Both map their failures onto the domain's two-variant `ResolveError`
//! (`NotFound` or `Unavailable`), which is all the engine distinguishes.
//!
//! # Examples
//!
//! ```
//! use geoping_domain::Coordinate;
//! use geoping_domain::traits::LocationResolver;
//! use geoping_resolver::MockResolver;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let resolver = MockResolver::new();
//! resolver.add_location("SW1A 1AA", Coordinate::new(51.501, -0.1416).unwrap());
//!
//! let here = resolver.resolve("sw1a 1aa").await.unwrap();
//! assert_eq!(here.latitude, 51.501);
//! # }
//! ```

#![warn(missing_docs)]

pub mod postcodes;

use geoping_domain::episode::normalize_query;
use geoping_domain::traits::LocationResolver;
use geoping_domain::{Coordinate, ResolveError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub use postcodes::PostcodesIoResolver;

/// Errors that can occur while resolving a location
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The query has no known location
    #[error("Location not found: {0}")]
    NotFound(String),

    /// Network or upstream failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// The upstream answered with something unexpected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The resolver could not be constructed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ResolverError> for ResolveError {
    fn from(error: ResolverError) -> Self {
        match error {
            ResolverError::NotFound(_) => ResolveError::NotFound,
            other => ResolveError::Unavailable(other.to_string()),
        }
    }
}

/// Settings for the HTTP resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Base URL of the postcode API
    /// Default: https://api.postcodes.io
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    /// Default: 10
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per lookup for transient failures
    /// Default: 3
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    postcodes::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    postcodes::DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    postcodes::DEFAULT_MAX_RETRIES
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Mock resolver for deterministic testing
///
/// Queries are matched after normalization (case and whitespace are
/// ignored). Unknown queries resolve to `NotFound`. Clones share state.
///
/// # Examples
///
/// ```
/// use geoping_domain::{Coordinate, ResolveError};
/// use geoping_domain::traits::LocationResolver;
/// use geoping_resolver::MockResolver;
///
/// # #[tokio::main]
/// # async fn main() {
/// let resolver = MockResolver::new();
/// resolver.add_failure("EC1A 1BB", ResolveError::Unavailable("offline".into()));
///
/// assert!(matches!(resolver.resolve("EC1A 1BB").await, Err(ResolveError::Unavailable(_))));
/// assert_eq!(resolver.resolve("ZZ99 9ZZ").await, Err(ResolveError::NotFound));
/// assert_eq!(resolver.call_count(), 2);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockResolver {
    answers: Arc<Mutex<HashMap<String, Result<Coordinate, ResolveError>>>>,
    call_count: Arc<Mutex<usize>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockResolver {
    /// Create a resolver that knows no locations
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `query` to `coordinate`
    pub fn add_location(&self, query: &str, coordinate: Coordinate) {
        lock(&self.answers).insert(normalize_query(query), Ok(coordinate));
    }

    /// Make `query` fail with `error`
    pub fn add_failure(&self, query: &str, error: ResolveError) {
        lock(&self.answers).insert(normalize_query(query), Err(error));
    }

    /// Number of times resolve was called
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
    }
}

impl LocationResolver for MockResolver {
    async fn resolve(&self, query: &str) -> Result<Coordinate, ResolveError> {
        *lock(&self.call_count) += 1;
        lock(&self.answers)
            .get(&normalize_query(query))
            .cloned()
            .unwrap_or(Err(ResolveError::NotFound))
    }
}
