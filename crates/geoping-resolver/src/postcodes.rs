//! postcodes.io Resolver Implementation
//!
//! Resolves UK postcodes to coordinates through the public postcodes.io API
//! (`GET /postcodes/{postcode}`).
//!
//! # Features
//!
//! - Async HTTP communication via reqwest
//! - Configurable base URL (useful for self-hosted mirrors and tests)
//! - Retry with exponential backoff for transient failures only
//! - Timeout handling
//!
//! # Examples
//!
//! ```no_run
//! use geoping_resolver::PostcodesIoResolver;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = PostcodesIoResolver::default_endpoint()?;
//! let coordinate = resolver.lookup("SW1A 1AA").await?;
//! println!("{}", coordinate);
//! # Ok(())
//! # }
//! ```

use crate::{ResolverConfig, ResolverError};
use geoping_domain::traits::LocationResolver;
use geoping_domain::{Coordinate, ResolveError};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

/// Default postcodes.io endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.postcodes.io";

/// Default timeout for lookups (10 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the first retry; doubled on each further attempt
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// Doublings after which the retry delay stops growing (8 seconds)
const MAX_BACKOFF_DOUBLINGS: u32 = 5;

/// Delay after the given failed attempt (1-based)
fn backoff_delay(attempt: u32) -> Duration {
    INITIAL_BACKOFF * 2u32.pow(attempt.saturating_sub(1).min(MAX_BACKOFF_DOUBLINGS))
}

/// Postcode resolver backed by postcodes.io
pub struct PostcodesIoResolver {
    base_url: Url,
    client: reqwest::Client,
    max_retries: u32,
}

/// Response from the postcode lookup endpoint
#[derive(Deserialize)]
struct PostcodeLookupResponse {
    result: Option<PostcodeResult>,
}

#[derive(Deserialize)]
struct PostcodeResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Outcome of a single HTTP attempt
enum Attempt {
    Done(Result<Coordinate, ResolverError>),
    Retry(ResolverError),
}

impl PostcodesIoResolver {
    /// Create a resolver for the API at `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Config`] if the URL cannot be parsed or the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ResolverError> {
        Self::from_config(&ResolverConfig {
            base_url: base_url.to_string(),
            ..ResolverConfig::default()
        })
    }

    /// Create a resolver for the public postcodes.io API
    pub fn default_endpoint() -> Result<Self, ResolverError> {
        Self::new(DEFAULT_BASE_URL)
    }

    /// Create a resolver from configuration
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ResolverError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ResolverError::Config(format!("Invalid base URL '{}': {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ResolverError::Config(format!(
                "Base URL cannot have path segments: {}",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ResolverError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client,
            max_retries: config.max_retries.max(1),
        })
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    fn lookup_url(&self, postcode: &str) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected at construction
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("postcodes").push(postcode);
        }
        url
    }

    /// Look up a postcode
    ///
    /// # Errors
    ///
    /// - [`ResolverError::NotFound`] for empty input, HTTP 404, or a result
    ///   without coordinates
    /// - [`ResolverError::Communication`] when every attempt failed with a
    ///   network error, HTTP 429 or a server error
    /// - [`ResolverError::InvalidResponse`] for unparseable bodies or
    ///   out-of-range coordinates
    pub async fn lookup(&self, postcode: &str) -> Result<Coordinate, ResolverError> {
        let postcode = postcode.trim();
        if postcode.is_empty() {
            return Err(ResolverError::NotFound("empty postcode".to_string()));
        }

        let url = self.lookup_url(postcode);
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.attempt(url.clone(), postcode).await {
                Attempt::Done(result) => return result,
                Attempt::Retry(e) => {
                    tracing::debug!("Postcode lookup attempt {} failed: {}", attempts + 1, e);
                    last_error = Some(e);
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // 250ms, 500ms, 1s, ... capped at 8s
                tokio::time::sleep(backoff_delay(attempts)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ResolverError::Communication("Max retries exceeded".to_string())
        }))
    }

    async fn attempt(&self, url: Url, postcode: &str) -> Attempt {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return Attempt::Retry(ResolverError::Communication(format!(
                    "Request failed: {}",
                    e
                )))
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Attempt::Done(Err(ResolverError::NotFound(postcode.to_string())));
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Attempt::Retry(ResolverError::Communication(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Attempt::Done(Err(ResolverError::Communication(format!(
                "HTTP {}: {}",
                status, body
            ))));
        }

        let parsed = match response.json::<PostcodeLookupResponse>().await {
            Ok(parsed) => parsed,
            Err(e) => {
                return Attempt::Done(Err(ResolverError::InvalidResponse(format!(
                    "Failed to parse response: {}",
                    e
                ))))
            }
        };

        let result = coordinate_from(parsed, postcode);
        if let Ok(coordinate) = &result {
            tracing::debug!("Postcode {} resolved to {}", postcode, coordinate);
        }
        Attempt::Done(result)
    }
}

fn coordinate_from(
    response: PostcodeLookupResponse,
    postcode: &str,
) -> Result<Coordinate, ResolverError> {
    let Some(PostcodeResult {
        latitude: Some(latitude),
        longitude: Some(longitude),
    }) = response.result
    else {
        // Terminated or non-geographic postcodes come back without coordinates
        return Err(ResolverError::NotFound(postcode.to_string()));
    };

    Coordinate::new(latitude, longitude).map_err(ResolverError::InvalidResponse)
}

impl LocationResolver for PostcodesIoResolver {
    async fn resolve(&self, query: &str) -> Result<Coordinate, ResolveError> {
        self.lookup(query).await.map_err(ResolveError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_resolver_creation() {
        let resolver = PostcodesIoResolver::default_endpoint().unwrap();
        assert_eq!(resolver.base_url.as_str(), "https://api.postcodes.io/");
        assert_eq!(resolver.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_with_max_retries() {
        let resolver = PostcodesIoResolver::default_endpoint()
            .unwrap()
            .with_max_retries(5);
        assert_eq!(resolver.max_retries, 5);
        assert_eq!(resolver.with_max_retries(0).max_retries, 1);
    }

    #[test]
    fn test_backoff_delay_doubles_then_caps() {
        assert_eq!(backoff_delay(1), Duration::from_millis(250));
        assert_eq!(backoff_delay(2), Duration::from_millis(500));
        assert_eq!(backoff_delay(3), Duration::from_secs(1));
        assert_eq!(backoff_delay(6), Duration::from_secs(8));
        assert_eq!(backoff_delay(40), Duration::from_secs(8));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_secs(8));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            PostcodesIoResolver::new("not a url"),
            Err(ResolverError::Config(_))
        ));
        assert!(matches!(
            PostcodesIoResolver::new("mailto:someone@example.com"),
            Err(ResolverError::Config(_))
        ));
    }

    #[test]
    fn test_lookup_url_encodes_postcode() {
        let resolver = PostcodesIoResolver::new("http://localhost:1234/api/").unwrap();
        assert_eq!(
            resolver.lookup_url("SW1A 1AA").as_str(),
            "http://localhost:1234/api/postcodes/SW1A%201AA"
        );
        assert_eq!(
            resolver.lookup_url("a/b").as_str(),
            "http://localhost:1234/api/postcodes/a%2Fb"
        );
    }

    #[tokio::test]
    async fn test_lookup_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/postcodes/SW1A%201AA"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "result": { "postcode": "SW1A 1AA", "latitude": 51.501009, "longitude": -0.141588 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = PostcodesIoResolver::new(&server.uri()).unwrap();
        let coordinate = resolver.resolve(" SW1A 1AA ").await.unwrap();

        assert_eq!(coordinate, Coordinate::new_unchecked(51.501009, -0.141588));
    }

    #[tokio::test]
    async fn test_lookup_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": 404,
                "error": "Postcode not found"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = PostcodesIoResolver::new(&server.uri()).unwrap();

        assert_eq!(resolver.resolve("ZZ99 9ZZ").await, Err(ResolveError::NotFound));
    }

    #[tokio::test]
    async fn test_lookup_without_coordinates_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "result": { "postcode": "GY1 1AA", "latitude": null, "longitude": null }
            })))
            .mount(&server)
            .await;

        let resolver = PostcodesIoResolver::new(&server.uri()).unwrap();

        assert!(matches!(
            resolver.lookup("GY1 1AA").await,
            Err(ResolverError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_server_error_retried_then_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let resolver = PostcodesIoResolver::new(&server.uri())
            .unwrap()
            .with_max_retries(2);

        assert!(matches!(
            resolver.resolve("SW1A 1AA").await,
            Err(ResolveError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let resolver = PostcodesIoResolver::new(&server.uri()).unwrap();

        assert!(matches!(
            resolver.lookup("SW1A 1AA").await,
            Err(ResolverError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_postcode_not_sent() {
        let resolver = PostcodesIoResolver::new("http://localhost:9").unwrap();
        assert!(matches!(
            resolver.lookup("   ").await,
            Err(ResolverError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_error_is_unavailable() {
        // Nothing listens on the discard port
        let resolver = PostcodesIoResolver::new("http://127.0.0.1:9")
            .unwrap()
            .with_max_retries(1);

        assert!(matches!(
            resolver.resolve("SW1A 1AA").await,
            Err(ResolveError::Unavailable(_))
        ));
    }

    // Integration test (requires network access)
    #[tokio::test]
    #[ignore]
    async fn test_postcodes_io_integration() {
        let resolver = PostcodesIoResolver::default_endpoint().unwrap();
        let coordinate = resolver.lookup("SW1A 1AA").await.unwrap();
        assert!((coordinate.latitude - 51.501).abs() < 0.01);
    }
}
