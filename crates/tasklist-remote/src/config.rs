//! Connection settings for the remote task collection.

use std::time::Duration;

use reqwest::Url;

use crate::error::GatewayError;

/// Default server used by the reference backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
/// Default collection resource path.
pub const DEFAULT_COLLECTION_PATH: &str = "/todoList";

/// Where the task collection lives and how to reach it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Scheme + authority (+ optional prefix), e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Collection path appended to the base URL, e.g. `/todoList`.
    pub collection_path: String,
    /// Per-request timeout. `None` keeps the transport default.
    pub timeout: Option<Duration>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_COLLECTION_PATH)
    }
}

impl GatewayConfig {
    /// Create a config for the given base URL and collection path.
    pub fn new(base_url: impl Into<String>, collection_path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            collection_path: collection_path.into(),
            timeout: None,
        }
    }

    /// Set a request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve and validate the absolute collection URL.
    ///
    /// # Errors
    /// Returns [`GatewayError::Config`] when the base URL is not an absolute
    /// http(s) URL or the collection path does not start with `/`.
    pub fn collection_url(&self) -> Result<Url, GatewayError> {
        if !self.collection_path.starts_with('/') {
            return Err(GatewayError::Config(format!(
                "collection path must start with '/': {}",
                self.collection_path
            )));
        }
        let joined = format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.collection_path.trim_end_matches('/')
        );
        let url = Url::parse(&joined).map_err(|err| GatewayError::Config(format!("invalid base URL {joined}: {err}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(GatewayError::Config(format!("unsupported URL scheme: {other}"))),
        }
    }
}
