//! chucknorris.io API client

pub mod error;
pub mod joke;

pub use error::LookupError;
pub use joke::JokeRecord;

use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://api.chucknorris.io";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Settings used to build the shared HTTP client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub max_response_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

/// Shared, cheaply cloneable API client. One is built per provider session
/// and borrowed by every lookup.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    max_response_bytes: usize,
}

impl Client {
    pub fn new(config: &ClientConfig) -> Result<Self, LookupError> {
        let endpoint = &config.endpoint;
        let base_url = Url::parse(endpoint)
            .map_err(|e| LookupError::Configuration(format!("invalid endpoint {:?}: {}", endpoint, e)))?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(LookupError::Configuration(format!(
                "endpoint must be an http(s) URL, got {:?}",
                endpoint
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(
                "terraform-provider-chucknorris/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| LookupError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: config.timeout,
                max_response_bytes: config.max_response_bytes,
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn max_response_bytes(&self) -> usize {
        self.inner.max_response_bytes
    }

    /// Build `<endpoint>/<segments...>`, percent-encoding each segment
    pub(crate) fn url_for(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        // base_url was checked to be a base URL in new
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET `url` and return the body, failing on any status other than 200
    /// and on bodies larger than the configured limit.
    pub(crate) async fn get_bounded(&self, url: Url) -> Result<Vec<u8>, LookupError> {
        tracing::debug!(%url, "GET request");

        let mut response = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .map_err(LookupError::Transport)?;

        let status = response.status();
        tracing::debug!(%status, "response status");

        if status != StatusCode::OK {
            return Err(LookupError::UpstreamStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let limit = self.inner.max_response_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(LookupError::ResponseTooLarge { limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(LookupError::Transport)? {
            if body.len() + chunk.len() > limit {
                return Err(LookupError::ResponseTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_public_api() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, "https://api.chucknorris.io");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_response_bytes, 1024 * 1024);

        let client = Client::new(&config).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(30));
        assert_eq!(client.max_response_bytes(), 1024 * 1024);
    }

    #[test]
    fn client_rejects_invalid_endpoints() {
        for endpoint in ["not a url", "mailto:chuck@example.com", "ftp://example.com"] {
            let config = ClientConfig {
                endpoint: endpoint.to_string(),
                ..ClientConfig::default()
            };
            let result = Client::new(&config);
            assert!(
                matches!(result, Err(LookupError::Configuration(_))),
                "endpoint {:?} should be rejected",
                endpoint
            );
        }
    }

    #[test]
    fn url_segments_are_escaped_and_appended() {
        let client = Client::new(&ClientConfig::default()).unwrap();
        let url = client.url_for(&["jokes", "a b/c?d#e%"]);
        assert_eq!(
            url.as_str(),
            "https://api.chucknorris.io/jokes/a%20b%2Fc%3Fd%23e%25"
        );
    }

    #[test]
    fn url_keeps_endpoint_path_prefix() {
        for endpoint in ["http://localhost:8080/api", "http://localhost:8080/api/"] {
            let config = ClientConfig {
                endpoint: endpoint.to_string(),
                ..ClientConfig::default()
            };
            let client = Client::new(&config).unwrap();
            assert_eq!(
                client.url_for(&["jokes", "abc123"]).as_str(),
                "http://localhost:8080/api/jokes/abc123"
            );
        }
    }
}
