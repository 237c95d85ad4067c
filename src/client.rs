//! HTTP client for the custom resource API.
//!
//! Every call is a single authenticated JSON request: no retries, no backoff.
//! Unexpected statuses surface as [`ProviderError::Api`] carrying the raw
//! response body.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::types::{Resource, ResourceSpec};

/// Fixed per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum length of a response body written to the logs.
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Operations the lifecycle adapter needs from the backend.
#[async_trait::async_trait]
pub trait ResourceApi: Send + Sync {
    /// Create a resource; the backend assigns its id and timestamps.
    async fn create(&self, spec: &ResourceSpec) -> Result<Resource, ProviderError>;

    /// Fetch a resource by id. `None` means the backend does not know it.
    async fn read(&self, id: &str) -> Result<Option<Resource>, ProviderError>;

    /// Replace the caller-supplied attributes of an existing resource.
    async fn update(&self, id: &str, spec: &ResourceSpec) -> Result<Resource, ProviderError>;

    /// Delete a resource by id.
    async fn delete(&self, id: &str) -> Result<(), ProviderError>;
}

/// Update bodies carry the id alongside the `ResourceSpec` fields.
#[derive(Serialize)]
struct UpdateBody<'a> {
    id: &'a str,
    #[serde(flatten)]
    spec: &'a ResourceSpec,
}

/// Client for the `/resources` REST endpoints.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl ApiClient {
    /// Create a client for the given base URL and API key.
    ///
    /// Fails with [`ProviderError::Configuration`] if either is empty.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let base_url = base_url.into();
        let api_key = api_key.into();

        if base_url.is_empty() {
            return Err(ProviderError::Configuration(
                "base URL cannot be empty".to_string(),
            ));
        }
        if api_key.is_empty() {
            return Err(ProviderError::Configuration(
                "API key cannot be empty".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http,
        })
    }

    /// Create a client from a resolved provider configuration.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Self::new(config.api_url.clone(), config.api_key.clone())
    }

    /// The base URL requests are sent to, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/resources", self.base_url)
    }

    fn resource_url(&self, id: &str) -> String {
        format!("{}/resources/{}", self.base_url, urlencoding::encode(id))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!(%method, url, "sending request");
        self.http.request(method, url).bearer_auth(&self.api_key)
    }

    /// Decode a response with the expected status, or fail with its body.
    async fn expect_json(response: Response, expected: StatusCode) -> Result<Resource, ProviderError> {
        let status = response.status();
        let body = response.text().await?;

        if status != expected {
            return Err(api_error(status, body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn api_error(status: StatusCode, body: String) -> ProviderError {
    warn!(status = status.as_u16(), body = %sanitize_for_log(&body), "API returned an error");
    ProviderError::Api {
        status: status.as_u16(),
        body,
    }
}

/// Truncate a response body and strip control characters for logging.
fn sanitize_for_log(body: &str) -> String {
    let truncated: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
    let cleaned: String = truncated
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();
    if body.chars().count() > MAX_LOG_BODY_LENGTH {
        format!("{}... [truncated, {} bytes total]", cleaned, body.len())
    } else {
        cleaned
    }
}

#[async_trait::async_trait]
impl ResourceApi for ApiClient {
    #[instrument(skip(self, spec), fields(resource_name = %spec.name), name = "api.create")]
    async fn create(&self, spec: &ResourceSpec) -> Result<Resource, ProviderError> {
        let response = self
            .request(Method::POST, &self.collection_url())
            .json(spec)
            .send()
            .await?;

        let resource = Self::expect_json(response, StatusCode::CREATED).await?;
        debug!(id = %resource.id, "resource created");
        Ok(resource)
    }

    #[instrument(skip(self), name = "api.read")]
    async fn read(&self, id: &str) -> Result<Option<Resource>, ProviderError> {
        let response = self
            .request(Method::GET, &self.resource_url(id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("resource not found");
            return Ok(None);
        }

        Self::expect_json(response, StatusCode::OK).await.map(Some)
    }

    #[instrument(skip(self, spec), name = "api.update")]
    async fn update(&self, id: &str, spec: &ResourceSpec) -> Result<Resource, ProviderError> {
        let response = self
            .request(Method::PUT, &self.resource_url(id))
            .json(&UpdateBody { id, spec })
            .send()
            .await?;

        Self::expect_json(response, StatusCode::OK).await
    }

    #[instrument(skip(self), name = "api.delete")]
    async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        let response = self
            .request(Method::DELETE, &self.resource_url(id))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
            return Ok(());
        }

        let body = response.text().await?;
        Err(api_error(status, body))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_values() {
        let err = ApiClient::new("", "key").unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert_eq!(err.message(), "base URL cannot be empty");

        let err = ApiClient::new("https://api.example.com", "").unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert_eq!(err.message(), "API key cannot be empty");
    }

    #[test]
    fn test_request_timeout_value() {
        assert_eq!(REQUEST_TIMEOUT, Duration::from_secs(30));
    }

    #[test]
    fn test_urls() {
        let client = ApiClient::new("https://api.example.com/v1/", "key").unwrap();
        assert_eq!(client.base_url(), "https://api.example.com/v1");
        assert_eq!(client.collection_url(), "https://api.example.com/v1/resources");
        assert_eq!(
            client.resource_url("r-1"),
            "https://api.example.com/v1/resources/r-1"
        );
        assert_eq!(
            client.resource_url("a/b c"),
            "https://api.example.com/v1/resources/a%2Fb%20c"
        );
    }

    #[test]
    fn test_from_config() {
        let config = ProviderConfig::new("https://api.example.com", "key");
        let client = ApiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
    }

    #[test]
    fn test_debug_hides_key() {
        let client = ApiClient::new("https://api.example.com", "super-secret").unwrap();
        assert!(!format!("{:?}", client).contains("super-secret"));
    }

    #[test]
    fn test_update_body_includes_id() {
        let spec = ResourceSpec::new("svc-a").with_enabled(false);
        let body = serde_json::to_value(UpdateBody { id: "r-1", spec: &spec }).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"id": "r-1", "name": "svc-a", "enabled": false})
        );
    }

    #[test]
    fn test_sanitize_for_log() {
        assert_eq!(sanitize_for_log("{\"error\":\"internal\"}\n"), "{\"error\":\"internal\"}");

        let long = "x".repeat(500);
        let sanitized = sanitize_for_log(&long);
        assert!(sanitized.starts_with(&"x".repeat(200)));
        assert!(sanitized.ends_with("[truncated, 500 bytes total]"));
    }
}
