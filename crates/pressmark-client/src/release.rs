//! Catalog release API client.
//!
//! The signature catalog is published as tagged releases; the refresh
//! manager asks this client for the latest release descriptor and for
//! asset downloads. Base URL is overridable for tests.

use std::sync::Arc;
use std::time::Duration;

use pressmark_core::{PressmarkError, Result};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::debug;

/// Default catalog release API base
const DEFAULT_API_BASE: &str = "https://api.github.com/repos/pressmark/signatures";

/// Default request timeout for release API calls
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A downloadable artifact attached to a release
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Asset file name
    pub name: String,

    /// Download URL for the asset
    pub url: String,
}

/// The latest-release descriptor
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Release tag, used as the catalog version (e.g. `2.1.0`)
    pub tag_name: String,

    /// Attached artifacts
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// Find an asset by exact file name
    #[must_use]
    pub fn asset_named(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// Client for the catalog release API
#[derive(Clone)]
pub struct ReleaseClient {
    inner: Arc<ReleaseClientInner>,
}

struct ReleaseClientInner {
    http: HttpClient,
    base_url: String,
}

impl ReleaseClient {
    /// Create a client against the default release API
    #[must_use]
    pub fn new() -> Self {
        ReleaseClientBuilder::new().build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> ReleaseClientBuilder {
        ReleaseClientBuilder::new()
    }

    /// Fetch the latest release descriptor
    pub async fn latest(&self) -> Result<Release> {
        let url = format!("{}/releases/latest", self.inner.base_url);
        debug!(url = %url, "GET latest release");

        let response = self
            .inner
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PressmarkError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PressmarkError::Http(format!(
                "release check failed with status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PressmarkError::Http(e.to_string()))?;
        serde_json::from_str(&body).map_err(PressmarkError::Json)
    }

    /// Download a release asset as raw bytes
    pub async fn download_asset(&self, asset: &ReleaseAsset) -> Result<Vec<u8>> {
        debug!(url = %asset.url, name = %asset.name, "downloading asset");

        let response = self
            .inner
            .http
            .get(&asset.url)
            .header("accept", "application/octet-stream")
            .send()
            .await
            .map_err(|e| PressmarkError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PressmarkError::Http(format!(
                "asset download failed with status {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PressmarkError::Http(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl Default for ReleaseClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring a [`ReleaseClient`]
pub struct ReleaseClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl ReleaseClientBuilder {
    /// Create a new builder with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("pressmark/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the API base URL (useful for testing)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client
    #[must_use]
    pub fn build(self) -> ReleaseClient {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .gzip(true)
            .build()
            .expect("Failed to build HTTP client");

        ReleaseClient {
            inner: Arc::new(ReleaseClientInner {
                http,
                base_url: self.base_url,
            }),
        }
    }
}

impl Default for ReleaseClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn latest_parses_descriptor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tag_name": "2.1.0",
                "assets": [
                    {"name": "signatures.json.gz", "url": format!("{}/asset/1", server.uri())}
                ]
            })))
            .mount(&server)
            .await;

        let client = ReleaseClient::builder().base_url(server.uri()).build();
        let release = client.latest().await.unwrap();

        assert_eq!(release.tag_name, "2.1.0");
        assert!(release.asset_named("signatures.json.gz").is_some());
        assert!(release.asset_named("other.bin").is_none());
    }

    #[tokio::test]
    async fn download_sends_octet_stream_accept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/asset/1"))
            .and(header("accept", "application/octet-stream"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
            .mount(&server)
            .await;

        let client = ReleaseClient::builder().base_url(server.uri()).build();
        let asset = ReleaseAsset {
            name: "signatures.json.gz".into(),
            url: format!("{}/asset/1", server.uri()),
        };
        let bytes = client.download_asset(&asset).await.unwrap();

        assert_eq!(bytes, b"payload");
    }

    #[tokio::test]
    async fn error_status_surfaces_as_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases/latest"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = ReleaseClient::builder().base_url(server.uri()).build();
        let err = client.latest().await.unwrap_err();

        assert!(matches!(err, PressmarkError::Http(_)));
    }
}
