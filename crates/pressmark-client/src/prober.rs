//! The target fetch capability.
//!
//! The orchestrator never talks HTTP itself; it consumes a [`Prober`]
//! that turns "fetch this file and hash it" into either evidence or a
//! classified failure. The classification is what drives the scan's
//! error policy: [`ProbeFailure::Rejected`] is a per-file non-signal,
//! [`ProbeFailure::HostUnreachable`] aborts the whole scan.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pressmark_core::{FetchedFile, HashAlgorithm};
use reqwest::Client as HttpClient;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::RetryConfig;
use crate::hash::digest_bytes;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default cap on response body size (fingerprintable files are small)
const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// What a probe is looking for, carried alongside the request so the
/// result can be correlated back to its catalog file record.
#[derive(Debug, Clone)]
pub struct ProbeExpectation {
    /// Path relative to the component root
    pub path: String,

    /// Algorithm the catalog's signatures for this file use
    pub algorithm: HashAlgorithm,
}

impl ProbeExpectation {
    /// Build an expectation for a catalog file
    #[must_use]
    pub fn new(path: impl Into<String>, algorithm: HashAlgorithm) -> Self {
        Self {
            path: path.into(),
            algorithm,
        }
    }
}

/// Why a probe produced no evidence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The server answered with a non-success status
    Status(u16),
    /// The response body exceeded the configured size cap
    BodyTooLarge {
        /// Configured cap in bytes
        limit: usize,
    },
    /// The request timed out
    Timeout,
    /// Any other transport-level failure that is not host-wide
    Transport(String),
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(code) => write!(f, "unexpected status {code}"),
            Self::BodyTooLarge { limit } => write!(f, "body exceeds {limit} bytes"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

/// A probe that produced no usable evidence
#[derive(Error, Debug)]
pub enum ProbeFailure {
    /// The target answered, but not with the expected file.
    /// Swallowed as "no evidence" unless suppression is disabled.
    #[error("probe rejected: {0}")]
    Rejected(RejectReason),

    /// The target stopped answering entirely; fatal for the scan
    #[error("target host unreachable: {0}")]
    HostUnreachable(String),
}

impl ProbeFailure {
    /// True if this failure aborts the whole scan
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::HostUnreachable(_))
    }
}

/// Result type for a single probe
pub type ProbeResult = std::result::Result<FetchedFile, ProbeFailure>;

/// The fetch capability consumed by the orchestrator
#[async_trait]
pub trait Prober: Send + Sync {
    /// Fetch `url` and hash its body with the expected algorithm
    async fn probe(&self, url: &Url, expectation: &ProbeExpectation) -> ProbeResult;
}

/// Reqwest-backed [`Prober`]
#[derive(Clone)]
pub struct HttpProber {
    inner: Arc<ProberInner>,
}

struct ProberInner {
    http: HttpClient,
    max_body_bytes: usize,
    retry: RetryConfig,
}

impl HttpProber {
    /// Create a prober with default settings
    #[must_use]
    pub fn new() -> Self {
        HttpProberBuilder::new().build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> HttpProberBuilder {
        HttpProberBuilder::new()
    }

    /// Fetch a page as text, honoring the body size cap.
    ///
    /// Used for the passive pass over the target's homepage; rejections
    /// are classified the same way as file probes.
    pub async fn fetch_page(&self, url: &Url) -> std::result::Result<String, ProbeFailure> {
        let body = self.fetch_body(url).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn fetch_body(&self, url: &Url) -> std::result::Result<Vec<u8>, ProbeFailure> {
        let response = self.send_with_retry(url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeFailure::Rejected(RejectReason::Status(
                status.as_u16(),
            )));
        }

        let limit = self.inner.max_body_bytes;
        if let Some(len) = response.content_length() {
            if len as usize > limit {
                return Err(ProbeFailure::Rejected(RejectReason::BodyTooLarge {
                    limit,
                }));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeFailure::Rejected(RejectReason::Transport(e.to_string())))?;

        if body.len() > limit {
            return Err(ProbeFailure::Rejected(RejectReason::BodyTooLarge { limit }));
        }

        Ok(body.to_vec())
    }

    /// Issue the GET, retrying transient connection failures.
    ///
    /// Only connect-level failures are retried; once retries are
    /// exhausted they classify as host-unreachable. Timeouts and other
    /// transport errors are per-file rejections.
    async fn send_with_retry(
        &self,
        url: &Url,
    ) -> std::result::Result<reqwest::Response, ProbeFailure> {
        let retry = &self.inner.retry;
        let mut attempt = 0;

        loop {
            debug!(url = %url, attempt, "GET probe");
            match self.inner.http.get(url.clone()).send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() => {
                    if attempt >= retry.max_retries {
                        warn!(url = %url, "connection failed after {attempt} retries");
                        return Err(ProbeFailure::HostUnreachable(e.to_string()));
                    }
                    tokio::time::sleep(retry.backoff_for(attempt)).await;
                    attempt += 1;
                }
                Err(e) if e.is_timeout() => {
                    return Err(ProbeFailure::Rejected(RejectReason::Timeout));
                }
                Err(e) => {
                    return Err(ProbeFailure::Rejected(RejectReason::Transport(
                        e.to_string(),
                    )));
                }
            }
        }
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &Url, expectation: &ProbeExpectation) -> ProbeResult {
        let body = self.fetch_body(url).await?;
        let hash = digest_bytes(expectation.algorithm, &body);

        Ok(FetchedFile {
            path: expectation.path.clone(),
            hash,
        })
    }
}

/// Builder for configuring an [`HttpProber`]
pub struct HttpProberBuilder {
    timeout: Duration,
    user_agent: String,
    max_body_bytes: usize,
    retry: RetryConfig,
}

impl HttpProberBuilder {
    /// Create a new builder with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("pressmark/{}", env!("CARGO_PKG_VERSION")),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            retry: RetryConfig::default(),
        }
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set the response body size cap
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Set retry configuration
    #[must_use]
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Build the prober.
    ///
    /// Redirects are not followed: a redirected probe would hash the
    /// redirect target instead of the catalog file.
    #[must_use]
    pub fn build(self) -> HttpProber {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .gzip(true)
            .build()
            .expect("Failed to build HTTP client");

        HttpProber {
            inner: Arc::new(ProberInner {
                http,
                max_body_bytes: self.max_body_bytes,
                retry: self.retry,
            }),
        }
    }
}

impl Default for HttpProberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn expectation() -> ProbeExpectation {
        ProbeExpectation::new("readme.html", HashAlgorithm::Md5)
    }

    async fn mounted(server: &MockServer, route: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn probe_hashes_body() {
        let server = MockServer::start().await;
        mounted(
            &server,
            "/readme.html",
            ResponseTemplate::new(200).set_body_string("hello world"),
        )
        .await;

        let prober = HttpProber::new();
        let url = Url::parse(&format!("{}/readme.html", server.uri())).unwrap();
        let file = prober.probe(&url, &expectation()).await.unwrap();

        assert_eq!(file.path, "readme.html");
        assert_eq!(file.hash, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[tokio::test]
    async fn non_success_status_is_rejection() {
        let server = MockServer::start().await;
        mounted(&server, "/readme.html", ResponseTemplate::new(404)).await;

        let prober = HttpProber::new();
        let url = Url::parse(&format!("{}/readme.html", server.uri())).unwrap();
        let err = prober.probe(&url, &expectation()).await.unwrap_err();

        match err {
            ProbeFailure::Rejected(RejectReason::Status(404)) => {}
            other => panic!("expected 404 rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn redirect_is_rejection_not_followed() {
        let server = MockServer::start().await;
        mounted(
            &server,
            "/readme.html",
            ResponseTemplate::new(301).insert_header("location", "/elsewhere"),
        )
        .await;

        let prober = HttpProber::new();
        let url = Url::parse(&format!("{}/readme.html", server.uri())).unwrap();
        let err = prober.probe(&url, &expectation()).await.unwrap_err();

        assert!(matches!(
            err,
            ProbeFailure::Rejected(RejectReason::Status(301))
        ));
    }

    #[tokio::test]
    async fn oversized_body_is_rejection() {
        let server = MockServer::start().await;
        mounted(
            &server,
            "/readme.html",
            ResponseTemplate::new(200).set_body_string("x".repeat(64)),
        )
        .await;

        let prober = HttpProber::builder().max_body_bytes(16).build();
        let url = Url::parse(&format!("{}/readme.html", server.uri())).unwrap();
        let err = prober.probe(&url, &expectation()).await.unwrap_err();

        assert!(matches!(
            err,
            ProbeFailure::Rejected(RejectReason::BodyTooLarge { limit: 16 })
        ));
    }

    #[tokio::test]
    async fn connection_refused_is_host_unreachable() {
        // Nothing listens on this port; bind/release to find a free one.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let prober = HttpProber::builder().retry(RetryConfig::none()).build();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/readme.html")).unwrap();
        let err = prober.probe(&url, &expectation()).await.unwrap_err();

        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn fetch_page_returns_text() {
        let server = MockServer::start().await;
        mounted(
            &server,
            "/",
            ResponseTemplate::new(200).set_body_string("<html>ok</html>"),
        )
        .await;

        let prober = HttpProber::new();
        let url = Url::parse(&server.uri()).unwrap();
        let page = prober.fetch_page(&url).await.unwrap();

        assert!(page.contains("ok"));
    }
}
