//! Network side of the controller.
//!
//! ### Request model
//! - [`Request`] carries method, resolved URL, destination, headers and body.
//! - [`Response`] carries status, headers, body and the Fetch response type.
//!
//! ### Response types
//! - Same origin as the controller: `basic`
//! - Cross-origin with `Access-Control-Allow-Origin`: `cors`
//! - Any other cross-origin response: `opaque`
//!
//! Only `basic` responses are ever written to the static cache.

pub mod request;
pub mod response;
pub mod url;

use async_trait::async_trait;
use reqwest::{Client, header};
use std::time::{Duration, Instant};

pub use request::{Destination, Request};
pub use reqwest::Method;
pub use response::Response;
pub use self::url::{UrlError, resolve, same_origin};

use folio_core::{AppConfig, Error, ResponseType};

/// Failure to obtain any response at all.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout(err.to_string())
        } else if err.is_connect() {
            NetworkError::Connect(err.to_string())
        } else {
            NetworkError::Transport(err.to_string())
        }
    }
}

impl From<NetworkError> for Error {
    fn from(err: NetworkError) -> Self {
        Error::Network(err.to_string())
    }
}

/// Transport used by the controller to reach the network.
///
/// Any HTTP status counts as a response; only transport failures are errors.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// Configuration for the HTTP network client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Origin the controller runs for; decides `basic` vs cross-origin responses.
    pub origin: ::url::Url,

    /// User agent string (default: "folio-sw/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl FetchConfig {
    /// Derive the fetch settings from the application config.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self { origin, user_agent: config.user_agent.clone(), timeout: config.timeout(), max_redirects: 5 })
    }
}

/// reqwest-backed [`Network`].
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new network client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn response_type(&self, final_url: &::url::Url, headers: &header::HeaderMap) -> ResponseType {
        if same_origin(final_url, &self.config.origin) {
            ResponseType::Basic
        } else if headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN) {
            ResponseType::Cors
        } else {
            ResponseType::Opaque
        }
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let start = Instant::now();

        let mut builder = self
            .http
            .request(request.method.clone(), request.url.as_str())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        let response_type = self.response_type(&final_url, &headers);

        tracing::debug!(
            "fetched {} {} -> {} ({}) in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            response_type.as_str(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response { url: Some(final_url), status, headers, body, response_type })
    }
}
