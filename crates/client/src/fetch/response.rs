//! Response model shared by the network client, the cache and the host.

use bytes::Bytes;
use folio_core::{CachedResponse, Error, OFFLINE_MESSAGE, ResponseType};
use reqwest::{StatusCode, header};
use url::Url;

/// A response returned to the host, from the network, the cache, or synthesized.
#[derive(Debug, Clone)]
pub struct Response {
    /// Final URL, when the response came from a fetch or the cache.
    pub url: Option<Url>,
    pub status: StatusCode,
    pub headers: header::HeaderMap,
    pub body: Bytes,
    pub response_type: ResponseType,
}

impl Response {
    /// A locally synthesized response with no headers.
    pub fn synthesized(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { url: None, status, headers: header::HeaderMap::new(), body: body.into(), response_type: ResponseType::Default }
    }

    /// The fixed offline payload returned for API requests that cannot be served.
    pub fn offline() -> Self {
        let body = serde_json::json!({ "error": "Offline", "message": OFFLINE_MESSAGE });
        let mut response = Self::synthesized(StatusCode::SERVICE_UNAVAILABLE, body.to_string());
        response
            .headers
            .insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        response
    }

    /// Empty placeholder for images that cannot be loaded.
    pub fn no_content() -> Self {
        Self::synthesized(StatusCode::NO_CONTENT, Bytes::new())
    }

    /// Status in the 200-299 range.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Snapshot this response as a cache entry for `method url` in `namespace`.
    pub fn to_cached(&self, namespace: &str, method: &str, url: &Url) -> CachedResponse {
        let headers = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();
        let mut entry = CachedResponse::new(
            namespace,
            method,
            url.as_str(),
            self.status.as_u16(),
            headers,
            self.response_type,
            self.body.to_vec(),
        );
        entry.status_text = self.status.canonical_reason().unwrap_or_default().to_string();
        entry
    }
}

impl TryFrom<CachedResponse> for Response {
    type Error = Error;

    fn try_from(entry: CachedResponse) -> Result<Self, Self::Error> {
        let status = StatusCode::from_u16(entry.status).map_err(|e| Error::CorruptEntry(e.to_string()))?;

        let mut headers = header::HeaderMap::new();
        for (name, value) in &entry.headers {
            match (header::HeaderName::from_bytes(name.as_bytes()), header::HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::debug!("skipping unparseable cached header {}", name),
            }
        }

        let url = Url::parse(&entry.url).ok();

        Ok(Self { url, status, headers, body: Bytes::from(entry.body), response_type: entry.response_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_response_shape() {
        let response = Response::offline();
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.content_type(), Some("application/json"));
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["error"], "Offline");
        assert_eq!(body["message"], OFFLINE_MESSAGE);
    }

    #[test]
    fn test_no_content() {
        let response = Response::no_content();
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_cached_conversion_keeps_headers_and_body() {
        let url = Url::parse("http://localhost:3000/static/css/main.css").unwrap();
        let mut response = Response::synthesized(StatusCode::OK, "body{}");
        response.response_type = ResponseType::Basic;
        response
            .headers
            .insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/css"));

        let entry = response.to_cached("portfolio-v1", "GET", &url);
        assert_eq!(entry.status_text, "OK");
        assert_eq!(entry.header("Content-Type"), Some("text/css"));

        let restored = Response::try_from(entry).unwrap();
        assert_eq!(restored.status, StatusCode::OK);
        assert_eq!(restored.content_type(), Some("text/css"));
        assert_eq!(restored.body, Bytes::from_static(b"body{}"));
        assert_eq!(restored.url, Some(url));
    }

    #[test]
    fn test_corrupt_status_rejected() {
        let url = Url::parse("http://localhost:3000/").unwrap();
        let mut entry = Response::no_content().to_cached("portfolio-v1", "GET", &url);
        entry.status = 42;
        assert!(matches!(Response::try_from(entry), Err(Error::CorruptEntry(_))));
    }
}
