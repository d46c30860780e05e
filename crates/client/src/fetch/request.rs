//! Intercepted request model.

use bytes::Bytes;
use reqwest::{Method, header};
use url::Url;

/// What the requester intends to do with the response.
///
/// Mirrors the Fetch `destination` values the controller cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    /// Top-level page navigation.
    Document,
    Image,
    Script,
    Style,
    Font,
    Manifest,
    /// `fetch()`/XHR and anything unclassified.
    #[default]
    Empty,
}

impl Destination {
    /// Parse a Fetch destination string. Unknown values map to `Empty`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" | "navigate" => Destination::Document,
            "image" => Destination::Image,
            "script" => Destination::Script,
            "style" => Destination::Style,
            "font" => Destination::Font,
            "manifest" => Destination::Manifest,
            _ => Destination::Empty,
        }
    }
}

/// A request delivered to the controller by the host.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    pub headers: header::HeaderMap,
    pub body: Option<Bytes>,
}

impl Request {
    /// A plain `GET` with no destination.
    pub fn get(url: Url) -> Self {
        Self { method: Method::GET, url, destination: Destination::Empty, headers: header::HeaderMap::new(), body: None }
    }

    /// A page navigation to `url`.
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_destination(Destination::Document)
    }

    /// A `POST` carrying `payload` as JSON.
    pub fn post_json(url: Url, payload: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(payload)?;
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        Ok(Self { method: Method::POST, url, destination: Destination::Empty, headers, body: Some(Bytes::from(body)) })
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: header::HeaderName, value: header::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_accept(self, accept: &str) -> Result<Self, header::InvalidHeaderValue> {
        let value = header::HeaderValue::from_str(accept)?;
        Ok(self.with_header(header::ACCEPT, value))
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document
    }

    /// Image requests, by destination or by an `Accept` header asking for images.
    pub fn is_image(&self) -> bool {
        self.destination == Destination::Image
            || self
                .headers
                .get(header::ACCEPT)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|accept| accept.trim_start().starts_with("image/"))
    }
}
