//! sw_fetch tool implementation.
//!
//! Delivers an intercepted request to the controller and reports how it was
//! answered. Background cache writes are settled before the tool returns.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use folio_client::fetch::{Destination, Method, Request, Response, resolve};
use folio_client::{CacheController, EventOutcome, Network};
use folio_core::{CacheStore, Error};

use super::json_result;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Request URL; relative URLs resolve against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Fetch destination: "document", "image", "script", "style", "font",
    /// "manifest" or empty.
    #[serde(default)]
    pub destination: Option<String>,

    /// Optional Accept header.
    #[serde(default)]
    pub accept: Option<String>,

    /// Optional request body, sent as-is.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// True when the controller did not intercept; the host fetches itself.
    pub passthrough: bool,
    pub status: Option<u16>,
    /// "basic", "cors", "opaque" or "default".
    pub response_type: Option<String>,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: Option<String>,
    /// Number of background cache writes the event waited for.
    pub background_writes: usize,
}

impl SwFetchOutput {
    fn passthrough() -> Self {
        Self {
            passthrough: true,
            status: None,
            response_type: None,
            content_type: None,
            headers: Vec::new(),
            body: None,
            background_writes: 0,
        }
    }

    fn from_response(response: &Response, background_writes: usize) -> Self {
        Self {
            passthrough: false,
            status: Some(response.status.as_u16()),
            response_type: Some(response.response_type.as_str().to_string()),
            content_type: response.content_type().map(str::to_string),
            headers: response
                .headers
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
                .collect(),
            body: Some(String::from_utf8_lossy(&response.body).into_owned()),
            background_writes,
        }
    }
}

fn build_request(params: SwFetchParams, origin: &url::Url) -> Result<Request, Error> {
    let url = resolve(&params.url, origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let method = params
        .method
        .trim()
        .to_ascii_uppercase()
        .parse::<Method>()
        .map_err(|_| Error::InvalidInput(format!("invalid method: {}", params.method)))?;

    let mut request = Request::get(url).with_method(method);
    if let Some(destination) = params.destination.as_deref() {
        request = request.with_destination(Destination::parse(destination));
    }
    if let Some(accept) = params.accept.as_deref() {
        request = request
            .with_accept(accept)
            .map_err(|_| Error::InvalidInput(format!("invalid accept header: {accept}")))?;
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }
    Ok(request)
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<S, N>(controller: &CacheController<S, N>, params: SwFetchParams) -> Result<CallToolResult, McpError>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let request = build_request(params, controller.origin())?;
    let handled = controller.intercept(request).await?;
    let background_writes = handled.wait_until.len();
    handled.wait_until.settle().await;

    let output = match handled.outcome {
        EventOutcome::Response(response) => SwFetchOutput::from_response(&response, background_writes),
        _ => SwFetchOutput::passthrough(),
    };
    json_result(&output)
}
