//! cache_get tool implementation.
//!
//! Retrieves a stored response by method and URL.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use folio_client::fetch::resolve;
use folio_client::{CacheController, Network};
use folio_core::{CacheStore, Error, ResponseType};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL of the stored response; relative URLs resolve against the origin.
    pub url: String,

    /// Request method the response was stored under (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Namespace to read (default: the current namespace).
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub namespace: String,
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub response_type: ResponseType,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
    pub stored_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl<S, N>(controller: &CacheController<S, N>, params: CacheGetParams) -> Result<CallToolResult, McpError>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    let url = resolve(&params.url, controller.origin()).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let method = params.method.as_deref().unwrap_or("GET").to_ascii_uppercase();
    let namespace = params.namespace.as_deref().unwrap_or(controller.namespace());

    let entry = controller
        .store()
        .lookup(namespace, &method, url.as_str())
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{method} {url} in {namespace}")))?;

    let output = CacheGetOutput {
        body: String::from_utf8_lossy(&entry.body).into_owned(),
        body_bytes: entry.body.len(),
        namespace: entry.namespace,
        key: entry.key,
        method: entry.method,
        url: entry.url,
        status: entry.status,
        status_text: entry.status_text,
        response_type: entry.response_type,
        headers: entry.headers,
        stored_at: entry.stored_at,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::parse_result;
    use folio_client::testing::{activated, site};

    fn params(url: &str) -> CacheGetParams {
        CacheGetParams { url: url.into(), method: None, namespace: None }
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let network = Arc::new(site());
        let controller = activated(&network).await;

        let output: CacheGetOutput = parse_result(&get_impl(&controller, params("/manifest.json")).await.unwrap());
        assert_eq!(output.namespace, "portfolio-v1");
        assert_eq!(output.url, "http://localhost:3000/manifest.json");
        assert_eq!(output.status, 200);
        assert_eq!(output.status_text, "OK");
        assert_eq!(output.body, "{}");
        assert_eq!(output.response_type, ResponseType::Basic);
    }

    #[tokio::test]
    async fn test_get_impl_missing() {
        let network = Arc::new(site());
        let controller = activated(&network).await;

        let err = get_impl(&controller, params("/nope.js")).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }
}
