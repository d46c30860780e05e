//! cache_purge tool implementation.
//!
//! Deletes a named namespace, or every namespace but the current one.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use folio_client::{CacheController, Network};
use folio_core::{CacheStore, Error};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Delete this namespace.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Delete every namespace except the current one.
    #[serde(default)]
    pub stale: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Namespaces that were deleted.
    pub deleted: Vec<String>,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl<S, N>(controller: &CacheController<S, N>, params: CachePurgeParams) -> Result<CallToolResult, McpError>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    if params.namespace.is_none() && !params.stale {
        return Err(Error::InvalidInput("At least one of namespace or stale must be specified".to_string()).into());
    }

    let store = controller.store();
    let mut deleted = Vec::new();

    if let Some(namespace) = params.namespace
        && store.delete_namespace(&namespace).await?
    {
        deleted.push(namespace);
    }

    if params.stale {
        for name in store.namespaces().await? {
            if name != controller.namespace() && store.delete_namespace(&name).await? {
                deleted.push(name);
            }
        }
    }

    tracing::info!(deleted = deleted.len(), "purged namespaces");
    json_result(&CachePurgeOutput { deleted })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::parse_result;
    use folio_client::testing::{activated, site};
    use folio_core::{CachedResponse, ResponseType};

    async fn seed<S: CacheStore>(store: &S, namespace: &str) {
        let entry = CachedResponse::new(
            namespace,
            "GET",
            "http://localhost:3000/old.js",
            200,
            Vec::new(),
            ResponseType::Basic,
            b"old".to_vec(),
        );
        store.put(&entry).await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_stale() {
        let network = Arc::new(site());
        let controller = activated(&network).await;
        seed(controller.store(), "portfolio-v0").await;
        seed(controller.store(), "scratch").await;

        let output: CachePurgeOutput =
            parse_result(&purge_impl(&controller, CachePurgeParams { namespace: None, stale: true }).await.unwrap());
        assert_eq!(output.deleted, vec!["portfolio-v0".to_string(), "scratch".to_string()]);
        assert_eq!(controller.store().namespaces().await.unwrap(), vec!["portfolio-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_purge_named() {
        let network = Arc::new(site());
        let controller = activated(&network).await;
        seed(controller.store(), "scratch").await;

        let params = CachePurgeParams { namespace: Some("scratch".into()), stale: false };
        let output: CachePurgeOutput = parse_result(&purge_impl(&controller, params).await.unwrap());
        assert_eq!(output.deleted, vec!["scratch".to_string()]);

        let params = CachePurgeParams { namespace: Some("scratch".into()), stale: false };
        let output: CachePurgeOutput = parse_result(&purge_impl(&controller, params).await.unwrap());
        assert!(output.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_purge_no_params() {
        let network = Arc::new(site());
        let controller = activated(&network).await;
        assert!(purge_impl(&controller, CachePurgeParams::default()).await.is_err());
    }
}
