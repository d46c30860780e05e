//! cache_stats tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use folio_client::{CacheController, Network};
use folio_core::{CacheStore, NamespaceStats};

use crate::tools::json_result;

/// Output from the cache_stats tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatsOutput {
    /// Namespace owned by this deployment.
    pub current: String,
    pub lifecycle: String,
    pub namespaces: Vec<NamespaceStats>,
    /// Submissions waiting for background sync under the configured tag.
    pub pending_submissions: usize,
}

/// Implementation of the cache_stats tool.
pub async fn stats_impl<S, N>(controller: &CacheController<S, N>) -> Result<CallToolResult, McpError>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    let namespaces = controller.store().stats().await?;
    let pending = controller.store().pending(&controller.config().sync_tag).await?;

    let output = CacheStatsOutput {
        current: controller.namespace().to_string(),
        lifecycle: controller.lifecycle().await.as_str().to_string(),
        namespaces,
        pending_submissions: pending.len(),
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::parse_result;
    use folio_client::testing::{activated, controller, site};

    #[tokio::test]
    async fn test_stats_after_install() {
        let network = Arc::new(site());
        let controller = activated(&network).await;
        controller.queue_submission(&serde_json::json!({"n": 1})).await.unwrap();

        let output: CacheStatsOutput = parse_result(&stats_impl(&controller).await.unwrap());
        assert_eq!(output.current, "portfolio-v1");
        assert_eq!(output.lifecycle, "activated");
        assert_eq!(output.namespaces.len(), 1);
        assert_eq!(output.namespaces[0].entries, 4);
        assert_eq!(output.pending_submissions, 1);
    }

    #[tokio::test]
    async fn test_stats_before_install() {
        let network = Arc::new(site());
        let controller = controller(&network);

        let output: CacheStatsOutput = parse_result(&stats_impl(&controller).await.unwrap());
        assert_eq!(output.lifecycle, "registered");
        assert!(output.namespaces.is_empty());
    }
}
