//! sw_install and sw_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use folio_client::{CacheController, Network};
use folio_core::CacheStore;

use super::json_result;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallOutput {
    /// Namespace the precache was written to.
    pub namespace: String,
    /// Number of precached entries.
    pub cached: usize,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwActivateOutput {
    pub namespace: String,
    /// Stale namespaces that were deleted.
    pub deleted: Vec<String>,
}

/// Implementation of the sw_install tool.
pub async fn install_impl<S, N>(controller: &CacheController<S, N>) -> Result<CallToolResult, McpError>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    let cached = controller.install().await?;
    json_result(&SwInstallOutput { namespace: controller.namespace().to_string(), cached })
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl<S, N>(controller: &CacheController<S, N>) -> Result<CallToolResult, McpError>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    let deleted = controller.activate().await?;
    json_result(&SwActivateOutput { namespace: controller.namespace().to_string(), deleted })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::parse_result;
    use folio_client::testing::{StubNetwork, controller, site};

    #[tokio::test]
    async fn test_install_then_activate() {
        let network = Arc::new(site());
        let controller = controller(&network);

        let installed: SwInstallOutput = parse_result(&install_impl(&controller).await.unwrap());
        assert_eq!(installed.namespace, "portfolio-v1");
        assert_eq!(installed.cached, 4);

        let activated: SwActivateOutput = parse_result(&activate_impl(&controller).await.unwrap());
        assert!(activated.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_install_failure_is_error() {
        let network = Arc::new(StubNetwork::new());
        let controller = controller(&network);

        let err = install_impl(&controller).await.unwrap_err();
        assert_eq!(err.code.0, -32020);
    }

    #[tokio::test]
    async fn test_activate_before_install_is_error() {
        let network = Arc::new(site());
        let controller = controller(&network);
        assert!(activate_impl(&controller).await.is_err());
    }
}
