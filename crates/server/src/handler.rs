//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the cache controller.
use std::sync::Arc;

use folio_client::{CacheController, HttpNetwork};
use folio_core::CacheDb;

use crate::tools::{
    QueueSubmissionParams, SwFetchParams, SwNotificationClickParams, SwPushParams, SwSyncParams,
    cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl, stats_impl},
    lifecycle::{activate_impl, install_impl},
    notify::{click_impl, push_impl},
    sw_fetch::fetch_impl,
    sync::{queue_impl, sync_impl},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// Controller backed by SQLite and the real network.
pub type Controller = CacheController<CacheDb, HttpNetwork>;

/// The main MCP server handler for folio-sw.
#[derive(Clone)]
pub struct FolioServer {
    controller: Arc<Controller>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl FolioServer {
    /// Create a new server handler around `controller`.
    pub fn new(controller: Controller) -> Self {
        Self { controller: Arc::new(controller), tool_router: Self::tool_router() }
    }

    #[tool(description = "Install: fetch every precache URL and store them in the current namespace. Fails without storing anything if any URL fails.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.controller).await
    }

    #[tool(description = "Activate: delete every cache namespace except the current one, then start intercepting requests.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.controller).await
    }

    /// Intercept a request.
    ///
    /// Static assets are served cache-first and API routes network-first,
    /// with offline fallbacks for navigations, images and API calls.
    #[tool(description = "Intercept a request as the offline cache would. Returns the response, or passthrough=true when the request is not intercepted.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.controller, params.0).await
    }

    #[tool(description = "Background sync: resend queued offline submissions oldest-first, removing each one that is acknowledged.")]
    async fn sw_sync(&self, params: Parameters<SwSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.controller, params.0).await
    }

    #[tool(description = "Handle a push message and describe the notification to show.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.controller, params.0).await
    }

    #[tool(description = "Handle a notification click. Returns the same-origin URL to open.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.controller, params.0).await
    }

    #[tool(description = "Queue a form submission for background sync, or try to deliver it first with try_online.")]
    async fn queue_submission(&self, params: Parameters<QueueSubmissionParams>) -> Result<CallToolResult, McpError> {
        queue_impl(&self.controller, params.0).await
    }

    #[tool(description = "Retrieve a stored response by URL and method.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.controller, params.0).await
    }

    #[tool(description = "Show entry counts and sizes per cache namespace, plus pending submissions.")]
    async fn cache_stats(&self) -> Result<CallToolResult, McpError> {
        stats_impl(&self.controller).await
    }

    #[tool(description = "Delete a named cache namespace, or every namespace except the current one with stale=true.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.controller, params.0).await
    }
}

impl ServerHandler for FolioServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "folio-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_client::FetchConfig;
    use folio_core::AppConfig;

    #[tokio::test]
    async fn test_router_lists_every_tool() {
        let config = AppConfig::default();
        let store = CacheDb::open_in_memory().await.unwrap();
        let network = HttpNetwork::new(FetchConfig::from_app(&config).unwrap()).unwrap();
        let server = FolioServer::new(CacheController::new(config, store, network).unwrap());

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "cache_get",
                "cache_purge",
                "cache_stats",
                "queue_submission",
                "sw_activate",
                "sw_fetch",
                "sw_install",
                "sw_notification_click",
                "sw_push",
                "sw_sync",
            ]
        );
    }
}
