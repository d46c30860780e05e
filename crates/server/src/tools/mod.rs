//! MCP tool implementations.
//!
//! Lifecycle tools deliver one event each to the cache controller; the
//! `cache_*` tools inspect and maintain the store directly.

pub mod cache;
pub mod lifecycle;
pub mod notify;
pub mod sw_fetch;
pub mod sync;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use folio_core::Error;

pub use notify::{SwNotificationClickParams, SwPushParams};
pub use sw_fetch::SwFetchParams;
pub use sync::{QueueSubmissionParams, SwSyncParams};

/// Serialize a tool output as the single text content of a successful result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) fn parse_result<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
