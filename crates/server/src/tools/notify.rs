//! sw_push and sw_notification_click tool implementations.

use bytes::Bytes;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use folio_client::{CacheController, Event, EventOutcome, Network, Notification};
use folio_core::{CacheStore, Error};

use super::json_result;

/// Input parameters for the sw_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Raw push payload; JSON `{title, body, url}` or plain text.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Input parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    /// URL carried by the clicked notification.
    #[serde(default)]
    pub url: Option<String>,
}

/// Output from the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushOutput {
    pub title: String,
    pub body: Option<String>,
    pub url: Option<String>,
}

/// Output from the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickOutput {
    /// Window the host should open or focus.
    pub open_window: String,
}

/// Implementation of the sw_push tool.
pub async fn push_impl<S, N>(controller: &CacheController<S, N>, params: SwPushParams) -> Result<CallToolResult, McpError>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    let payload = params.payload.map(Bytes::from);
    let handled = controller.handle(Event::Push { payload }).await?;
    let EventOutcome::Notification(notification) = handled.outcome else {
        return Err(Error::InvalidInput("push produced no notification".into()).into());
    };
    json_result(&SwPushOutput { title: notification.title, body: notification.body, url: notification.url })
}

/// Implementation of the sw_notification_click tool.
pub async fn click_impl<S, N>(
    controller: &CacheController<S, N>, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    let notification = Notification { title: params.title, body: params.body, url: params.url };
    let handled = controller.handle(Event::NotificationClick { notification }).await?;
    let EventOutcome::OpenWindow(target) = handled.outcome else {
        return Err(Error::InvalidInput("click produced no window target".into()).into());
    };
    json_result(&SwNotificationClickOutput { open_window: target.to_string() })
}
