//! sw_sync and queue_submission tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use folio_client::{CacheController, Event, EventOutcome, Network, SubmitOutcome};
use folio_core::{CacheStore, Error};

use super::json_result;

/// Input parameters for the sw_sync tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    /// Sync tag; defaults to the configured tag.
    #[serde(default)]
    pub tag: Option<String>,
}

/// Output from the sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncOutput {
    pub tag: String,
    /// False when the tag is not handled by this controller.
    pub handled: bool,
    pub delivered: Vec<i64>,
    pub retained: Vec<i64>,
    pub dropped: Vec<i64>,
}

/// Input parameters for the queue_submission tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueueSubmissionParams {
    /// JSON payload to POST to the sync endpoint.
    pub payload: serde_json::Value,

    /// Try to deliver immediately and queue only if the network is unreachable.
    #[serde(default)]
    pub try_online: bool,
}

/// Output from the queue_submission tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueueSubmissionOutput {
    /// "delivered", "rejected" or "queued".
    pub outcome: String,
    /// Queue id, when queued.
    pub id: Option<i64>,
    /// Endpoint status, when delivered or rejected.
    pub status: Option<u16>,
}

impl From<SubmitOutcome> for QueueSubmissionOutput {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Delivered { status } => Self { outcome: "delivered".into(), id: None, status: Some(status) },
            SubmitOutcome::Rejected { status } => Self { outcome: "rejected".into(), id: None, status: Some(status) },
            SubmitOutcome::Queued { id } => Self { outcome: "queued".into(), id: Some(id), status: None },
        }
    }
}

/// Implementation of the sw_sync tool.
pub async fn sync_impl<S, N>(controller: &CacheController<S, N>, params: SwSyncParams) -> Result<CallToolResult, McpError>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    let tag = params.tag.unwrap_or_else(|| controller.config().sync_tag.clone());
    let handled = controller.handle(Event::Sync { tag: tag.clone() }).await?;

    let output = match handled.outcome {
        EventOutcome::Synced(report) => SwSyncOutput {
            tag,
            handled: true,
            delivered: report.delivered,
            retained: report.retained,
            dropped: report.dropped,
        },
        _ => SwSyncOutput { tag, handled: false, delivered: Vec::new(), retained: Vec::new(), dropped: Vec::new() },
    };
    json_result(&output)
}

/// Implementation of the queue_submission tool.
pub async fn queue_impl<S, N>(
    controller: &CacheController<S, N>, params: QueueSubmissionParams,
) -> Result<CallToolResult, McpError>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    if params.payload.is_null() {
        return Err(Error::InvalidInput("payload cannot be null".into()).into());
    }

    let outcome = if params.try_online {
        controller.submit(&params.payload).await?
    } else {
        SubmitOutcome::Queued { id: controller.queue_submission(&params.payload).await? }
    };
    json_result(&QueueSubmissionOutput::from(outcome))
}
