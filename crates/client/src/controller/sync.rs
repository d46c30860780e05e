//! Offline submission queue and background resync.
//!
//! Submissions are resent oldest-first. A 2xx acknowledgement removes the
//! item; anything else leaves it queued with its attempt count bumped. After
//! `max_sync_attempts` failures the item is discarded.

use serde::{Deserialize, Serialize};

use folio_core::{CacheStore, Error, PendingSubmission};

use super::CacheController;
use crate::fetch::{Network, Request};

/// Result of one background-sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Acknowledged and removed.
    pub delivered: Vec<i64>,
    /// Failed; still queued for the next trigger.
    pub retained: Vec<i64>,
    /// Failed for the last allowed time; removed.
    pub dropped: Vec<i64>,
}

/// Result of submitting a payload while possibly offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The endpoint acknowledged it.
    Delivered { status: u16 },
    /// The endpoint answered with a non-2xx status; not queued.
    Rejected { status: u16 },
    /// The network was unreachable; queued for background sync.
    Queued { id: i64 },
}

impl<S, N> CacheController<S, N>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    /// Queue a payload for the next sync pass. Returns its id.
    pub async fn queue_submission(&self, payload: &serde_json::Value) -> Result<i64, Error> {
        let id = self.store.enqueue(&self.config.sync_tag, payload).await?;
        tracing::info!(id, tag = %self.config.sync_tag, "queued offline submission");
        Ok(id)
    }

    /// POST a payload now, queueing it only if the network is unreachable.
    pub async fn submit(&self, payload: &serde_json::Value) -> Result<SubmitOutcome, Error> {
        let request = self.submission_request(payload)?;
        match self.network.fetch(&request).await {
            Ok(response) if response.is_ok() => Ok(SubmitOutcome::Delivered { status: response.status.as_u16() }),
            Ok(response) => Ok(SubmitOutcome::Rejected { status: response.status.as_u16() }),
            Err(e) => {
                tracing::debug!("submission failed, queueing: {e}");
                let id = self.queue_submission(payload).await?;
                Ok(SubmitOutcome::Queued { id })
            }
        }
    }

    /// Drain the queue for the configured sync tag.
    ///
    /// Store failures on individual items are logged and leave the item queued.
    pub async fn sync_submissions(&self) -> Result<SyncReport, Error> {
        let pending = self.store.pending(&self.config.sync_tag).await?;
        tracing::info!(pending = pending.len(), tag = %self.config.sync_tag, "background sync started");

        let mut report = SyncReport::default();
        for submission in pending {
            let id = submission.id;
            match self.resend(&submission).await {
                Ok(()) => match self.store.remove_submission(id).await {
                    Ok(_) => report.delivered.push(id),
                    Err(e) => {
                        tracing::warn!(id, "delivered but could not dequeue: {e}");
                        report.retained.push(id);
                    }
                },
                Err(reason) => {
                    if self.note_failure(id, &reason).await {
                        report.dropped.push(id);
                    } else {
                        report.retained.push(id);
                    }
                }
            }
        }

        tracing::info!(
            delivered = report.delivered.len(),
            retained = report.retained.len(),
            dropped = report.dropped.len(),
            "background sync finished"
        );
        Ok(report)
    }

    async fn resend(&self, submission: &PendingSubmission) -> Result<(), String> {
        let request = self.submission_request(&submission.payload).map_err(|e| e.to_string())?;
        match self.network.fetch(&request).await {
            Ok(response) if response.is_ok() => Ok(()),
            Ok(response) => Err(format!("status {}", response.status.as_u16())),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Record a failed resend. Returns true if the item was discarded.
    async fn note_failure(&self, id: i64, reason: &str) -> bool {
        let attempts = match self.store.record_failure(id, reason).await {
            Ok(attempts) => attempts,
            Err(e) => {
                tracing::warn!(id, "could not record sync failure: {e}");
                return false;
            }
        };

        if attempts < self.config.max_sync_attempts {
            tracing::debug!(id, attempts, "resend failed: {reason}");
            return false;
        }

        tracing::warn!(id, attempts, "discarding submission after repeated failures: {reason}");
        match self.store.remove_submission(id).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(id, "could not discard submission: {e}");
                false
            }
        }
    }

    fn submission_request(&self, payload: &serde_json::Value) -> Result<Request, Error> {
        Request::post_json(self.sync_url.clone(), payload).map_err(|e| Error::InvalidInput(e.to_string()))
    }
}
