//! Push and notification-click handling.

use serde::{Deserialize, Serialize};
use url::Url;

use folio_core::CacheStore;

use super::CacheController;
use crate::fetch::{Network, resolve, same_origin};

/// A notification the host should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Page to open when the notification is clicked.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PushPayload {
    title: Option<String>,
    body: Option<String>,
    url: Option<String>,
}

impl<S, N> CacheController<S, N>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    /// Turn a push payload into a notification.
    ///
    /// JSON payloads may set `title`, `body` and `url`; any other payload
    /// becomes the body text under the default title.
    pub fn push_notification(&self, payload: Option<&[u8]>) -> Notification {
        let parsed = match payload {
            None | Some([]) => PushPayload::default(),
            Some(bytes) => serde_json::from_slice::<PushPayload>(bytes).unwrap_or_else(|_| PushPayload {
                body: Some(String::from_utf8_lossy(bytes).into_owned()),
                ..Default::default()
            }),
        };

        Notification {
            title: parsed
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| self.config.notification_title.clone()),
            body: parsed.body,
            url: Some(parsed.url.unwrap_or_else(|| self.config.root_document.clone())),
        }
    }

    /// URL to open for a clicked notification.
    ///
    /// Falls back to the root document when the notification has no URL or
    /// points outside this origin.
    pub fn notification_target(&self, notification: &Notification) -> Url {
        notification
            .url
            .as_deref()
            .and_then(|u| resolve(u, &self.origin).ok())
            .filter(|u| same_origin(u, &self.origin))
            .unwrap_or_else(|| self.root_url.clone())
    }
}
