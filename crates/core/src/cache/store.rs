//! Storage interface consumed by the cache controller.
//!
//! Two implementations ship with the crate: [`CacheDb`] (SQLite) and
//! [`MemoryStore`](super::memory::MemoryStore) (process-local, used in tests).

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;

/// Fetch-style response type of a stored response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response.
    Basic,
    /// Cross-origin response with CORS headers.
    Cors,
    /// Cross-origin response without CORS access.
    Opaque,
    /// Response synthesized locally.
    Default,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
            ResponseType::Default => "default",
        }
    }

    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "basic" => Ok(ResponseType::Basic),
            "cors" => Ok(ResponseType::Cors),
            "opaque" => Ok(ResponseType::Opaque),
            "default" => Ok(ResponseType::Default),
            other => Err(Error::CorruptEntry(format!("unknown response type: {other}"))),
        }
    }
}

/// Lifecycle position of the controller for one namespace.
///
/// Persisted so a restarted controller resumes where it left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// Controller created; precache not yet complete.
    Registered,
    /// Precache complete; waiting for activation.
    Installed,
    /// Old namespaces removed; intercepting requests.
    Activated,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Registered => "registered",
            Lifecycle::Installed => "installed",
            Lifecycle::Activated => "activated",
        }
    }

    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "registered" => Ok(Lifecycle::Registered),
            "installed" => Ok(Lifecycle::Installed),
            "activated" => Ok(Lifecycle::Activated),
            other => Err(Error::CorruptEntry(format!("unknown lifecycle state: {other}"))),
        }
    }
}

/// A stored request/response pair.
///
/// Entries are replaced wholesale on write; nothing patches one in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CachedResponse {
    pub namespace: String,
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub response_type: ResponseType,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CachedResponse {
    /// Build an entry for `method url` in `namespace`, stamping the key and time.
    pub fn new(
        namespace: impl Into<String>, method: &str, url: &str, status: u16, headers: Vec<(String, String)>,
        response_type: ResponseType, body: Vec<u8>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            key: compute_cache_key(method, url),
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
            status,
            status_text: String::new(),
            headers,
            response_type,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// First header value matching `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Entry count and body size of one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NamespaceStats {
    pub namespace: String,
    pub entries: u64,
    pub bytes: u64,
}

/// An offline submission waiting for a background-sync pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PendingSubmission {
    pub id: i64,
    pub tag: String,
    pub payload: serde_json::Value,
    pub created_at: String,
    pub attempts: u32,
    pub last_error: Option<String>,
}

/// Storage backend for namespaces, entries and the submission queue.
///
/// Writes are last-writer-wins per `(namespace, key)`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Names of all namespaces holding at least one entry.
    async fn namespaces(&self) -> Result<Vec<String>, Error>;

    /// Delete a namespace, every entry in it and its saved lifecycle state.
    /// Returns whether any entry was removed.
    async fn delete_namespace(&self, namespace: &str) -> Result<bool, Error>;

    /// Store a single entry, replacing any previous one with the same key.
    async fn put(&self, entry: &CachedResponse) -> Result<(), Error>;

    /// Store all entries or none of them.
    async fn put_all(&self, entries: &[CachedResponse]) -> Result<(), Error>;

    /// Look up the entry for `method url` in `namespace`.
    async fn lookup(&self, namespace: &str, method: &str, url: &str) -> Result<Option<CachedResponse>, Error>;

    /// Per-namespace entry counts and sizes, ordered by name.
    async fn stats(&self) -> Result<Vec<NamespaceStats>, Error>;

    /// Queue a submission under `tag`. Returns its id.
    async fn enqueue(&self, tag: &str, payload: &serde_json::Value) -> Result<i64, Error>;

    /// Pending submissions for `tag`, oldest first.
    async fn pending(&self, tag: &str) -> Result<Vec<PendingSubmission>, Error>;

    /// Remove a submission. Returns whether it existed.
    async fn remove_submission(&self, id: i64) -> Result<bool, Error>;

    /// Record a failed resend. Returns the updated attempt count.
    async fn record_failure(&self, id: i64, error: &str) -> Result<u32, Error>;

    /// Saved lifecycle state of `namespace`, if any.
    async fn lifecycle(&self, namespace: &str) -> Result<Option<Lifecycle>, Error>;

    /// Save the lifecycle state of `namespace`.
    async fn set_lifecycle(&self, namespace: &str, state: Lifecycle) -> Result<(), Error>;
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn namespaces(&self) -> Result<Vec<String>, Error> {
        self.list_namespaces().await
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<bool, Error> {
        self.delete_entries_in(namespace).await.map(|deleted| deleted > 0)
    }

    async fn put(&self, entry: &CachedResponse) -> Result<(), Error> {
        self.upsert_entries(std::slice::from_ref(entry)).await
    }

    async fn put_all(&self, entries: &[CachedResponse]) -> Result<(), Error> {
        self.upsert_entries(entries).await
    }

    async fn lookup(&self, namespace: &str, method: &str, url: &str) -> Result<Option<CachedResponse>, Error> {
        self.get_entry(namespace, &compute_cache_key(method, url)).await
    }

    async fn stats(&self) -> Result<Vec<NamespaceStats>, Error> {
        self.namespace_stats().await
    }

    async fn enqueue(&self, tag: &str, payload: &serde_json::Value) -> Result<i64, Error> {
        self.insert_submission(tag, payload).await
    }

    async fn pending(&self, tag: &str) -> Result<Vec<PendingSubmission>, Error> {
        self.list_submissions(tag).await
    }

    async fn remove_submission(&self, id: i64) -> Result<bool, Error> {
        self.delete_submission(id).await
    }

    async fn record_failure(&self, id: i64, error: &str) -> Result<u32, Error> {
        self.bump_submission_attempts(id, error).await
    }

    async fn lifecycle(&self, namespace: &str) -> Result<Option<Lifecycle>, Error> {
        self.get_lifecycle(namespace).await
    }

    async fn set_lifecycle(&self, namespace: &str, state: Lifecycle) -> Result<(), Error> {
        self.put_lifecycle(namespace, state).await
    }
}
