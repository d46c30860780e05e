//! Process-local cache store.
//!
//! Holds everything in maps behind a tokio RwLock. Nothing survives a restart.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::hash::compute_cache_key;
use super::store::{CacheStore, CachedResponse, Lifecycle, NamespaceStats, PendingSubmission};
use crate::Error;

#[derive(Default)]
struct Inner {
    namespaces: BTreeMap<String, HashMap<String, CachedResponse>>,
    queue: BTreeMap<i64, PendingSubmission>,
    next_id: i64,
    lifecycle: HashMap<String, Lifecycle>,
}

/// In-memory [`CacheStore`].
///
/// Clones share the same underlying state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn namespaces(&self) -> Result<Vec<String>, Error> {
        let inner = self.inner.read().await;
        Ok(inner
            .namespaces
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<bool, Error> {
        let mut inner = self.inner.write().await;
        inner.lifecycle.remove(namespace);
        Ok(inner
            .namespaces
            .remove(namespace)
            .is_some_and(|entries| !entries.is_empty()))
    }

    async fn put(&self, entry: &CachedResponse) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        inner
            .namespaces
            .entry(entry.namespace.clone())
            .or_default()
            .insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    async fn put_all(&self, entries: &[CachedResponse]) -> Result<(), Error> {
        // Single write guard, so readers never observe a partial batch.
        let mut inner = self.inner.write().await;
        for entry in entries {
            inner
                .namespaces
                .entry(entry.namespace.clone())
                .or_default()
                .insert(entry.key.clone(), entry.clone());
        }
        Ok(())
    }

    async fn lookup(&self, namespace: &str, method: &str, url: &str) -> Result<Option<CachedResponse>, Error> {
        let key = compute_cache_key(method, url);
        let inner = self.inner.read().await;
        Ok(inner
            .namespaces
            .get(namespace)
            .and_then(|entries| entries.get(&key))
            .cloned())
    }

    async fn stats(&self) -> Result<Vec<NamespaceStats>, Error> {
        let inner = self.inner.read().await;
        Ok(inner
            .namespaces
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(name, entries)| NamespaceStats {
                namespace: name.clone(),
                entries: entries.len() as u64,
                bytes: entries.values().map(|e| e.body.len() as u64).sum(),
            })
            .collect())
    }

    async fn enqueue(&self, tag: &str, payload: &serde_json::Value) -> Result<i64, Error> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.queue.insert(
            id,
            PendingSubmission {
                id,
                tag: tag.to_string(),
                payload: payload.clone(),
                created_at: chrono::Utc::now().to_rfc3339(),
                attempts: 0,
                last_error: None,
            },
        );
        Ok(id)
    }

    async fn pending(&self, tag: &str) -> Result<Vec<PendingSubmission>, Error> {
        let inner = self.inner.read().await;
        Ok(inner.queue.values().filter(|s| s.tag == tag).cloned().collect())
    }

    async fn remove_submission(&self, id: i64) -> Result<bool, Error> {
        let mut inner = self.inner.write().await;
        Ok(inner.queue.remove(&id).is_some())
    }

    async fn record_failure(&self, id: i64, error: &str) -> Result<u32, Error> {
        let mut inner = self.inner.write().await;
        let submission = inner
            .queue
            .get_mut(&id)
            .ok_or_else(|| Error::CacheMiss(format!("submission {id}")))?;
        submission.attempts += 1;
        submission.last_error = Some(error.to_string());
        Ok(submission.attempts)
    }

    async fn lifecycle(&self, namespace: &str) -> Result<Option<Lifecycle>, Error> {
        Ok(self.inner.read().await.lifecycle.get(namespace).copied())
    }

    async fn set_lifecycle(&self, namespace: &str, state: Lifecycle) -> Result<(), Error> {
        self.inner.write().await.lifecycle.insert(namespace.to_string(), state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::ResponseType;
    use serde_json::json;

    fn make_entry(namespace: &str, url: &str, body: &[u8]) -> CachedResponse {
        CachedResponse::new(namespace, "GET", url, 200, Vec::new(), ResponseType::Basic, body.to_vec())
    }

    #[tokio::test]
    async fn test_put_lookup_and_stats() {
        let store = MemoryStore::new();
        store.put(&make_entry("portfolio-v1", "http://localhost:3000/", b"abc")).await.unwrap();
        store
            .put_all(&[
                make_entry("portfolio-v1", "http://localhost:3000/app.js", b"js"),
                make_entry("portfolio-v0", "http://localhost:3000/", b"old"),
            ])
            .await
            .unwrap();

        let hit = store.lookup("portfolio-v1", "GET", "http://localhost:3000/").await.unwrap();
        assert_eq!(hit.unwrap().body, b"abc");
        assert!(store.lookup("portfolio-v1", "POST", "http://localhost:3000/").await.unwrap().is_none());

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[1], NamespaceStats { namespace: "portfolio-v1".into(), entries: 2, bytes: 5 });
    }

    #[tokio::test]
    async fn test_delete_namespace() {
        let store = MemoryStore::new();
        store.put(&make_entry("portfolio-v0", "http://localhost:3000/", b"old")).await.unwrap();

        store.set_lifecycle("portfolio-v0", Lifecycle::Activated).await.unwrap();

        assert!(store.delete_namespace("portfolio-v0").await.unwrap());
        assert_eq!(store.lifecycle("portfolio-v0").await.unwrap(), None);
        assert!(!store.delete_namespace("portfolio-v0").await.unwrap());
        assert!(store.namespaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_queue_roundtrip() {
        let store = MemoryStore::new();
        let a = store.enqueue("contact-form-sync", &json!({"n": 1})).await.unwrap();
        let b = store.enqueue("contact-form-sync", &json!({"n": 2})).await.unwrap();

        assert_eq!(store.record_failure(a, "offline").await.unwrap(), 1);
        assert!(store.remove_submission(b).await.unwrap());

        let pending = store.pending("contact-form-sync").await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, a);
        assert_eq!(pending[0].last_error.as_deref(), Some("offline"));
    }
}
