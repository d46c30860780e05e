//! Offline cache controller.
//!
//! The controller reacts to lifecycle events delivered by a host:
//!
//! - `Install`: fetch the precache manifest and store it atomically
//! - `Activate`: drop every namespace but the current one, then start intercepting
//! - `Fetch`: cache-first for static assets, network-first for API routes
//! - `Sync`: resend queued offline submissions
//! - `Push` / `NotificationClick`: describe and route notifications
//!
//! Handlers return a [`HandledEvent`]. Best-effort cache writes made while
//! answering a request are spawned and collected in its [`WaitUntil`], so the
//! response never waits for them.

pub mod classify;
pub mod notify;
pub mod strategy;
pub mod sync;

use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::join_all;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use url::Url;

use folio_core::{AppConfig, CacheStore, CachedResponse, Error};

use crate::fetch::{Network, Request, Response, resolve, same_origin};

pub use classify::{RequestClass, Routes, classify};
pub use folio_core::Lifecycle;
pub use notify::Notification;
pub use sync::{SubmitOutcome, SyncReport};

/// Events delivered by the host.
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Sync { tag: String },
    Push { payload: Option<Bytes> },
    NotificationClick { notification: Notification },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Install => "install",
            Event::Activate => "activate",
            Event::Fetch(_) => "fetch",
            Event::Sync { .. } => "sync",
            Event::Push { .. } => "push",
            Event::NotificationClick { .. } => "notificationclick",
        }
    }
}

/// What a handler produced.
#[derive(Debug)]
pub enum EventOutcome {
    Installed { cached: usize },
    Activated { deleted: Vec<String> },
    /// Answer the intercepted request with this response.
    Response(Response),
    /// Not intercepted; the host should perform the request itself.
    Passthrough,
    Synced(SyncReport),
    Notification(Notification),
    /// Open or focus a window at this URL.
    OpenWindow(Url),
    /// Event not addressed to this controller (e.g. a foreign sync tag).
    Ignored,
}

/// Background work an event asked the host to wait for.
#[derive(Debug, Default)]
pub struct WaitUntil {
    tasks: Vec<JoinHandle<()>>,
}

impl WaitUntil {
    pub(crate) fn push(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every task to finish. Task failures are logged, never returned.
    pub async fn settle(self) {
        for result in join_all(self.tasks).await {
            if let Err(e) = result {
                tracing::warn!("background cache task failed: {e}");
            }
        }
    }
}

/// Outcome of one event plus the work it extended itself with.
#[derive(Debug)]
pub struct HandledEvent {
    pub outcome: EventOutcome,
    pub wait_until: WaitUntil,
}

impl HandledEvent {
    pub(crate) fn immediate(outcome: EventOutcome) -> Self {
        Self { outcome, wait_until: WaitUntil::default() }
    }
}

/// The cache controller.
///
/// Generic over its storage and network so tests can swap in stubs.
pub struct CacheController<S, N> {
    config: AppConfig,
    store: Arc<S>,
    network: Arc<N>,
    origin: Url,
    namespace: String,
    precache: Vec<Url>,
    root_url: Url,
    sync_url: Url,
    lifecycle: RwLock<Lifecycle>,
}

impl<S, N> CacheController<S, N>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    /// Build a controller for `config` and resume its saved lifecycle state.
    ///
    /// A controller reopened over an activated namespace intercepts
    /// immediately, without installing again.
    pub async fn open(config: AppConfig, store: S, network: N) -> Result<Self, Error> {
        let controller = Self::new(config, store, network)?;
        controller.resume().await?;
        Ok(controller)
    }

    /// Build a controller for `config` in the `Registered` state.
    ///
    /// Resolves the origin, precache manifest, root document and sync endpoint up front.
    pub fn new(config: AppConfig, store: S, network: N) -> Result<Self, Error> {
        Self::with_shared(config, Arc::new(store), Arc::new(network))
    }

    /// Like [`new`](Self::new), for a store or network shared with other owners.
    pub fn with_shared(config: AppConfig, store: Arc<S>, network: Arc<N>) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let resolve_url = |input: &str| resolve(input, &origin).map_err(|e| Error::InvalidUrl(format!("{input}: {e}")));

        let precache = config
            .precache_urls
            .iter()
            .map(|u| match resolve_url(u)? {
                resolved if same_origin(&resolved, &origin) => Ok(resolved),
                _ => Err(Error::InvalidUrl(format!("{u}: precache URL is not on {origin}"))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let root_url = resolve_url(&config.root_document)?;
        let sync_url = resolve_url(&config.sync_endpoint)?;
        let namespace = config.current_namespace();

        Ok(Self {
            config,
            store,
            network,
            origin,
            namespace,
            precache,
            root_url,
            sync_url,
            lifecycle: RwLock::new(Lifecycle::Registered),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Name of the namespace this controller reads and writes.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.read().await
    }

    /// Load the lifecycle state saved for the current namespace.
    pub async fn resume(&self) -> Result<Lifecycle, Error> {
        let mut lifecycle = self.lifecycle.write().await;
        if let Some(saved) = self.store.lifecycle(&self.namespace).await? {
            *lifecycle = saved;
            tracing::info!(namespace = %self.namespace, state = saved.as_str(), "resumed saved lifecycle");
        }
        Ok(*lifecycle)
    }

    /// Dispatch an event to its handler.
    pub async fn handle(&self, event: Event) -> Result<HandledEvent, Error> {
        tracing::debug!(event = event.name(), "dispatching event");
        match event {
            Event::Install => {
                let cached = self.install().await?;
                Ok(HandledEvent::immediate(EventOutcome::Installed { cached }))
            }
            Event::Activate => {
                let deleted = self.activate().await?;
                Ok(HandledEvent::immediate(EventOutcome::Activated { deleted }))
            }
            Event::Fetch(request) => self.intercept(request).await,
            Event::Sync { tag } => {
                if tag != self.config.sync_tag {
                    tracing::debug!(tag = %tag, "ignoring sync for unknown tag");
                    return Ok(HandledEvent::immediate(EventOutcome::Ignored));
                }
                let report = self.sync_submissions().await?;
                Ok(HandledEvent::immediate(EventOutcome::Synced(report)))
            }
            Event::Push { payload } => {
                let notification = self.push_notification(payload.as_deref());
                Ok(HandledEvent::immediate(EventOutcome::Notification(notification)))
            }
            Event::NotificationClick { notification } => {
                let target = self.notification_target(&notification);
                Ok(HandledEvent::immediate(EventOutcome::OpenWindow(target)))
            }
        }
    }

    /// Fetch every precache URL and store them all in the current namespace.
    ///
    /// Any transport failure or non-2xx status fails the whole step and
    /// nothing is written. Returns the number of entries stored.
    pub async fn install(&self) -> Result<usize, Error> {
        tracing::info!(namespace = %self.namespace, assets = self.precache.len(), "installing");

        let fetches = self.precache.iter().map(|url| {
            let request = Request::get(url.clone());
            async move { (url, self.network.fetch(&request).await) }
        });

        let mut entries: Vec<CachedResponse> = Vec::with_capacity(self.precache.len());
        let mut failures = Vec::new();
        for (url, result) in join_all(fetches).await {
            match result {
                Ok(response) if response.is_ok() => entries.push(response.to_cached(&self.namespace, "GET", url)),
                Ok(response) => failures.push(format!("{url} (status {})", response.status.as_u16())),
                Err(e) => failures.push(format!("{url} ({e})")),
            }
        }

        if !failures.is_empty() {
            tracing::warn!(failed = failures.len(), "install aborted");
            return Err(Error::InstallFailed(failures.join(", ")));
        }

        self.store
            .put_all(&entries)
            .await
            .map_err(|e| Error::InstallFailed(format!("storing precache: {e}")))?;

        let mut lifecycle = self.lifecycle.write().await;
        if *lifecycle < Lifecycle::Installed {
            self.store
                .set_lifecycle(&self.namespace, Lifecycle::Installed)
                .await
                .map_err(|e| Error::InstallFailed(format!("saving lifecycle: {e}")))?;
            *lifecycle = Lifecycle::Installed;
        }

        tracing::info!(namespace = %self.namespace, cached = entries.len(), "installed");
        Ok(entries.len())
    }

    /// Delete every namespace but the current one, then claim all traffic.
    ///
    /// The lifecycle write lock is held throughout, so no request is
    /// intercepted until cleanup has finished. Returns the deleted names.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let mut lifecycle = self.lifecycle.write().await;
        if *lifecycle == Lifecycle::Registered {
            return Err(Error::NotInstalled(format!("{} has not been installed", self.namespace)));
        }

        let mut deleted = Vec::new();
        for name in self.store.namespaces().await? {
            if name == self.namespace {
                continue;
            }
            if self.store.delete_namespace(&name).await? {
                tracing::info!(namespace = %name, "deleted stale namespace");
                deleted.push(name);
            }
        }

        self.store.set_lifecycle(&self.namespace, Lifecycle::Activated).await?;
        *lifecycle = Lifecycle::Activated;
        tracing::info!(namespace = %self.namespace, deleted = deleted.len(), "activated");
        Ok(deleted)
    }

    /// Spawn a best-effort write of `response` under `request`'s key.
    pub(crate) fn spawn_store(&self, request: &Request, response: &Response) -> JoinHandle<()> {
        let entry = response.to_cached(&self.namespace, request.method.as_str(), &request.url);
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.put(&entry).await {
                tracing::warn!(url = %entry.url, "cache write failed: {e}");
            }
        })
    }

    pub(crate) fn routes(&self) -> Routes<'_> {
        Routes {
            origin: &self.origin,
            api_prefix: &self.config.api_prefix,
            cacheable_api_routes: &self.config.cacheable_api_routes,
        }
    }
}
