//! Scripted network and store doubles for controller tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::{StatusCode, header};
use url::Url;

use folio_core::{
    AppConfig, CacheStore, CachedResponse, Error, Lifecycle, MemoryStore, NamespaceStats, PendingSubmission,
    ResponseType,
};

use crate::controller::CacheController;
use crate::fetch::{Network, NetworkError, Request, Response};

type Responder = Box<dyn Fn(&Request) -> Result<Response, NetworkError> + Send + Sync>;

/// Serves canned responses by URL; unknown URLs are unreachable.
#[derive(Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, (u16, ResponseType, Vec<u8>)>>,
    responder: Mutex<Option<Responder>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    posted: Mutex<Vec<serde_json::Value>>,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, status: u16, body: &str) -> Self {
        self.route_typed(url, status, ResponseType::Basic, body)
    }

    pub fn route_typed(self, url: &str, status: u16, response_type: ResponseType, body: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, response_type, body.as_bytes().to_vec()));
        self
    }

    /// Answer every request with `f` instead of the route table.
    pub fn respond_with(&self, f: impl Fn(&Request) -> Result<Response, NetworkError> + Send + Sync + 'static) {
        *self.responder.lock().unwrap() = Some(Box::new(f));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// JSON bodies of every POST seen, in order.
    pub fn posted(&self) -> Vec<serde_json::Value> {
        self.posted.lock().unwrap().clone()
    }
}

pub fn response(status: u16, body: &str) -> Response {
    let mut response = Response::synthesized(StatusCode::from_u16(status).unwrap(), body.to_string());
    response.response_type = ResponseType::Basic;
    response
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(body) = &request.body
            && let Ok(value) = serde_json::from_slice(body)
        {
            self.posted.lock().unwrap().push(value);
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Connect(format!("offline: {}", request.url)));
        }

        if let Some(responder) = self.responder.lock().unwrap().as_ref() {
            return responder(request);
        }

        let routes = self.routes.lock().unwrap();
        match routes.get(request.url.as_str()) {
            Some((status, response_type, body)) => {
                let mut headers = header::HeaderMap::new();
                headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/plain"));
                Ok(Response {
                    url: Some(request.url.clone()),
                    status: StatusCode::from_u16(*status).unwrap(),
                    headers,
                    body: body.clone().into(),
                    response_type: *response_type,
                })
            }
            None => Err(NetworkError::Connect(format!("unreachable: {}", request.url))),
        }
    }
}

pub const ORIGIN: &str = "http://localhost:3000";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

/// A network serving the default precache manifest.
pub fn site() -> StubNetwork {
    StubNetwork::new()
        .route(&url("/").to_string(), 200, "<html>home</html>")
        .route(&url("/static/js/bundle.js").to_string(), 200, "console.log(1)")
        .route(&url("/static/css/main.css").to_string(), 200, "body{}")
        .route(&url("/manifest.json").to_string(), 200, "{}")
}

pub fn controller(network: &Arc<StubNetwork>) -> CacheController<MemoryStore, StubNetwork> {
    CacheController::with_shared(AppConfig::default(), Arc::new(MemoryStore::new()), Arc::clone(network)).unwrap()
}

/// A controller that has installed and activated against `network`.
pub async fn activated(network: &Arc<StubNetwork>) -> CacheController<MemoryStore, StubNetwork> {
    let controller = controller(network);
    controller.install().await.unwrap();
    controller.activate().await.unwrap();
    controller
}

/// A store whose entry and queue operations always fail.
///
/// Its lifecycle is always `Activated`, so a controller opened over it
/// intercepts without installing.
#[derive(Debug, Default)]
pub struct FailingStore;

fn unavailable() -> Error {
    Error::CorruptEntry("store unavailable".into())
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn namespaces(&self) -> Result<Vec<String>, Error> {
        Err(unavailable())
    }

    async fn delete_namespace(&self, _namespace: &str) -> Result<bool, Error> {
        Err(unavailable())
    }

    async fn put(&self, _entry: &CachedResponse) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn put_all(&self, _entries: &[CachedResponse]) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn lookup(&self, _namespace: &str, _method: &str, _url: &str) -> Result<Option<CachedResponse>, Error> {
        Err(unavailable())
    }

    async fn stats(&self) -> Result<Vec<NamespaceStats>, Error> {
        Err(unavailable())
    }

    async fn enqueue(&self, _tag: &str, _payload: &serde_json::Value) -> Result<i64, Error> {
        Err(unavailable())
    }

    async fn pending(&self, _tag: &str) -> Result<Vec<PendingSubmission>, Error> {
        Err(unavailable())
    }

    async fn remove_submission(&self, _id: i64) -> Result<bool, Error> {
        Err(unavailable())
    }

    async fn record_failure(&self, _id: i64, _error: &str) -> Result<u32, Error> {
        Err(unavailable())
    }

    async fn lifecycle(&self, _namespace: &str) -> Result<Option<Lifecycle>, Error> {
        Ok(Some(Lifecycle::Activated))
    }

    async fn set_lifecycle(&self, _namespace: &str, _state: Lifecycle) -> Result<(), Error> {
        Ok(())
    }
}
