//! Request interception strategies.
//!
//! - API routes: network first, falling back to the last stored copy, then
//!   to the fixed offline payload.
//! - Static assets: cache first, then network, then the offline fallbacks
//!   (root document for navigations, empty placeholder for images).

use reqwest::{Method, StatusCode};
use url::Url;

use folio_core::{CacheStore, Error, ResponseType};

use super::{CacheController, EventOutcome, HandledEvent, Lifecycle, RequestClass, WaitUntil, classify};
use crate::fetch::{Network, Request, Response};

impl<S, N> CacheController<S, N>
where
    S: CacheStore + 'static,
    N: Network + 'static,
{
    /// Handle an intercepted request.
    ///
    /// Requests arriving before activation has completed are passed through.
    pub async fn intercept(&self, request: Request) -> Result<HandledEvent, Error> {
        if *self.lifecycle.read().await != Lifecycle::Activated {
            tracing::debug!(url = %request.url, "not activated; passing through");
            return Ok(HandledEvent::immediate(EventOutcome::Passthrough));
        }

        match classify(&request.method, &request.url, &self.routes()) {
            RequestClass::CrossOrigin => Ok(HandledEvent::immediate(EventOutcome::Passthrough)),
            RequestClass::Api { cacheable } => Ok(self.network_first(request, cacheable).await),
            RequestClass::Static => self.cache_first(request).await,
        }
    }

    async fn network_first(&self, request: Request, cacheable: bool) -> HandledEvent {
        match self.network.fetch(&request).await {
            Ok(response) => {
                let mut wait_until = WaitUntil::default();
                if cacheable && response.is_ok() {
                    wait_until.push(self.spawn_store(&request, &response));
                }
                HandledEvent { outcome: EventOutcome::Response(response), wait_until }
            }
            Err(e) => {
                tracing::debug!(url = %request.url, "api fetch failed: {e}");
                if cacheable && let Some(cached) = self.cached(request.method.as_str(), &request.url).await {
                    tracing::debug!(url = %request.url, "serving cached api response");
                    return HandledEvent::immediate(EventOutcome::Response(cached));
                }
                HandledEvent::immediate(EventOutcome::Response(Response::offline()))
            }
        }
    }

    async fn cache_first(&self, request: Request) -> Result<HandledEvent, Error> {
        if let Some(cached) = self.cached(request.method.as_str(), &request.url).await {
            tracing::debug!(url = %request.url, "cache hit");
            return Ok(HandledEvent::immediate(EventOutcome::Response(cached)));
        }
        tracing::debug!(url = %request.url, "cache miss");

        match self.network.fetch(&request).await {
            Ok(response) => {
                let mut wait_until = WaitUntil::default();
                if request.method == Method::GET
                    && response.status == StatusCode::OK
                    && response.response_type == ResponseType::Basic
                {
                    wait_until.push(self.spawn_store(&request, &response));
                }
                Ok(HandledEvent { outcome: EventOutcome::Response(response), wait_until })
            }
            Err(e) => {
                if request.is_navigation() {
                    if let Some(cached) = self.cached("GET", &self.root_url).await {
                        tracing::debug!(url = %request.url, "offline; serving root document");
                        return Ok(HandledEvent::immediate(EventOutcome::Response(cached)));
                    }
                } else if request.is_image() {
                    tracing::debug!(url = %request.url, "offline; serving empty image");
                    return Ok(HandledEvent::immediate(EventOutcome::Response(Response::no_content())));
                }
                Err(e.into())
            }
        }
    }

    /// Stored copy of `method url` in the current namespace.
    ///
    /// Lookup failures and undecodable entries count as misses.
    async fn cached(&self, method: &str, url: &Url) -> Option<Response> {
        match self.store.lookup(&self.namespace, method, url.as_str()).await {
            Ok(Some(entry)) => match Response::try_from(entry) {
                Ok(response) => Some(response),
                Err(e) => {
                    tracing::warn!(url = %url, "ignoring unreadable cache entry: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(url = %url, "cache lookup failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::header;

    use super::*;
    use crate::fetch::Destination;
    use crate::testing::{FailingStore, StubNetwork, activated, controller, response, site, url};
    use folio_core::{AppConfig, OFFLINE_MESSAGE};

    fn into_response(handled: HandledEvent) -> Response {
        match handled.outcome {
            EventOutcome::Response(response) => response,
            other => panic!("expected a response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_precached_asset_served_without_network() {
        let network = Arc::new(site());
        let controller = activated(&network).await;
        let calls = network.calls();

        let handled = controller.intercept(Request::get(url("/static/js/bundle.js"))).await.unwrap();
        assert!(handled.wait_until.is_empty());
        let response = into_response(handled);
        assert_eq!(&response.body[..], b"console.log(1)");
        assert_eq!(network.calls(), calls);
    }

    #[tokio::test]
    async fn test_fetched_asset_cached_for_offline_use() {
        let network = Arc::new(site().route(url("/static/media/hero.png").as_str(), 200, "png"));
        let controller = activated(&network).await;

        let first = controller.intercept(Request::get(url("/static/media/hero.png"))).await.unwrap();
        assert_eq!(first.wait_until.len(), 1);
        first.wait_until.settle().await;

        network.set_offline(true);
        let second = into_response(controller.intercept(Request::get(url("/static/media/hero.png"))).await.unwrap());
        assert_eq!(second.status, StatusCode::OK);
        assert_eq!(&second.body[..], b"png");
    }

    #[tokio::test]
    async fn test_non_basic_or_error_responses_not_cached() {
        let network = Arc::new(
            site()
                .route(url("/missing.js").as_str(), 404, "nope")
                .route_typed(url("/redirected.css").as_str(), 200, ResponseType::Opaque, "css"),
        );
        let controller = activated(&network).await;

        let missing = controller.intercept(Request::get(url("/missing.js"))).await.unwrap();
        assert!(missing.wait_until.is_empty());
        assert_eq!(into_response(missing).status, StatusCode::NOT_FOUND);

        let opaque = controller.intercept(Request::get(url("/redirected.css"))).await.unwrap();
        assert!(opaque.wait_until.is_empty());
    }

    #[tokio::test]
    async fn test_api_network_first_then_cached_fallback() {
        let network = Arc::new(site().route(url("/api/portfolio").as_str(), 200, r#"{"projects":[]}"#));
        let controller = activated(&network).await;

        let online = controller.intercept(Request::get(url("/api/portfolio"))).await.unwrap();
        assert_eq!(online.wait_until.len(), 1);
        online.wait_until.settle().await;

        network.set_offline(true);
        let offline = into_response(controller.intercept(Request::get(url("/api/portfolio"))).await.unwrap());
        assert_eq!(offline.status, StatusCode::OK);
        assert_eq!(&offline.body[..], br#"{"projects":[]}"#);
    }

    #[tokio::test]
    async fn test_api_always_tries_network_first() {
        let network = Arc::new(site().route(url("/api/portfolio").as_str(), 200, "v1"));
        let controller = activated(&network).await;
        controller.intercept(Request::get(url("/api/portfolio"))).await.unwrap().wait_until.settle().await;

        network.respond_with(|_| Ok(response(200, "v2")));
        let fresh = into_response(controller.intercept(Request::get(url("/api/portfolio"))).await.unwrap());
        assert_eq!(&fresh.body[..], b"v2");
    }

    #[tokio::test]
    async fn test_api_offline_payload_for_uncached_route() {
        let network = Arc::new(site());
        let controller = activated(&network).await;
        network.set_offline(true);

        let response = into_response(controller.intercept(Request::get(url("/api/health"))).await.unwrap());
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.content_type(), Some("application/json"));
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body, serde_json::json!({"error": "Offline", "message": OFFLINE_MESSAGE}));
    }

    #[tokio::test]
    async fn test_api_error_status_passed_through_uncached() {
        let network = Arc::new(site().route(url("/api/portfolio").as_str(), 500, "boom"));
        let controller = activated(&network).await;

        let handled = controller.intercept(Request::get(url("/api/portfolio"))).await.unwrap();
        assert!(handled.wait_until.is_empty());
        assert_eq!(into_response(handled).status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_offline_navigation_serves_root_document() {
        let network = Arc::new(site());
        let controller = activated(&network).await;
        network.set_offline(true);

        let response = into_response(controller.intercept(Request::navigate(url("/about"))).await.unwrap());
        assert_eq!(&response.body[..], b"<html>home</html>");
    }

    #[tokio::test]
    async fn test_offline_image_gets_empty_placeholder() {
        let network = Arc::new(site());
        let controller = activated(&network).await;
        network.set_offline(true);

        let by_destination = Request::get(url("/img/avatar.png")).with_destination(Destination::Image);
        let response = into_response(controller.intercept(by_destination).await.unwrap());
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(response.body.is_empty());

        let by_accept = Request::get(url("/img/logo.svg"))
            .with_header(header::ACCEPT, header::HeaderValue::from_static("image/avif,image/webp,*/*"));
        let response = into_response(controller.intercept(by_accept).await.unwrap());
        assert_eq!(response.status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_offline_other_asset_is_error() {
        let network = Arc::new(site());
        let controller = activated(&network).await;
        network.set_offline(true);

        let result = controller.intercept(Request::get(url("/static/js/chunk-42.js"))).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_cross_origin_passthrough() {
        let network = Arc::new(site());
        let controller = activated(&network).await;
        let calls = network.calls();

        let request = Request::get(Url::parse("https://fonts.gstatic.com/s/inter.woff2").unwrap());
        let handled = controller.intercept(request).await.unwrap();
        assert!(matches!(handled.outcome, EventOutcome::Passthrough));
        assert_eq!(network.calls(), calls);
    }

    #[tokio::test]
    async fn test_passthrough_before_activation() {
        let network = Arc::new(site());
        let controller = controller(&network);
        controller.install().await.unwrap();

        let handled = controller.intercept(Request::get(url("/static/js/bundle.js"))).await.unwrap();
        assert!(matches!(handled.outcome, EventOutcome::Passthrough));
    }

    #[tokio::test]
    async fn test_post_to_api_never_cached() {
        let network = Arc::new(site());
        let controller = activated(&network).await;
        network.respond_with(|_| Ok(response(201, "ok")));

        let request = Request::post_json(url("/api/portfolio"), &serde_json::json!({"a": 1})).unwrap();
        let handled = controller.intercept(request).await.unwrap();
        assert!(handled.wait_until.is_empty());
    }

    async fn over_failing_store(network: &Arc<StubNetwork>) -> CacheController<FailingStore, StubNetwork> {
        let controller =
            CacheController::with_shared(AppConfig::default(), Arc::new(FailingStore), Arc::clone(network)).unwrap();
        assert_eq!(controller.resume().await.unwrap(), Lifecycle::Activated);
        controller
    }

    #[tokio::test]
    async fn test_store_failures_do_not_affect_static_response() {
        let network = Arc::new(site());
        let controller = over_failing_store(&network).await;

        let HandledEvent { outcome, wait_until } =
            controller.intercept(Request::get(url("/static/js/bundle.js"))).await.unwrap();
        assert_eq!(wait_until.len(), 1);
        wait_until.settle().await;
        let EventOutcome::Response(response) = outcome else { panic!("expected a response") };
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(&response.body[..], b"console.log(1)");
    }

    #[tokio::test]
    async fn test_store_failures_do_not_affect_api_response() {
        let network = Arc::new(site().route(url("/api/portfolio").as_str(), 200, "[]"));
        let controller = over_failing_store(&network).await;

        let HandledEvent { outcome, wait_until } =
            controller.intercept(Request::get(url("/api/portfolio"))).await.unwrap();
        assert_eq!(wait_until.len(), 1);
        wait_until.settle().await;
        let EventOutcome::Response(response) = outcome else { panic!("expected a response") };
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(&response.body[..], b"[]");

        network.set_offline(true);
        let offline = into_response(controller.intercept(Request::get(url("/api/portfolio"))).await.unwrap());
        assert_eq!(offline.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
