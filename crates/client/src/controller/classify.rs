//! Request classification.

use reqwest::Method;
use url::Url;

use crate::fetch::same_origin;

/// How the controller treats an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Different origin: the host performs the request itself.
    CrossOrigin,
    /// Under the API prefix: network first. `cacheable` routes keep a copy for offline use.
    Api { cacheable: bool },
    /// Everything else on our origin: cache first.
    Static,
}

/// Route prefixes used by [`classify`].
#[derive(Debug, Clone)]
pub struct Routes<'a> {
    pub origin: &'a Url,
    pub api_prefix: &'a str,
    pub cacheable_api_routes: &'a [String],
}

/// Classify a request by origin, path and method.
///
/// Only `GET` API requests are cacheable; the Cache API cannot store others.
pub fn classify(method: &Method, url: &Url, routes: &Routes<'_>) -> RequestClass {
    if !same_origin(url, routes.origin) {
        return RequestClass::CrossOrigin;
    }

    let path = url.path();
    if path.starts_with(routes.api_prefix) {
        let cacheable = *method == Method::GET
            && routes
                .cacheable_api_routes
                .iter()
                .any(|route| route_matches(path, route));
        return RequestClass::Api { cacheable };
    }

    RequestClass::Static
}

/// `path` is `route` itself or below it, segment-wise.
fn route_matches(path: &str, route: &str) -> bool {
    let route = route.trim_end_matches('/');
    path.strip_prefix(route)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
