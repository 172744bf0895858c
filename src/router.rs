//! Radix-tree request router with a middleware chain in front.
//!
//! One tree per HTTP method, O(path-length) lookup. Middlewares registered
//! with [`Router::with`] wrap every route, and also the `404` / `405`
//! fallbacks, so a request id or an access log line exists for every request
//! the server answers.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{Chain, Middleware};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
///
/// ```rust
/// use reqtrail::middleware::{self, RequestIdLayer};
/// use reqtrail::{Method, Request, Response, Router};
///
/// # async fn get_user(_: Request) -> Response { Response::text("") }
/// # async fn create_user(_: Request) -> Response { Response::text("") }
/// let app = Router::new()
///     .on(Method::Get,  "/users/{id}", get_user)
///     .on(Method::Post, "/users",      create_user)
///     .with(RequestIdLayer::x_request_id("req_id"))
///     .with(middleware::request_line("request"));
/// ```
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    chain: Chain,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), chain: Chain::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route pattern or conflicts with one
    /// already registered for `method`.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Appends `middleware` to the chain wrapping every route. The first
    /// middleware added is entered first.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.chain = self.chain.with(middleware);
        self
    }

    pub(crate) fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Routes `req` and runs it through the middleware chain.
    pub(crate) fn dispatch(&self, mut req: Request) -> BoxFuture {
        let endpoint = match req.method().parse::<Method>() {
            Ok(method) => match self.lookup(method, req.path()) {
                Some((handler, params)) => {
                    req.params = params;
                    handler
                }
                None => fallback(Status::NotFound),
            },
            Err(()) => fallback(Status::MethodNotAllowed),
        };
        self.chain.run(req, endpoint)
    }

    /// Runs `req` through the middleware chain and answers `status` without
    /// routing it.
    pub(crate) fn reject(&self, req: Request, status: Status) -> BoxFuture {
        self.chain.run(req, fallback(status))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

fn fallback(status: Status) -> BoxedHandler {
    (move |_req: Request| async move { Response::status(status) }).into_boxed_handler()
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::middleware::{RequestIdLayer, url};

    fn request(method: &str, uri: &str) -> Request {
        http::Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap().into()
    }

    async fn echo_url(req: Request) -> String {
        let id = req.param("id").unwrap_or("-").to_owned();
        format!("{id} {}", req.logger())
    }

    fn app() -> Router {
        Router::new()
            .on(Method::Get, "/users/{id}", echo_url)
            .with(RequestIdLayer::x_request_id(""))
            .with(url("url"))
    }

    #[tokio::test]
    async fn matched_route_runs_behind_the_chain() {
        let res = app().dispatch(request("GET", "/users/42")).await;

        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body(), br#"42 url="/users/42""#);
        assert!(res.header("x-request-id").is_some());
    }

    #[tokio::test]
    async fn unknown_path_is_404_and_still_gets_an_id() {
        let res = app().dispatch(request("GET", "/nope")).await;
        assert_eq!(res.status_code(), 404);
        assert!(res.header("x-request-id").is_some());
    }

    #[tokio::test]
    async fn unknown_method_is_405() {
        let res = app().dispatch(request("BREW", "/users/1")).await;
        assert_eq!(res.status_code(), 405);
    }

    #[tokio::test]
    async fn rejected_request_still_runs_the_chain() {
        let res = app().reject(request("POST", "/users/1"), Status::BadRequest).await;
        assert_eq!(res.status_code(), 400);
        assert!(res.body().is_empty());
        assert!(res.header("x-request-id").is_some());
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        let _ = Router::new()
            .on(Method::Get, "/a/{x}", echo_url)
            .on(Method::Get, "/a/{y}", echo_url);
    }
}
