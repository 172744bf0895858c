//! Middleware layer.
//!
//! A middleware sits between the server and a handler. It receives the
//! request by value together with a [`Next`] continuation, may derive a new
//! [`Scope`](crate::Scope) or stage a response header, and hands the request
//! on with [`Next::run`]. `Next` is consumed by `run`, so the rest of the
//! chain is entered at most once per request. Every built-in middleware enters
//! it exactly once. A custom stage may answer on its own instead; headers
//! staged by the stages before it still reach that response.
//!
//! Composition is an ordered list, outermost first:
//!
//! ```rust
//! use reqtrail::middleware::{self, Chain, RequestIdLayer};
//! use reqtrail::{Logger, Request, Response};
//! use tracing::Level;
//!
//! async fn hello(req: Request) -> Response {
//!     req.logger().info("hello");
//!     Response::text("hi")
//! }
//!
//! let service = Chain::new()
//!     .with(middleware::new_handler(Logger::new(Level::INFO)))
//!     .with(RequestIdLayer::new("req_id", "X-Request-ID"))
//!     .with(middleware::method("method"))
//!     .with(middleware::url("url"))
//!     .then(hello);
//! # let _ = service;
//! ```
//!
//! The same list can be put in front of every route with
//! [`Router::with`](crate::Router::with).
//!
//! Fields attached later replace same-named fields attached earlier. Distinct
//! keys never interfere, whatever the order.

use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::request::Request;

mod access;
mod field;
mod inject;
mod request_id;

pub use access::{AccessLog, access_log};
pub use field::{BoxedExtract, Extract, FieldLayer, header, method, referer, remote_addr, request_line, url, user_agent};
pub use inject::{Inject, new_handler};
pub use request_id::{RequestIdLayer, id_from_request};

/// One stage of a middleware chain.
///
/// Implementations are shared across concurrent requests, so they hold
/// configuration only; all per-request state travels in the [`Request`].
///
/// ```rust
/// use reqtrail::middleware::{Middleware, Next};
/// use reqtrail::{BoxFuture, Request};
///
/// struct Tenant;
///
/// impl Middleware for Tenant {
///     fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
///         if let Some(tenant) = req.header("x-tenant").map(str::to_owned) {
///             req.attach_logger(req.logger().with("tenant", tenant));
///         }
///         next.run(req)
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

// ── Next ──────────────────────────────────────────────────────────────────────

/// The remainder of a chain: the stages after the current one plus the
/// handler at the end.
#[derive(Clone)]
pub struct Next {
    stack: Arc<[BoxedMiddleware]>,
    index: usize,
    endpoint: BoxedHandler,
}

impl Next {
    pub(crate) fn new(stack: Arc<[BoxedMiddleware]>, endpoint: BoxedHandler) -> Self {
        Self { stack, index: 0, endpoint }
    }

    /// Passes `req` to the next stage.
    ///
    /// Headers staged on the request so far are folded into whatever response
    /// comes back, whether the handler produced it or a later stage answered
    /// on its own.
    pub fn run(self, mut req: Request) -> BoxFuture {
        match self.stack.get(self.index) {
            Some(stage) => {
                let stage = Arc::clone(stage);
                let next = Self { index: self.index + 1, ..self };
                if req.response_headers.is_empty() {
                    return stage.handle(req, next);
                }
                let staged = req.response_headers.clone();
                let fut = stage.handle(req, next);
                Box::pin(async move {
                    let mut res = fut.await;
                    res.merge_staged(staged);
                    res
                })
            }
            None => {
                let staged = std::mem::take(&mut req.response_headers);
                let fut = self.endpoint.call(req);
                Box::pin(async move {
                    let mut res = fut.await;
                    res.merge_staged(staged);
                    res
                })
            }
        }
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// An ordered list of middlewares. The first one added is entered first.
#[derive(Clone)]
pub struct Chain {
    stack: Arc<[BoxedMiddleware]>,
}

impl Chain {
    pub fn new() -> Self {
        Self { stack: Arc::from(Vec::new()) }
    }

    /// Appends `middleware` as the innermost stage so far.
    pub fn with(self, middleware: impl Middleware) -> Self {
        let mut stack = self.stack.to_vec();
        stack.push(Arc::new(middleware));
        Self { stack: stack.into() }
    }

    pub fn len(&self) -> usize { self.stack.len() }
    pub fn is_empty(&self) -> bool { self.stack.is_empty() }

    /// Wraps `endpoint` in the chain.
    pub fn then(self, endpoint: impl Handler) -> Service {
        Service { next: Next::new(self.stack, endpoint.into_boxed_handler()) }
    }

    pub(crate) fn run(&self, req: Request, endpoint: BoxedHandler) -> BoxFuture {
        Next::new(Arc::clone(&self.stack), endpoint).run(req)
    }
}

impl Default for Chain {
    fn default() -> Self { Self::new() }
}

/// A handler wrapped in a [`Chain`]. Cheap to clone.
#[derive(Clone)]
pub struct Service {
    next: Next,
}

impl Service {
    /// Runs one request through every stage and the handler.
    pub fn call(&self, req: Request) -> BoxFuture {
        self.next.clone().run(req)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;

    use super::*;
    use crate::response::Response;

    /// Records its name into the request scope trail, then delegates.
    struct Mark(&'static str);

    #[derive(Clone, Default)]
    struct Trail(Vec<&'static str>);

    impl Middleware for Mark {
        fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
            let name = self.0;
            req.map_scope(|scope| {
                let mut trail = scope.get::<Trail>().cloned().unwrap_or_default();
                trail.0.push(name);
                scope.insert(trail)
            });
            next.run(req)
        }
    }

    fn get(uri: &str) -> Request {
        http::Request::builder().uri(uri).body(Bytes::new()).unwrap().into()
    }

    #[tokio::test]
    async fn stages_run_outermost_first_and_handler_last() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let service = Chain::new()
            .with(Mark("a"))
            .with(Mark("b"))
            .with(Mark("c"))
            .then(move |req: Request| {
                let sink = Arc::clone(&sink);
                async move {
                    let trail = req.scope().get::<Trail>().cloned().unwrap_or_default();
                    sink.lock().unwrap().extend(trail.0);
                    Response::text("done")
                }
            });

        let res = service.call(get("/")).await;
        assert_eq!(res.body(), b"done");
        assert_eq!(*seen.lock().unwrap(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn empty_chain_calls_the_handler() {
        let service = Chain::new().then(|_req: Request| async { "bare" });
        assert_eq!(service.call(get("/")).await.body(), b"bare");
    }

    #[tokio::test]
    async fn service_is_reusable_across_requests() {
        let service = Chain::new().with(Mark("only")).then(|req: Request| async move {
            req.scope().get::<Trail>().map(|t| t.0.len()).unwrap_or(0).to_string()
        });
        for _ in 0..3 {
            assert_eq!(service.call(get("/")).await.body(), b"1");
        }
    }

    #[tokio::test]
    async fn staged_headers_reach_the_response() {
        struct Stage;
        impl Middleware for Stage {
            fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
                req.set_response_header("x-staged", "yes");
                next.run(req)
            }
        }

        let service = Chain::new().with(Stage).then(|_req: Request| async { "ok" });
        let res = service.call(get("/")).await;
        assert_eq!(res.header("x-staged"), Some("yes"));
    }

    #[tokio::test]
    async fn staged_headers_survive_a_stage_that_answers_itself() {
        struct Stage;
        impl Middleware for Stage {
            fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
                req.set_response_header("x-staged", "yes");
                next.run(req)
            }
        }

        struct Deny;
        impl Middleware for Deny {
            fn handle(&self, _req: Request, _next: Next) -> BoxFuture {
                Box::pin(async { Response::status(crate::status::Status::Unauthorized) })
            }
        }

        let service = Chain::new()
            .with(Stage)
            .with(Mark("between"))
            .with(Deny)
            .then(|_req: Request| async { "unreachable" });
        let res = service.call(get("/")).await;

        assert_eq!(res.status_code(), 401);
        assert_eq!(res.header("x-staged"), Some("yes"));
    }
}
