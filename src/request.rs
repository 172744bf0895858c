//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, Uri};

use crate::id::RequestId;
use crate::logger::Logger;
use crate::scope::Scope;

/// An incoming HTTP request, as seen by middlewares and handlers.
///
/// Besides the usual method / URI / headers / body, a request carries:
///
/// - the peer address as text (`"203.0.113.7:51234"`), set by the server;
/// - its [`Scope`], where the request [`Logger`] and [`RequestId`] live;
/// - response headers staged by middlewares, merged into whatever
///   [`Response`](crate::Response) the handler eventually returns.
pub struct Request {
    pub(crate) method: http::Method,
    pub(crate) uri: Uri,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) remote_addr: String,
    pub(crate) scope: Scope,
    pub(crate) response_headers: Vec<(String, String)>,
}

impl Request {
    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes, remote_addr: String) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: HashMap::new(),
            remote_addr,
            scope: Scope::new(),
            response_headers: Vec::new(),
        }
    }

    /// Sets the remote address, as a transport would.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = addr.into();
        self
    }

    pub fn method(&self) -> &str { self.method.as_str() }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn remote_addr(&self) -> &str { &self.remote_addr }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    // ── Scope ─────────────────────────────────────────────────────────────────

    pub fn scope(&self) -> &Scope { &self.scope }

    /// Replaces the scope with `f(scope)`.
    pub fn map_scope(&mut self, f: impl FnOnce(Scope) -> Scope) {
        self.scope = f(std::mem::take(&mut self.scope));
    }

    /// The logger attached to this request, or the disabled logger.
    pub fn logger(&self) -> Logger {
        self.scope.lookup()
    }

    /// Re-publishes `logger` as this request's logger.
    pub fn attach_logger(&mut self, logger: Logger) {
        self.map_scope(|scope| scope.attach(logger));
    }

    /// The id assigned by [`RequestIdLayer`](crate::middleware::RequestIdLayer), if any.
    pub fn request_id(&self) -> Option<RequestId> {
        self.scope.request_id()
    }

    // ── Staged response headers ───────────────────────────────────────────────

    /// Stages a header for the response to this request, replacing any staged
    /// header of the same name. A header the handler sets itself wins.
    pub fn set_response_header(&mut self, name: &str, value: &str) {
        self.response_headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.response_headers.push((name.to_owned(), value.to_owned()));
    }

    pub fn response_headers(&self) -> &[(String, String)] {
        &self.response_headers
    }
}

/// Wraps an already-buffered `http` request. The remote address starts empty.
impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::from_parts(parts, body, String::new())
    }
}
