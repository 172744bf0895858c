//! Request id assignment.
//!
//! [`RequestIdLayer`] makes sure a request carries exactly one [`RequestId`]
//! for its whole lifetime:
//!
//! 1. Look the id up in the request scope. If there is none, generate one and
//!    store it. The lookup always comes first, so a second layer further down
//!    the same chain reuses the id instead of minting another.
//! 2. With a non-empty field key, attach the id to the request logger.
//! 3. With a non-empty header name, stage the id as a response header.
//! 4. Delegate.
//!
//! The id is stored in step 1 even when both side effects are disabled, so
//! [`id_from_request`] always finds it downstream.
//!
//! Place the layer before any stage that might answer the request itself,
//! otherwise the header is never staged.

use http::HeaderName;

use crate::handler::BoxFuture;
use crate::id::RequestId;
use crate::middleware::{Middleware, Next};
use crate::request::Request;

/// Assigns a [`RequestId`] and optionally logs it and echoes it to the caller.
#[derive(Clone, Debug)]
pub struct RequestIdLayer {
    field_key: String,
    header_name: Option<HeaderName>,
}

impl RequestIdLayer {
    /// `field_key`: logger field for the id, `""` to skip.
    /// `header_name`: response header for the id, `""` to skip.
    ///
    /// # Panics
    ///
    /// Panics if `header_name` is not empty and not a valid header name.
    pub fn new(field_key: impl Into<String>, header_name: &str) -> Self {
        let header_name = (!header_name.is_empty()).then(|| {
            HeaderName::from_bytes(header_name.as_bytes())
                .unwrap_or_else(|e| panic!("invalid header name `{header_name}`: {e}"))
        });
        Self { field_key: field_key.into(), header_name }
    }

    /// Shorthand for the conventional `X-Request-ID` response header.
    pub fn x_request_id(field_key: impl Into<String>) -> Self {
        Self::new(field_key, "x-request-id")
    }

    fn assign(req: &mut Request) -> RequestId {
        if let Some(id) = req.request_id() {
            return id;
        }
        let id = RequestId::generate();
        req.map_scope(|scope| scope.with_request_id(id));
        id
    }
}

impl Middleware for RequestIdLayer {
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
        let id = Self::assign(&mut req);

        if !self.field_key.is_empty() {
            let logger = req.logger().with(self.field_key.as_str(), id.to_string());
            req.attach_logger(logger);
        }
        if let Some(name) = &self.header_name {
            req.set_response_header(name.as_str(), &id.to_string());
        }

        next.run(req)
    }
}

/// The id assigned to `req`, if any.
///
/// Never generates: a request that did not pass through a [`RequestIdLayer`],
/// or no request at all, yields `None`.
pub fn id_from_request(req: Option<&Request>) -> Option<RequestId> {
    req.and_then(Request::request_id)
}
