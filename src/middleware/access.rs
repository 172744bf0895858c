//! Access logging.
//!
//! Emits one event per request through the request's own [`Logger`] once the
//! inner stages have produced a response. Only the status code is read; the
//! body is never touched. Add it as the innermost layer so the event carries
//! every field the outer layers attached.

use std::time::Instant;

use tracing::Level;

use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;

/// Logs `status` and `duration_ms` at INFO after each request.
#[derive(Clone, Copy, Debug, Default)]
pub struct AccessLog;

pub fn access_log() -> AccessLog {
    AccessLog
}

impl Middleware for AccessLog {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let logger = req.logger();
        let started = Instant::now();
        let fut = next.run(req);
        Box::pin(async move {
            let res = fut.await;
            let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            logger
                .with("status", res.status_code())
                .with("duration_ms", elapsed)
                .log(Level::INFO, "request completed");
            res
        })
    }
}
