//! Base logger injection.

use crate::handler::BoxFuture;
use crate::logger::Logger;
use crate::middleware::{Middleware, Next};
use crate::request::Request;

/// Attaches a fixed base logger to every request. Usually the outermost
/// stage, so later field layers build on its threshold and static fields.
#[derive(Clone, Debug)]
pub struct Inject {
    logger: Logger,
}

impl Middleware for Inject {
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
        req.attach_logger(self.logger.clone());
        next.run(req)
    }
}

/// Injects `logger` into each request's scope.
pub fn new_handler(logger: Logger) -> Inject {
    Inject { logger }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tracing::Level;

    use super::*;
    use crate::middleware::{Chain, method};

    #[tokio::test]
    async fn injected_logger_is_the_base_for_later_fields() {
        let base = Logger::new(Level::INFO).with("service", "users");
        let service = Chain::new()
            .with(new_handler(base.clone()))
            .with(method("method"))
            .then(|req: Request| async move { req.logger().to_string() });

        let req: Request = http::Request::builder().uri("/").body(Bytes::new()).unwrap().into();
        let res = service.call(req).await;

        assert_eq!(res.body(), br#"service="users" method="GET""#);
        assert_eq!(base.fields().len(), 1);
    }
}
