//! Field-attaching middlewares.
//!
//! Every constructor here is the same [`FieldLayer`] with a different
//! extraction function. Extraction returning `None` means the value is absent:
//! the logger is left exactly as it was and the request moves on.

use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;

/// Extraction function used by the built-in field layers.
pub type Extract = fn(&Request) -> Option<String>;

/// Extraction function capturing configuration, e.g. a header name.
pub type BoxedExtract = Box<dyn Fn(&Request) -> Option<String> + Send + Sync>;

/// Adds one field, `key = extract(req)`, to the request logger.
pub struct FieldLayer<F> {
    key: String,
    extract: F,
}

impl<F> FieldLayer<F>
where
    F: Fn(&Request) -> Option<String> + Send + Sync + 'static,
{
    pub fn new(key: impl Into<String>, extract: F) -> Self {
        Self { key: key.into(), extract }
    }

    pub fn key(&self) -> &str { &self.key }
}

impl<F> Middleware for FieldLayer<F>
where
    F: Fn(&Request) -> Option<String> + Send + Sync + 'static,
{
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
        if let Some(value) = (self.extract)(&req) {
            let logger = req.logger().with(self.key.as_str(), value);
            req.attach_logger(logger);
        }
        next.run(req)
    }
}

/// The request URI as received, e.g. `/foo?x=1`.
pub fn url(key: impl Into<String>) -> FieldLayer<Extract> {
    FieldLayer::new(key, extract_url as Extract)
}

/// The request method, e.g. `GET`.
pub fn method(key: impl Into<String>) -> FieldLayer<Extract> {
    FieldLayer::new(key, extract_method as Extract)
}

/// Method and URI together, e.g. `GET /foo?x=1`.
pub fn request_line(key: impl Into<String>) -> FieldLayer<Extract> {
    FieldLayer::new(key, extract_request_line as Extract)
}

/// The host part of the remote address. Skipped when the address does not
/// split into host and port, or the host is empty.
pub fn remote_addr(key: impl Into<String>) -> FieldLayer<Extract> {
    FieldLayer::new(key, extract_remote_host as Extract)
}

/// The `User-Agent` header. Skipped when missing or empty.
pub fn user_agent(key: impl Into<String>) -> FieldLayer<Extract> {
    FieldLayer::new(key, extract_user_agent as Extract)
}

/// The `Referer` header. Skipped when missing or empty.
pub fn referer(key: impl Into<String>) -> FieldLayer<Extract> {
    FieldLayer::new(key, extract_referer as Extract)
}

/// Any request header, e.g. a caller-supplied correlation id. Skipped when
/// missing, empty, or not valid UTF-8.
pub fn header(
    key: impl Into<String>,
    name: impl Into<String>,
) -> FieldLayer<BoxedExtract> {
    let name = name.into();
    let extract: BoxedExtract = Box::new(move |req: &Request| non_empty_header(req, &name));
    FieldLayer::new(key, extract)
}

fn extract_url(req: &Request) -> Option<String> {
    Some(req.uri().to_string())
}

fn extract_method(req: &Request) -> Option<String> {
    Some(req.method().to_owned())
}

fn extract_request_line(req: &Request) -> Option<String> {
    Some(format!("{} {}", req.method(), req.uri()))
}

fn extract_remote_host(req: &Request) -> Option<String> {
    split_host_port(req.remote_addr())
        .filter(|host| !host.is_empty())
        .map(str::to_owned)
}

fn extract_user_agent(req: &Request) -> Option<String> {
    non_empty_header(req, "user-agent")
}

fn extract_referer(req: &Request) -> Option<String> {
    non_empty_header(req, "referer")
}

fn non_empty_header(req: &Request, name: &str) -> Option<String> {
    req.header(name).filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Splits `host:port` or `[host]:port` and returns the host.
///
/// `None` for a missing port, an unclosed bracket, a bracket inside the
/// bracketed host, or an unbracketed host containing colons.
fn split_host_port(addr: &str) -> Option<&str> {
    let (host, port) = addr.rsplit_once(':')?;
    if port.contains(']') {
        return None;
    }
    let host = match host.strip_prefix('[') {
        Some(inner) => match inner.strip_suffix(']') {
            Some(host) if !host.contains(['[', ']']) => host,
            _ => return None,
        },
        None if host.contains([':', '[', ']']) => return None,
        None => host,
    };
    Some(host)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;

    use super::*;
    use crate::logger::{Logger, Value};
    use crate::middleware::Chain;
    use crate::response::Response;

    fn request(uri: &str, headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::builder().method("GET").uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Bytes::new()).unwrap().into()
    }

    /// Runs `req` through `chain` and returns the logger the handler saw.
    async fn logger_after(chain: Chain, req: Request) -> Logger {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let service = chain.then(move |req: Request| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock().unwrap() = Some(req.logger());
                Response::text("ok")
            }
        });
        service.call(req).await;
        let logger = seen.lock().unwrap().take();
        logger.expect("handler did not run")
    }

    fn str_field<'a>(logger: &'a Logger, key: &str) -> Option<&'a str> {
        logger.get(key).and_then(Value::as_str)
    }

    #[tokio::test]
    async fn url_and_method() {
        let chain = Chain::new().with(url("url")).with(method("method"));
        let logger = logger_after(chain, request("/foo", &[])).await;

        assert_eq!(str_field(&logger, "url"), Some("/foo"));
        assert_eq!(str_field(&logger, "method"), Some("GET"));
        assert_eq!(logger.fields().len(), 2);
    }

    #[tokio::test]
    async fn url_keeps_the_query() {
        let logger = logger_after(Chain::new().with(url("url")), request("/foo?x=1", &[])).await;
        assert_eq!(str_field(&logger, "url"), Some("/foo?x=1"));
    }

    #[tokio::test]
    async fn request_line_combines_method_and_url() {
        let logger = logger_after(
            Chain::new().with(request_line("req")),
            request("/a/b?c=d", &[]),
        ).await;
        assert_eq!(str_field(&logger, "req"), Some("GET /a/b?c=d"));
    }

    #[tokio::test]
    async fn remote_addr_drops_the_port() {
        let req = request("/", &[]).with_remote_addr("203.0.113.7:51234");
        let logger = logger_after(Chain::new().with(remote_addr("ip")), req).await;
        assert_eq!(str_field(&logger, "ip"), Some("203.0.113.7"));
    }

    #[tokio::test]
    async fn remote_addr_with_empty_host_is_skipped() {
        let req = request("/", &[]).with_remote_addr(":80");
        let logger = logger_after(Chain::new().with(remote_addr("ip")), req).await;
        assert_eq!(logger.get("ip"), None);
    }

    #[tokio::test]
    async fn remote_addr_with_nested_brackets_is_skipped() {
        let req = request("/", &[]).with_remote_addr("[[::1]]:80");
        let logger = logger_after(Chain::new().with(remote_addr("ip")), req).await;
        assert_eq!(logger.get("ip"), None);
    }

    #[tokio::test]
    async fn remote_addr_without_port_is_skipped_and_chain_continues() {
        let req = request("/", &[]).with_remote_addr("203.0.113.7");
        let logger = logger_after(Chain::new().with(remote_addr("ip")), req).await;
        assert_eq!(logger.get("ip"), None);
    }

    #[tokio::test]
    async fn empty_user_agent_is_skipped() {
        let req = request("/", &[("User-Agent", "")]);
        let logger = logger_after(Chain::new().with(user_agent("ua")), req).await;
        assert_eq!(logger.get("ua"), None);

        let req = request("/", &[("User-Agent", "test/1.0")]);
        let logger = logger_after(Chain::new().with(user_agent("ua")), req).await;
        assert_eq!(str_field(&logger, "ua"), Some("test/1.0"));
    }

    #[tokio::test]
    async fn referer_only_when_present() {
        let logger = logger_after(Chain::new().with(referer("ref")), request("/", &[])).await;
        assert_eq!(logger.get("ref"), None);

        let req = request("/", &[("Referer", "https://example.com/")]);
        let logger = logger_after(Chain::new().with(referer("ref")), req).await;
        assert_eq!(str_field(&logger, "ref"), Some("https://example.com/"));
    }

    #[tokio::test]
    async fn arbitrary_header() {
        let req = request("/", &[("X-Correlation-ID", "abc-123")]);
        let logger = logger_after(
            Chain::new().with(header("correlation_id", "x-correlation-id")),
            req,
        ).await;
        assert_eq!(str_field(&logger, "correlation_id"), Some("abc-123"));
    }

    #[tokio::test]
    async fn guarded_miss_leaves_logger_identical() {
        let base = Logger::disabled().with("service", "api");
        let mut req = request("/", &[]);
        req.attach_logger(base.clone());

        let logger = logger_after(Chain::new().with(user_agent("ua")).with(referer("ref")), req).await;
        assert_eq!(logger, base);
    }

    #[tokio::test]
    async fn same_key_later_layer_wins() {
        let chain = Chain::new().with(url("k")).with(method("k"));
        let logger = logger_after(chain, request("/foo", &[])).await;
        assert_eq!(str_field(&logger, "k"), Some("GET"));
        assert_eq!(logger.fields().len(), 1);
    }

    #[test]
    fn split_host_port_cases() {
        assert_eq!(split_host_port("1.2.3.4:80"), Some("1.2.3.4"));
        assert_eq!(split_host_port("example.com:443"), Some("example.com"));
        assert_eq!(split_host_port("[::1]:80"), Some("::1"));
        assert_eq!(split_host_port(":80"), Some(""));
        assert_eq!(split_host_port("1.2.3.4"), None);
        assert_eq!(split_host_port("::1"), None);
        assert_eq!(split_host_port("[::1]"), None);
        assert_eq!(split_host_port("[::1"), None);
        assert_eq!(split_host_port("[[::1]]:80"), None);
        assert_eq!(split_host_port("[a]b]:80"), None);
        assert_eq!(split_host_port(""), None);
    }
}
