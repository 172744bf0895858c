//! # reqtrail
//!
//! Request-scoped structured log fields and request ids, on top of a minimal
//! hyper framework.
//!
//! ## The idea
//!
//! Every request owns a [`Scope`]. Middlewares read the request's
//! [`Logger`] from it, derive a new logger with one more field, and put the
//! new one back before handing the request on. Loggers are immutable values,
//! so nothing upstream ever sees a field added downstream, and no middleware
//! needs to know which others are in the chain.
//!
//! [`RequestIdLayer`](middleware::RequestIdLayer) adds a [`RequestId`]: a
//! UUIDv7 assigned once per request, readable by every later stage, optionally
//! logged as a field and echoed as a response header.
//!
//! What the middleware core never does:
//!
//! - **Fail.** Missing headers or malformed addresses skip the field.
//! - **Short-circuit.** Every built-in stage calls the next one exactly once.
//! - **Share state across requests.** No locks, no globals.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use reqtrail::middleware::{self, RequestIdLayer};
//! use reqtrail::{Logger, Method, Request, Response, Router, Server};
//! use tracing::Level;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .on(Method::Get, "/users/{id}", get_user)
//!         .with(middleware::new_handler(Logger::new(Level::INFO)))
//!         .with(RequestIdLayer::new("req_id", "X-Request-ID"))
//!         .with(middleware::request_line("request"))
//!         .with(middleware::remote_addr("ip"))
//!         .with(middleware::user_agent("user_agent"))
//!         .with(middleware::access_log());
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     req.logger().with("user", id).info("loading user");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
//! }
//! ```

mod error;
mod handler;
mod id;
mod logger;
mod method;
mod request;
mod response;
mod router;
mod scope;
mod server;
mod status;

pub mod middleware;

pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use id::RequestId;
pub use logger::{Field, Logger, Value};
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use scope::Scope;
pub use server::Server;
pub use status::Status;
