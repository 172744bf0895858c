//! Minimal reqtrail example: request-scoped log fields and request ids.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/users/42
//!   curl -i -H 'user-agent: demo/1.0' -H 'referer: https://example.com/' \
//!        http://localhost:3000/users/7
//!   curl -i -X DELETE http://localhost:3000/users/42
//!
//! Every response carries an `x-request-id` header, and every log line a
//! handler emits carries the same id plus the request line, peer address and
//! user agent.

use reqtrail::middleware::{self, RequestIdLayer};
use reqtrail::{Logger, Method, Request, Response, Router, Server, Status};
use tracing::Level;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .on(Method::Get,    "/users/{id}", get_user)
        .on(Method::Delete, "/users/{id}", delete_user)
        .with(middleware::new_handler(Logger::new(Level::INFO).with("service", "users")))
        .with(RequestIdLayer::new("req_id", "X-Request-ID"))
        .with(middleware::request_line("request"))
        .with(middleware::remote_addr("ip"))
        .with(middleware::user_agent("user_agent"))
        .with(middleware::referer("referer"))
        .with(middleware::access_log());

    if let Err(e) = Server::bind("0.0.0.0:3000").serve(app).await {
        tracing::error!("server error: {e}");
    }
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    req.logger().with("user", id).info("loading user");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes())
}

// DELETE /users/{id} → 204 No Content
async fn delete_user(req: Request) -> Status {
    req.logger().warn("deleting user");
    Status::NoContent
}
