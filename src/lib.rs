//! # faultline
//!
//! Fallible HTTP handlers for hyper. Handlers return errors instead of
//! writing error responses; middleware composes in a fixed order; one
//! translator at the edge turns every error into exactly one response and one
//! log line.
//!
//! ## The contract
//!
//! - A **handler** is `async fn(Request) -> Result<impl IntoResponse, impl Into<Error>>`.
//! - A **middleware** wraps a handler: `Fn(BoxedHandler) -> BoxedHandler`.
//!   The first one listed runs first and finishes last.
//! - An **error** is either classified (status + client-safe message, cause
//!   kept for the log) or not (`500`, generic text).
//! - The **translator** runs the chain and, on failure, writes the response
//!   once and logs the full error once.
//!
//! What this crate leaves to the host: routing, TLS, timeouts, connection
//! handling. [`HostHandler`] is a plain hyper `Service`; serve it however you
//! like.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use faultline::{BoxedHandler, Error, ErrorTranslator, Pipeline, Request, Response, ResultExt, Stack};
//! use http::StatusCode;
//!
//! fn request_log(next: BoxedHandler) -> BoxedHandler {
//!     BoxedHandler::new(move |req: Request| {
//!         let next = next.clone();
//!         async move {
//!             tracing::info!(path = req.path(), "request");
//!             next.call(req).await
//!         }
//!     })
//! }
//!
//! async fn get_user(req: Request) -> Result<Response, Error> {
//!     let id: u64 = req
//!         .header("x-user-id")
//!         .unwrap_or_default()
//!         .parse::<u64>()
//!         .or_status(StatusCode::BAD_REQUEST, "x-user-id must be a number")?;
//!     if id != 42 {
//!         return Err(Error::classified(format!("user {id} not in store"), StatusCode::NOT_FOUND, &["no such user"]));
//!     }
//!     Ok(Response::json(r#"{"id":42}"#))
//! }
//!
//! let pipeline = Pipeline::new(ErrorTranslator::new()).common(Stack::new().layer(request_log));
//! let service = pipeline.plain(get_user);
//! // hand `service` to hyper::server::conn::http1::Builder::serve_connection
//! # let _ = service;
//! ```

mod classified;
mod compose;
mod error;
mod handler;
mod pipeline;
mod request;
mod response;
mod translate;

pub mod middleware;

pub use classified::{ClassifiedError, InvalidStatus};
pub use compose::{Stack, compose, compose_common};
pub use error::{BoxError, Chain, ContextError, Error, ResultExt};
pub use handler::{BoxFuture, BoxedHandler, Handler};
pub use middleware::Middleware;
pub use pipeline::Pipeline;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder, ResponseHeaders};
pub use translate::{
    Classifier, ErrorSink, ErrorTranslator, HostHandler, Stderr, TracingSink, plain_text,
};
