//! Middleware contract.
//!
//! Middleware is a transformation from one handler to another: it receives
//! the rest of the chain as a [`BoxedHandler`] and returns a handler that runs
//! its own pre-logic, delegates, then runs its post-logic on the way out.
//! Errors from the inner chain are returned upward (inspected, wrapped, or
//! passed through), never turned into responses here. That happens once, at
//! the [`ErrorTranslator`](crate::ErrorTranslator).
//!
//! Two ways to write one:
//!
//! ```rust
//! use faultline::{BoxedHandler, Request, middleware};
//!
//! // Plain function shape: BoxedHandler -> BoxedHandler.
//! fn passthrough(next: BoxedHandler) -> BoxedHandler {
//!     BoxedHandler::new(move |req: Request| next.call(req))
//! }
//!
//! // Async (request, next) shape.
//! let timing = middleware::from_fn(|req: Request, next: BoxedHandler| async move {
//!     let started = std::time::Instant::now();
//!     let result = next.call(req).await;
//!     tracing::info!(elapsed = ?started.elapsed(), ok = result.is_ok(), "request finished");
//!     result
//! });
//! # let _ = (passthrough, timing);
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::Response;

/// Wraps one handler to produce another.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

impl<F> Middleware for F
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        self(next)
    }
}

// ── from_fn ───────────────────────────────────────────────────────────────────

/// Builds middleware from an async function of `(request, next)`.
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, BoxedHandler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    FromFn { f: Arc::new(f) }
}

/// Middleware returned by [`from_fn`].
pub struct FromFn<F> {
    f: Arc<F>,
}

impl<F> Clone for FromFn<F> {
    fn clone(&self) -> Self {
        Self { f: Arc::clone(&self.f) }
    }
}

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, BoxedHandler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        let f = Arc::clone(&self.f);
        BoxedHandler::new(move |req: Request| f(req, next.clone()))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::{HeaderValue, StatusCode};

    use super::*;

    async fn ok(_req: Request) -> Result<Response, Error> {
        Ok(Response::text("ok"))
    }

    #[tokio::test]
    async fn from_fn_can_rewrite_the_response() {
        let stamp = from_fn(|req: Request, next: BoxedHandler| async move {
            let mut res = next.call(req).await?;
            res.insert_header("x-served-by".parse().unwrap(), HeaderValue::from_static("faultline"));
            Ok::<_, Error>(res)
        });

        let handler = stamp.wrap(BoxedHandler::new(ok));
        let res = handler.call(Request::new(http::Request::new(Bytes::new()))).await.unwrap();

        assert_eq!(res.headers()["x-served-by"], "faultline");
    }

    #[tokio::test]
    async fn from_fn_can_short_circuit_with_an_error() {
        let deny = from_fn(|_req: Request, _next: BoxedHandler| async move {
            Err::<Response, _>(Error::classified("no token", StatusCode::UNAUTHORIZED, &["unauthorized"]))
        });

        let err = deny
            .wrap(BoxedHandler::new(ok))
            .call(Request::new(http::Request::new(Bytes::new())))
            .await
            .unwrap_err();

        assert_eq!(err.status_message(), Some((StatusCode::UNAUTHORIZED, "unauthorized")));
    }
}
