//! Handler trait and type erasure.
//!
//! # How fallible handlers are stored
//!
//! Middleware receives "the rest of the chain" without knowing what it is:
//! another middleware, or the terminal handler. So every handler is erased
//! behind a trait object (`dyn ErasedHandler`) and passed around as a
//! [`BoxedHandler`].
//!
//! ```text
//! async fn get_user(req: Request) -> Result<Response, Error>   ← user writes this
//!        ↓ compose(get_user, &stack)
//! get_user.into_boxed_handler()                                ← Handler blanket impl
//!        ↓
//! BoxedHandler(Arc::new(FnHandler(get_user)))                  ← heap-allocated wrapper
//!        ↓  wrapped by each middleware, outermost last
//! handler.call(req)  at request time                           ← one vtable dispatch per layer
//!        ↓
//! Box::pin(async { get_user(req).await.map(into_response).map_err(into) })
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a response or an
/// [`Error`].
///
/// `Send + 'static` lets the host's runtime move it across worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Result<Response, Error>> + Send + 'static>>;

/// Internal dispatch interface.
pub(crate) trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

// ── BoxedHandler ──────────────────────────────────────────────────────────────

/// A type-erased, cheaply cloneable handler.
///
/// This is what middleware receives as "next" and what composition returns.
/// Cloning is one atomic reference-count increment.
#[derive(Clone)]
pub struct BoxedHandler(Arc<dyn ErasedHandler + Send + Sync + 'static>);

impl BoxedHandler {
    pub fn new(handler: impl Handler) -> Self {
        handler.into_boxed_handler()
    }

    /// Runs the handler for one request.
    pub fn call(&self, req: Request) -> BoxFuture {
        self.0.call(req)
    }
}

impl std::fmt::Debug for BoxedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BoxedHandler")
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid fallible handler.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure with the shape:
///
/// ```text
/// async fn name(req: Request) -> Result<impl IntoResponse, impl Into<Error>>
/// ```
///
/// and by [`BoxedHandler`] itself, so an already composed chain can be
/// composed again.
///
/// The trait is **sealed** (via the private `Sealed` supertrait).
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R, E> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoResponse + Send + 'static,
    E: Into<Error> + Send + 'static,
{
}

impl<F, Fut, R, E> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoResponse + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        BoxedHandler(Arc::new(FnHandler(self)))
    }
}

impl private::Sealed for BoxedHandler {}

impl Handler for BoxedHandler {
    fn into_boxed_handler(self) -> BoxedHandler { self }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype wrapper that holds a concrete handler `F` and implements
/// [`ErasedHandler`], bridging the typed world to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R, E> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoResponse + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move {
            fut.await.map(IntoResponse::into_response).map_err(Into::into)
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;

    use super::*;

    fn request() -> Request {
        Request::new(http::Request::new(Bytes::new()))
    }

    async fn teapot(_req: Request) -> Result<StatusCode, std::io::Error> {
        Ok(StatusCode::IM_A_TEAPOT)
    }

    async fn broken(_req: Request) -> Result<Response, std::io::Error> {
        Err(std::io::Error::other("broken pipe"))
    }

    #[tokio::test]
    async fn success_is_converted_into_a_response() {
        let res = BoxedHandler::new(teapot).call(request()).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn failure_is_converted_into_error() {
        let err = BoxedHandler::new(broken).call(request()).await.unwrap_err();
        assert!(err.is::<std::io::Error>());
    }

    #[tokio::test]
    async fn boxing_a_boxed_handler_is_identity() {
        let boxed = BoxedHandler::new(teapot);
        let again = BoxedHandler::new(boxed.clone());
        assert!(Arc::ptr_eq(&boxed.0, &again.0));
    }
}
