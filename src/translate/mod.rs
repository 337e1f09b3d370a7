//! The boundary between fallible handlers and the host server.
//!
//! An [`ErrorTranslator`] turns a handler that may fail into a [`HostHandler`]
//! that never does. Per request:
//!
//! 1. Run the handler. `Ok(response)` is returned untouched.
//! 2. On `Err`, find the first [`ClassifiedError`](crate::ClassifiedError) in
//!    the chain. Found: use its status and message. Not found: `500` with the
//!    standard reason phrase. An empty message becomes the status' reason
//!    phrase, or its class ("Client Error", "Server Error") when the code has
//!    none.
//! 3. Call the classifier once on a response holding the headers the chain
//!    staged through [`Request::response_headers`].
//! 4. Write the full error text to the sink. Sink failures are dropped.
//!
//! A failed handler never produced a response value, so the response written
//! in step 3 is the only one; there is nothing to write twice.

mod sink;

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderMap, HeaderValue, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::service::Service;
use tracing::{debug, warn};

use crate::error::{BoxError, Error};
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

pub use sink::{ErrorSink, Stderr, TracingSink};

/// Writes the client-visible error response: `(sink, message, status)`.
pub type Classifier = Arc<dyn Fn(&mut Response, &str, StatusCode) + Send + Sync + 'static>;

/// The default classifier: status, plain-text body, no sniffing.
pub fn plain_text(res: &mut Response, message: &str, status: StatusCode) {
    res.set_status(status);
    res.insert_header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    res.insert_header(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    res.set_body(message.to_owned());
}

// ── ErrorTranslator ───────────────────────────────────────────────────────────

/// Converts handler errors into responses and log lines.
///
/// Configured once at startup, then shared read-only by every request.
///
/// ```rust
/// use faultline::{ErrorTranslator, TracingSink};
///
/// // Defaults: standard error, plain-text responses.
/// let translator = ErrorTranslator::new();
///
/// // Custom sink and classifier.
/// let translator = ErrorTranslator::new()
///     .sink(TracingSink)
///     .classifier(|res, message, status| {
///         res.set_status(status);
///         res.set_body(format!(r#"{{"error":{message:?}}}"#));
///     });
/// ```
#[derive(Clone)]
pub struct ErrorTranslator {
    sink: Arc<dyn ErrorSink>,
    classifier: Classifier,
}

impl ErrorTranslator {
    pub fn new() -> Self {
        Self { sink: Arc::new(Stderr), classifier: Arc::new(plain_text) }
    }

    pub fn sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn classifier(
        mut self,
        classifier: impl Fn(&mut Response, &str, StatusCode) + Send + Sync + 'static,
    ) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Produces the host handler for `handler`.
    pub fn adapt(&self, handler: impl Handler) -> HostHandler {
        HostHandler { handler: handler.into_boxed_handler(), translator: self.clone() }
    }

    /// Turns one error into the response to send, logging it to the sink.
    pub fn translate(&self, err: Error) -> Response {
        self.translate_onto(HeaderMap::new(), err)
    }

    /// Like [`translate`](Self::translate), with `staged` already on the
    /// response the classifier writes into.
    fn translate_onto(&self, staged: HeaderMap, err: Error) -> Response {
        let classified = err.status_message();
        let (status, message) =
            classified.unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, ""));
        let message = if message.is_empty() { fallback_text(status) } else { message };

        debug!(status = status.as_u16(), classified = classified.is_some(), "handler failed");

        let mut res = Response::status(status);
        *res.headers_mut() = staged;
        (self.classifier)(&mut res, message, status);

        if let Err(e) = self.sink.write_error(&err.to_string()) {
            debug!(error = %e, "error sink write failed");
        }
        res
    }
}

fn fallback_text(status: StatusCode) -> &'static str {
    if let Some(reason) = status.canonical_reason() {
        return reason;
    }
    match status.as_u16() / 100 {
        1 => "Informational",
        2 => "Success",
        3 => "Redirection",
        4 => "Client Error",
        _ => "Server Error",
    }
}

impl Default for ErrorTranslator {
    fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for ErrorTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ErrorTranslator")
    }
}

// ── HostHandler ───────────────────────────────────────────────────────────────

/// A handler that always produces a response.
///
/// Implements hyper's [`Service`] with `Error = Infallible`, so it can be
/// passed straight to `hyper::server::conn::http1::Builder::serve_connection`
/// or hyper-util's auto builder. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct HostHandler {
    handler: BoxedHandler,
    translator: ErrorTranslator,
}

impl HostHandler {
    /// Runs the chain for one request and finalizes the response.
    ///
    /// Headers staged on the request end up on the response either way.
    pub async fn handle(&self, req: Request) -> Response {
        let staged = req.response_headers().clone();
        match self.handler.call(req).await {
            Ok(mut res) => {
                res.fill_missing(&staged.take());
                res
            }
            Err(err) => self.translator.translate_onto(staged.take(), err),
        }
    }
}

impl<B> Service<http::Request<B>> for HostHandler
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = http::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Infallible>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let this = self.clone();
        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    let e: BoxError = e.into();
                    warn!(error = %e, "request body unreadable");
                    let err = Error::classified(e, StatusCode::BAD_REQUEST, &[])
                        .context("reading request body");
                    return Ok(this.translator.translate(err).into_inner());
                }
            };
            Ok(this.handle(Request::from_parts(parts, body)).await.into_inner())
        })
    }
}
