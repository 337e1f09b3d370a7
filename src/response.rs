//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! A [`Response`] is also the sink error classifiers write into: status,
//! headers and body are all settable in place. [`ResponseHeaders`] is the
//! part of that sink middleware can reach before the handler has produced
//! anything.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName};
use http::{HeaderMap, HeaderValue, StatusCode};
use http_body_util::Full;

enum ContentType {
    Json,
    Text,
}

impl ContentType {
    fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(match self {
            Self::Json => "application/json",
            Self::Text => "text/plain; charset=utf-8",
        })
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use faultline::Response;
/// use http::{header, HeaderValue, StatusCode};
///
/// Response::text("hello");
/// Response::json(r#"{"id":1}"#);
/// Response::status(StatusCode::NO_CONTENT);
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header(header::LOCATION, HeaderValue::from_static("/users/42"))
///     .json(r#"{"id":42}"#);
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// `200 OK` — `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().bytes(ContentType::Json, body)
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<Bytes>) -> Self {
        Self::builder().bytes(ContentType::Text, body)
    }

    /// Response with no body.
    pub fn status(status: StatusCode) -> Self {
        Self { status, headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { status: StatusCode::OK, headers: HeaderMap::new() }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Sets `name`, replacing any previous values.
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Adds every staged header whose name the response does not set itself.
    pub(crate) fn fill_missing(&mut self, staged: &HeaderMap) {
        for name in staged.keys() {
            if self.headers.contains_key(name) {
                continue;
            }
            for value in staged.get_all(name) {
                self.headers.append(name.clone(), value.clone());
            }
        }
    }

    /// Converts into the hyper-facing response.
    pub fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseBuilder {
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Appends a header; repeated names keep every value.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.bytes(ContentType::Json, body)
    }

    pub fn text(self, body: impl Into<Bytes>) -> Response {
        self.bytes(ContentType::Text, body)
    }

    fn bytes(mut self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.headers.insert(CONTENT_TYPE, content_type.header_value());
        Response { status: self.status, headers: self.headers, body: body.into() }
    }
}

// ── ResponseHeaders ───────────────────────────────────────────────────────────

/// Headers staged for whatever response the request ends with.
///
/// Every [`Request`](crate::Request) carries one. Middleware stages headers
/// here before delegating (CORS, a request id) and they reach the client on
/// success and on a translated error alike. A header the response sets itself
/// wins over a staged one; the error classifier runs after staging, so its
/// headers win too.
///
/// ```rust
/// use faultline::{BoxedHandler, Error, Request, Response};
/// use http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
/// use http::HeaderValue;
///
/// async fn cors(req: Request, next: BoxedHandler) -> Result<Response, Error> {
///     req.response_headers()
///         .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
///     next.call(req).await
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct ResponseHeaders(Arc<Mutex<HeaderMap>>);

impl ResponseHeaders {
    /// Stages `name`, replacing any previously staged values.
    pub fn insert(&self, name: HeaderName, value: HeaderValue) {
        self.lock().insert(name, value);
    }

    /// Stages an additional value for `name`.
    pub fn append(&self, name: HeaderName, value: HeaderValue) {
        self.lock().append(name, value);
    }

    pub fn get(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.lock().get(name).cloned()
    }

    pub fn remove(&self, name: &HeaderName) {
        self.lock().remove(name);
    }

    /// Empties the staging area, returning what was in it.
    pub(crate) fn take(&self) -> HeaderMap {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, HeaderMap> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a status directly from a handler: `Ok(StatusCode::NO_CONTENT)`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

/// `200 OK` with an empty body.
impl IntoResponse for () {
    fn into_response(self) -> Response { Response::status(StatusCode::OK) }
}

#[cfg(test)]
mod tests {
    use http::header::{LOCATION, VARY};

    use super::*;

    #[test]
    fn builder_sets_status_headers_and_body() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header(LOCATION, HeaderValue::from_static("/users/99"))
            .json(r#"{"id":"99"}"#);

        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.headers()[LOCATION], "/users/99");
        assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(res.body().as_ref(), br#"{"id":"99"}"#);
    }

    #[test]
    fn sink_setters_overwrite_in_place() {
        let mut res = Response::text("draft");
        res.set_status(StatusCode::IM_A_TEAPOT);
        res.set_body("final");

        let inner = res.into_inner();
        assert_eq!(inner.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(inner.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn builder_text_sets_plain_content_type() {
        let res = Response::builder().status(StatusCode::ACCEPTED).text("queued");
        assert_eq!(res.status_code(), StatusCode::ACCEPTED);
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn staged_headers_fill_only_what_the_response_leaves_unset() {
        let staged = ResponseHeaders::default();
        staged.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        staged.append(VARY, HeaderValue::from_static("origin"));
        staged.append(VARY, HeaderValue::from_static("accept"));

        let mut res = Response::json("{}");
        res.fill_missing(&staged.take());

        assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(res.headers().get_all(VARY).iter().count(), 2);
        assert!(staged.get(&VARY).is_none());
    }

    #[test]
    fn clones_share_one_staging_area() {
        let staged = ResponseHeaders::default();
        staged.clone().insert(LOCATION, HeaderValue::from_static("/a"));
        assert_eq!(staged.get(&LOCATION).unwrap(), "/a");

        staged.remove(&LOCATION);
        assert!(staged.take().is_empty());
    }

    #[test]
    fn status_converts_to_empty_response() {
        let res = StatusCode::NO_CONTENT.into_response();
        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
        assert!(res.body().is_empty());
        assert!(res.headers().is_empty());
    }
}
