//! Incoming HTTP request type.

use bytes::Bytes;
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Uri, Version};

use crate::response::ResponseHeaders;

/// An incoming HTTP request with its body fully collected.
///
/// Handlers receive it by value. Middleware that needs to hand data inward
/// (a request id, an authenticated principal) stores it in
/// [`extensions_mut`](Request::extensions_mut) before delegating. Data headed
/// outward goes into [`response_headers`](Request::response_headers).
#[derive(Debug)]
pub struct Request {
    parts: Parts,
    body: Bytes,
    staged: ResponseHeaders,
}

impl Request {
    pub fn new(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::from_parts(parts, body)
    }

    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self { parts, body, staged: ResponseHeaders::default() }
    }

    pub fn method(&self) -> &Method { &self.parts.method }
    pub fn uri(&self) -> &Uri { &self.parts.uri }
    pub fn path(&self) -> &str { self.parts.uri.path() }
    pub fn version(&self) -> Version { self.parts.version }
    pub fn headers(&self) -> &HeaderMap { &self.parts.headers }
    pub fn body(&self) -> &Bytes { &self.body }
    pub fn extensions(&self) -> &Extensions { &self.parts.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.parts.extensions }

    /// Headers staged for the response this request ends with, error or not.
    pub fn response_headers(&self) -> &ResponseHeaders { &self.staged }

    /// Case-insensitive header lookup. Returns `None` for non-UTF-8 values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name)?.to_str().ok()
    }

    pub fn into_parts(self) -> (Parts, Bytes) {
        (self.parts, self.body)
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        Self::new(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::new(
            http::Request::builder()
                .method(Method::POST)
                .uri("/users?page=2")
                .header("X-Request-Id", "abc")
                .body(Bytes::from_static(b"{}"))
                .unwrap(),
        );

        assert_eq!(req.header("x-request-id"), Some("abc"));
        assert_eq!(req.header("missing"), None);
        assert_eq!(req.path(), "/users");
        assert_eq!(*req.method(), Method::POST);
        assert_eq!(req.body().as_ref(), b"{}");
    }
}
