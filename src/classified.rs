//! Errors annotated with an HTTP status and a client-safe message.

use std::error::Error as StdError;
use std::fmt;

use http::StatusCode;
use tracing::warn;

use crate::error::{BoxError, Chain, render};

/// An error that knows how it should look to the client.
///
/// The `cause` is what went wrong and is only ever logged. The `status` and
/// `message` are what the client gets. An empty message is replaced by the
/// status' reason phrase when the response is written.
///
/// Type inspection goes straight to the cause:
///
/// ```rust
/// use faultline::ClassifiedError;
/// use http::StatusCode;
/// use std::io;
///
/// let err = ClassifiedError::new(
///     io::Error::from(io::ErrorKind::NotFound),
///     StatusCode::NOT_FOUND,
///     &["no", "such", "user"],
/// );
/// assert_eq!(err.message(), "no such user");
/// assert!(err.is::<io::Error>());
/// ```
#[derive(Debug)]
pub struct ClassifiedError {
    cause: BoxError,
    status: StatusCode,
    message: String,
}

impl ClassifiedError {
    /// Classifies `cause`. The `message` parts are joined with single spaces.
    ///
    /// Status codes outside `100..=599` are a caller bug; they are clamped to
    /// `500` and a warning is emitted. Use [`try_new`](Self::try_new) to reject
    /// them instead.
    pub fn new(cause: impl Into<BoxError>, status: StatusCode, message: &[&str]) -> Self {
        let status = if is_valid(status.as_u16()) {
            status
        } else {
            warn!(status = status.as_u16(), "status outside 100..=599, using 500");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self { cause: cause.into(), status, message: message.join(" ") }
    }

    /// Like [`new`](Self::new) but takes a raw code and rejects anything
    /// outside `100..=599`.
    pub fn try_new(
        cause: impl Into<BoxError>,
        code: u16,
        message: &[&str],
    ) -> Result<Self, InvalidStatus> {
        if !is_valid(code) {
            return Err(InvalidStatus(code));
        }
        let status = StatusCode::from_u16(code).map_err(|_| InvalidStatus(code))?;
        Ok(Self::new(cause, status, message))
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn message(&self) -> &str { &self.message }

    /// The status and message sent to the client.
    pub fn status_message(&self) -> (StatusCode, &str) {
        (self.status, &self.message)
    }

    /// The wrapped cause, never shown to the client.
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    pub fn into_cause(self) -> BoxError { self.cause }

    /// Iterates the cause and its sources, skipping nested envelopes.
    pub fn chain(&self) -> Chain<'_> {
        Chain::new(Some(self.cause.as_ref() as &(dyn StdError + 'static)))
    }

    /// Returns `true` if the cause, or anything beneath it, is a `T`.
    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Borrows the first `T` in the cause chain.
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.chain().find_map(|err| err.downcast_ref::<T>())
    }
}

fn is_valid(code: u16) -> bool {
    (100..=599).contains(&code)
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status={} msg={:?} err={:?}",
            self.status.as_u16(),
            self.message,
            render(self.cause.as_ref()),
        )
    }
}

impl StdError for ClassifiedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.cause.as_ref() as &(dyn StdError + 'static))
    }
}

// ── InvalidStatus ─────────────────────────────────────────────────────────────

/// A status code outside `100..=599`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidStatus(pub u16);

impl fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid HTTP status {}: expected 100..=599", self.0)
    }
}

impl StdError for InvalidStatus {}
