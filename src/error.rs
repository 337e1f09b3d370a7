//! The error type handlers return.
//!
//! A handler fails with an [`Error`]. The enum is closed: an error either
//! carries an explicit HTTP classification, wraps a cause with a line of
//! context, or is anything else. The translator walks it to find the status
//! and message to send; everything else is only ever written to the sink.
//!
//! ```text
//! Error::Wrapped("loading user 42")
//!        ↓ source()
//! ClassifiedError(404, "user not found")       ← translator stops here
//!        ↓ source()
//! io::Error(NotFound)                          ← is::<io::Error>() matches here
//! ```

use std::error::Error as StdError;
use std::fmt;

use http::StatusCode;

use crate::classified::ClassifiedError;

/// A boxed, thread-safe error of any type.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

// ── Error ─────────────────────────────────────────────────────────────────────

/// The error returned by a failing handler or middleware.
///
/// Any `std::error::Error + Send + Sync + 'static` converts into it, so `?`
/// works on io, parse, and driver errors alike. `Error` deliberately does not
/// implement `std::error::Error` (that blanket conversion would overlap);
/// convert it into a [`BoxError`] when a std error is needed.
#[derive(Debug)]
pub enum Error {
    /// The application chose a status and a client-safe message.
    Classified(ClassifiedError),
    /// A cause with an added line of context.
    Wrapped(ContextError),
    /// Anything else. Translated to `500 Internal Server Error`.
    Other(BoxError),
}

impl Error {
    /// Builds a classified error: `cause` is logged, `status` and the
    /// space-joined `message` parts are sent to the client.
    pub fn classified(cause: impl Into<BoxError>, status: StatusCode, message: &[&str]) -> Self {
        Self::Classified(ClassifiedError::new(cause, status, message))
    }

    /// Wraps any boxable error, including `&str` and `String` messages.
    pub fn other(cause: impl Into<BoxError>) -> Self {
        Self::from_boxed(cause.into())
    }

    /// Adds a line of context. The classification, if any, is preserved.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Wrapped(ContextError { context: context.into(), source: self.into() })
    }

    /// Finds the first [`ClassifiedError`] in the chain, outermost first.
    pub fn find_classified(&self) -> Option<&ClassifiedError> {
        let mut next: Option<&(dyn StdError + 'static)> = match self {
            Self::Classified(c) => return Some(c),
            Self::Wrapped(w) => Some(w as &(dyn StdError + 'static)),
            Self::Other(e) => Some(e.as_ref() as &(dyn StdError + 'static)),
        };
        while let Some(err) = next {
            if let Some(classified) = err.downcast_ref::<ClassifiedError>() {
                return Some(classified);
            }
            next = err.source();
        }
        None
    }

    /// Status and message of the first classification in the chain.
    pub fn status_message(&self) -> Option<(StatusCode, &str)> {
        self.find_classified().map(ClassifiedError::status_message)
    }

    /// Iterates the underlying causes, skipping classification and context
    /// envelopes.
    pub fn chain(&self) -> Chain<'_> {
        match self {
            Self::Classified(c) => c.chain(),
            Self::Wrapped(w) => Chain::new(Some(w as &(dyn StdError + 'static))),
            Self::Other(e) => Chain::new(Some(e.as_ref() as &(dyn StdError + 'static))),
        }
    }

    /// Returns `true` if any underlying cause is a `T`.
    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Borrows the first underlying cause of type `T`.
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.chain().find_map(|err| err.downcast_ref::<T>())
    }

    fn from_boxed(boxed: BoxError) -> Self {
        let boxed = match boxed.downcast::<ClassifiedError>() {
            Ok(classified) => return Self::Classified(*classified),
            Err(boxed) => boxed,
        };
        match boxed.downcast::<ContextError>() {
            Ok(wrapped) => Self::Wrapped(*wrapped),
            Err(boxed) => Self::Other(boxed),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classified(c) => fmt::Display::fmt(c, f),
            Self::Wrapped(w) => fmt::Display::fmt(w, f),
            Self::Other(e) => f.write_str(&render(e.as_ref())),
        }
    }
}

impl<E> From<E> for Error
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self::from_boxed(Box::new(err))
    }
}

impl From<Error> for BoxError {
    fn from(err: Error) -> Self {
        match err {
            Error::Classified(c) => Box::new(c),
            Error::Wrapped(w) => Box::new(w),
            Error::Other(e) => e,
        }
    }
}

// ── ContextError ──────────────────────────────────────────────────────────────

/// A cause annotated with a line of context, e.g. `"loading user 42"`.
#[derive(Debug)]
pub struct ContextError {
    context: String,
    source: BoxError,
}

impl ContextError {
    pub fn context(&self) -> &str { &self.context }
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, render(self.source.as_ref()))
    }
}

impl StdError for ContextError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref() as &(dyn StdError + 'static))
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// Iterator over the causes of an error, outermost first.
///
/// Envelopes ([`ClassifiedError`], [`ContextError`]) are transparent: they are
/// stepped through but never yielded, so type matching always lands on a real
/// cause.
pub struct Chain<'a> {
    next: Option<&'a (dyn StdError + 'static)>,
}

impl<'a> Chain<'a> {
    pub(crate) fn new(start: Option<&'a (dyn StdError + 'static)>) -> Self {
        Self { next: start }
    }
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn StdError + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(err) = self.next {
            self.next = err.source();
            if !is_envelope(err) {
                return Some(err);
            }
        }
        None
    }
}

fn is_envelope(err: &(dyn StdError + 'static)) -> bool {
    err.is::<ClassifiedError>() || err.is::<ContextError>()
}

/// Renders `err` and its sources joined by `": "`.
///
/// Stops after an envelope: its own `Display` already includes its cause.
pub(crate) fn render(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err;
    while !is_envelope(current) {
        let Some(source) = current.source() else { break };
        out.push_str(": ");
        out.push_str(&source.to_string());
        current = source;
    }
    out
}

// ── ResultExt ─────────────────────────────────────────────────────────────────

/// Combinators on any `Result` whose error converts into [`Error`].
///
/// ```rust
/// use faultline::{Error, ResultExt};
/// use http::StatusCode;
///
/// fn load(id: &str) -> Result<String, Error> {
///     let n: u32 = id.parse().or_status(StatusCode::BAD_REQUEST, "id must be a number")?;
///     std::fs::read_to_string(format!("/var/users/{n}")).context("reading user file")
/// }
/// ```
pub trait ResultExt<T> {
    /// Wraps the error with a line of context.
    fn context(self, context: impl Into<String>) -> Result<T, Error>;

    /// Classifies the error with `status` and a client-safe `message`.
    fn or_status(self, status: StatusCode, message: &str) -> Result<T, Error>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, context: impl Into<String>) -> Result<T, Error> {
        self.map_err(|e| e.into().context(context))
    }

    fn or_status(self, status: StatusCode, message: &str) -> Result<T, Error> {
        self.map_err(|e| Error::classified(e.into(), status, &[message]))
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Missing(u32);

    impl fmt::Display for Missing {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "row {} missing", self.0)
        }
    }

    impl StdError for Missing {}

    #[test]
    fn question_mark_lands_classified_errors_in_their_variant() {
        fn fails() -> Result<(), Error> {
            Err(ClassifiedError::new("gone", StatusCode::GONE, &["gone"]))?
        }
        assert!(matches!(fails(), Err(Error::Classified(_))));
    }

    #[test]
    fn plain_errors_are_unclassified() {
        let err = Error::from(io::Error::other("disk on fire"));
        assert!(matches!(err, Error::Other(_)));
        assert!(err.find_classified().is_none());
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn classification_survives_context_wrapping() {
        let err = Error::classified(Missing(7), StatusCode::NOT_FOUND, &["not", "found"])
            .context("loading row")
            .context("handling request");

        assert_eq!(err.status_message(), Some((StatusCode::NOT_FOUND, "not found")));
    }

    #[derive(Debug)]
    struct Driver(ClassifiedError);

    impl fmt::Display for Driver {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("driver failed")
        }
    }

    impl StdError for Driver {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn classification_found_inside_foreign_source_chain() {
        let err = Error::from(Driver(ClassifiedError::new("inner", StatusCode::CONFLICT, &["taken"])));

        assert!(matches!(err, Error::Other(_)));
        assert_eq!(err.status_message(), Some((StatusCode::CONFLICT, "taken")));
        assert_eq!(err.to_string(), r#"driver failed: status=409 msg="taken" err="inner""#);
    }

    #[test]
    fn downcast_matches_the_cause_not_the_envelope() {
        let err = Error::classified(Missing(3), StatusCode::NOT_FOUND, &[]).context("lookup");

        assert_eq!(err.downcast_ref::<Missing>(), Some(&Missing(3)));
        assert!(err.is::<Missing>());
        assert!(!err.is::<ClassifiedError>());
        assert!(!err.is::<ContextError>());
        assert!(!err.is::<io::Error>());
    }

    #[test]
    fn display_includes_context_and_cause() {
        let err = Error::from(Missing(9)).context("fetching");
        assert_eq!(err.to_string(), "fetching: row 9 missing");

        let err = Error::classified(Missing(9), StatusCode::NOT_FOUND, &["nope"]).context("fetching");
        assert_eq!(
            err.to_string(),
            r#"fetching: status=404 msg="nope" err="row 9 missing""#
        );
    }

    #[test]
    fn result_ext_classifies_in_place() {
        let parsed: Result<u32, Error> = "x".parse::<u32>().or_status(StatusCode::BAD_REQUEST, "bad id");
        let err = parsed.unwrap_err();

        assert_eq!(err.status_message(), Some((StatusCode::BAD_REQUEST, "bad id")));
        assert!(err.is::<std::num::ParseIntError>());
    }

    #[test]
    fn boxing_and_unboxing_preserves_the_variant() {
        let boxed: BoxError = Error::other("plain").context("ctx").into();
        assert!(matches!(Error::other(boxed), Error::Wrapped(_)));
    }
}
