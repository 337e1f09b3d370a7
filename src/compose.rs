//! Middleware composition.
//!
//! The first middleware listed is the outermost: its pre-logic runs first and
//! its post-logic runs last.
//!
//! ```text
//! compose(t, [m1, m2, m3])  ==  m1(m2(m3(t)))
//!
//! m1 pre → m2 pre → m3 pre → t → m3 post → m2 post → m1 post
//! ```
//!
//! Composition only builds closures. Nothing runs until the returned handler
//! is called with a request.

use std::sync::Arc;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::Middleware;

/// Wraps `terminal` in `middleware`, `middleware[0]` outermost.
///
/// With no middleware the terminal is returned as is.
pub fn compose(terminal: impl Handler, middleware: &[Arc<dyn Middleware>]) -> BoxedHandler {
    middleware
        .iter()
        .rev()
        .fold(terminal.into_boxed_handler(), |next, layer| layer.wrap(next))
}

/// Wraps `terminal` in `specific`, then wraps the result in `common`.
///
/// Common middleware always ends up outermost, whatever the specific stack
/// contains.
pub fn compose_common(common: &Stack, terminal: impl Handler, specific: &Stack) -> BoxedHandler {
    common.wrap(specific.wrap(terminal))
}

// ── Stack ─────────────────────────────────────────────────────────────────────

/// An ordered, reusable list of middleware.
///
/// Build it once at startup and share it between routes; cloning copies the
/// list of `Arc`s, not the middleware.
///
/// ```rust
/// use faultline::{BoxedHandler, Error, Request, Response, Stack};
///
/// fn logged(next: BoxedHandler) -> BoxedHandler { next }
/// fn authed(next: BoxedHandler) -> BoxedHandler { next }
///
/// async fn profile(_req: Request) -> Result<Response, Error> {
///     Ok(Response::text("me"))
/// }
///
/// let common = Stack::new().layer(logged);
/// let handler = common.wrap_with(profile, &Stack::new().layer(authed));
/// # let _ = handler;
/// ```
#[derive(Clone, Default)]
pub struct Stack {
    layers: Vec<Arc<dyn Middleware>>,
}

impl Stack {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Appends `middleware` as the innermost layer so far.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Appends every layer of `other`, keeping their order.
    pub fn extend(mut self, other: &Stack) -> Self {
        self.layers.extend(other.layers.iter().cloned());
        self
    }

    pub fn len(&self) -> usize { self.layers.len() }
    pub fn is_empty(&self) -> bool { self.layers.is_empty() }

    /// Specific-only composition: this stack around `terminal`.
    pub fn wrap(&self, terminal: impl Handler) -> BoxedHandler {
        compose(terminal, &self.layers)
    }

    /// Common-plus-specific composition: `specific` around `terminal`, then
    /// this stack around the result.
    pub fn wrap_with(&self, terminal: impl Handler, specific: &Stack) -> BoxedHandler {
        compose_common(self, terminal, specific)
    }
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack").field("layers", &self.layers.len()).finish()
    }
}
