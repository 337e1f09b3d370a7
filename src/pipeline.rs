//! Common middleware plus error translation, configured once.

use crate::compose::Stack;
use crate::handler::Handler;
use crate::translate::{ErrorTranslator, HostHandler};

/// Produces host handlers from a shared common stack and translator.
///
/// Each route adds its own specific stack; the common one always wraps it.
///
/// ```rust,no_run
/// use faultline::{BoxedHandler, Error, ErrorTranslator, Pipeline, Request, Response, Stack};
///
/// fn access_log(next: BoxedHandler) -> BoxedHandler { next }
/// fn require_admin(next: BoxedHandler) -> BoxedHandler { next }
///
/// async fn stats(_req: Request) -> Result<Response, Error> { Ok(Response::text("{}")) }
/// async fn health(_req: Request) -> Result<&'static str, Error> { Ok("ok") }
///
/// let pipeline = Pipeline::new(ErrorTranslator::new()).common(Stack::new().layer(access_log));
///
/// let stats_route = pipeline.route(stats, &Stack::new().layer(require_admin));
/// let health_route = pipeline.plain(health);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    common: Stack,
    translator: ErrorTranslator,
}

impl Pipeline {
    pub fn new(translator: ErrorTranslator) -> Self {
        Self { common: Stack::new(), translator }
    }

    /// Replaces the common stack.
    pub fn common(mut self, common: Stack) -> Self {
        self.common = common;
        self
    }

    /// `specific` around `terminal`, the common stack around that, then
    /// error translation.
    pub fn route(&self, terminal: impl Handler, specific: &Stack) -> HostHandler {
        self.translator.adapt(self.common.wrap_with(terminal, specific))
    }

    /// A route with no specific middleware.
    pub fn plain(&self, terminal: impl Handler) -> HostHandler {
        self.translator.adapt(self.common.wrap(terminal))
    }

    pub fn translator(&self) -> &ErrorTranslator { &self.translator }
}
