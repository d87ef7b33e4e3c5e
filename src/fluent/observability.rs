//! Observability middleware: request logging.

use super::router::BindRouter;
use crate::{HttpMiddleware, utils};

use {axum::body::Body, http::Request, tower_http::trace::TraceLayer};

impl<State> BindRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Logs every request inside an `http_request` span carrying the method,
    /// the URI and the request id.
    ///
    /// Install [`BindRouter::setup_request_id`] after this layer so that the
    /// span sees generated ids too. [`BindRouter::setup_middleware`] does.
    #[must_use]
    pub fn setup_logging(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Logging) {
            return self;
        }

        self.inner = self.inner.layer(TraceLayer::new_for_http().make_span_with(
            |request: &Request<Body>| {
                let request_id = utils::request_id(request.headers()).unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            },
        ));
        self
    }
}
