//! Request handling middleware: payload limits and request ids.

use super::router::BindRouter;
use crate::{HttpMiddleware, REQUEST_ID_HEADER, utils::RequestIdGenerator};

use {
    axum::extract::DefaultBodyLimit,
    http::HeaderName,
    tower_http::{
        limit::RequestBodyLimitLayer,
        request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    },
};

impl<State> BindRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Rejects bodies larger than `http.max_payload_size_bytes`.
    ///
    /// A declared `Content-Length` over the limit is answered with
    /// `413 Payload Too Large` before any handler runs. A streamed body that
    /// grows past it fails while being read, which a bound handler reports as
    /// a body error.
    #[must_use]
    pub fn setup_max_payload_size(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::MaxPayloadSize) {
            return self;
        }

        self.inner = self
            .inner
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.config.http.body_limit()));
        self
    }

    /// Gives every request an `x-request-id`, keeping the one the client
    /// sent, and copies it onto the response.
    ///
    /// The id is what the envelope reports as `trace_id`.
    #[must_use]
    pub fn setup_request_id(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::RequestId) {
            return self;
        }

        let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);
        self.inner = self
            .inner
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, RequestIdGenerator));
        self
    }
}
