//! Traffic control middleware: timeouts and panic catching.

use super::router::BindRouter;
use crate::{HttpMiddleware, panic_response};

use {
    http::StatusCode,
    std::any::Any,
    tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer},
};

impl<State> BindRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Answers `408 Request Timeout` when a request takes longer than
    /// `http.request_timeout`. Does nothing when no timeout is configured.
    #[must_use]
    pub fn setup_timeout(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Timeout) {
            return self;
        }

        if let Some(timeout) = self.config.http.request_timeout {
            self.inner = self.inner.layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            ));
        }
        self
    }

    /// Turns a panicking handler into an HTTP 500 envelope with `ret` 5201.
    ///
    /// The panic message is logged and, when a channel was set with
    /// [`BindRouter::with_panic_notification_channel`], sent to it. The
    /// server keeps running.
    #[must_use]
    pub fn setup_catch_panic(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::CatchPanic) {
            return self;
        }

        let panic_channel = self.panic_channel.clone();
        self.inner = self.inner.layer(CatchPanicLayer::custom(
            move |err: Box<dyn Any + Send + 'static>| {
                let msg = match err.downcast_ref::<String>() {
                    Some(s) => format!("Service panicked: {s}"),
                    None => match err.downcast_ref::<&str>() {
                        Some(s) => format!("Service panicked: {s}"),
                        None => "Service panicked with a non-string payload".to_string(),
                    },
                };

                tracing::error!(panic = %msg, "Handler panicked");
                if let Some(ch) = &panic_channel {
                    ch.try_send(msg).ok();
                }
                panic_response()
            },
        ));
        self
    }
}
