use crate::{Error, Result};
use serde::Deserialize;

/// Selects which middleware [`BindRouter::setup_middleware`](crate::BindRouter::setup_middleware)
/// installs.
///
/// ```toml
/// [http.middleware]
/// exclude = ["timeout"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMiddlewareConfig {
    Include(Vec<HttpMiddleware>),
    Exclude(Vec<HttpMiddleware>),
}

impl HttpMiddlewareConfig {
    pub fn is_enabled(&self, middleware: HttpMiddleware) -> bool {
        match self {
            HttpMiddlewareConfig::Include(list) => list.contains(&middleware),
            HttpMiddlewareConfig::Exclude(list) => !list.contains(&middleware),
        }
    }

    /// Validates middleware dependencies are satisfied.
    ///
    /// The envelope `trace_id` is the request id, so showing trace ids
    /// without the `request-id` middleware is rejected.
    pub fn validate(&self, shows_trace_id: bool) -> Result<()> {
        if shows_trace_id && !self.is_enabled(HttpMiddleware::RequestId) {
            return Err(Error::invalid_input(
                "response.show_trace_id requires the request-id middleware. Remove 'request-id' from the exclude list or add it to the include list.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HttpMiddleware {
    RequestId,
    Logging,
    Timeout,
    MaxPayloadSize,
    CatchPanic,
}
