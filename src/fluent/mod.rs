//! BindRouter and middleware configuration.
//!
//! - [`router`] - Core `BindRouter` struct and initialization
//! - [`binding`] - Registration of bound handlers
//! - [`observability`] - Request logging
//! - [`request`] - Payload limits and request ids
//! - [`control`] - Timeouts and panic catching
//! - [`builder`] - Orchestration (setup_middleware, start, router delegation)
//! - [`shutdown`] - Shutdown phases and cancellation

mod binding;
mod builder;
mod control;
mod observability;
mod request;
mod router;
mod shutdown;

pub use router::BindRouter;
pub use shutdown::{ShutdownNotifier, ShutdownPhase};

#[cfg(test)]
mod tests;
