//! # axum-bind
//!
//! Bind typed request structs to plain async handlers on Axum and answer
//! every request with the same result-code envelope.
//!
//! A handler names the request parts it needs as fields of a request struct.
//! The binder checks that struct once, when the route is registered, and
//! decodes a fresh copy of it for every request:
//!
//! ```rust,no_run
//! use axum_bind::{BindRouter, Code, Config, Context, Meta, Result, bind_request};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Deserialize, Serialize)]
//! struct NewOrder {
//!     sku: String,
//!     quantity: u32,
//! }
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct OrderPath {
//!     shop: u64,
//! }
//!
//! bind_request! {
//!     struct CreateOrder {
//!         body: NewOrder,
//!         uri: OrderPath,
//!         meta: Meta,
//!     }
//! }
//!
//! async fn create_order(_ctx: Context, req: CreateOrder) -> std::result::Result<NewOrder, Code> {
//!     Ok(req.body)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::default();
//!     config.setup_tracing();
//!
//!     BindRouter::without_state(config)?
//!         .post("/shops/{shop}/orders", create_order)
//!         .setup_middleware()?
//!         .start()
//!         .await
//! }
//! ```
//!
//! The answer is always HTTP 200 with a JSON envelope:
//!
//! ```json
//! {"ret": 0, "msg": "success", "data": {"sku": "a-1", "quantity": 2}}
//! ```
//!
//! A body that is not valid JSON never reaches the handler and answers
//! `{"ret": 4004, "msg": "verify body params failed"}`.
//!
//! # Modules
//!
//! - [`Binder`], [`BindRequest`] and [`bind_request!`]: handler adaptation
//!   and request decoding
//! - [`code`]: result codes, the [`CodeBook`] registry and the envelope
//! - [`BindRouter`]: router builder with request ids, logging, timeouts,
//!   payload limits, panic recovery and graceful shutdown
//! - [`Config`]: TOML configuration with `{{ ENV_VAR }}` substitution
//! - [`Meta`]: request-scoped metadata set by upstream middleware

mod bind;
pub mod code;
mod config;
mod error;
mod fluent;
mod meta;
mod utils;

pub use bind::*;
pub use code::{
    Code, CodeBook, CodeError, Envelope, EnvelopeResponder, LOCAL_CODE_LIMIT, Messages,
    PassThrough, Ret, ShowErrorDetail, ShowTraceId, is_client_err, is_server_err,
    panic_response, response_is_client_err, response_is_pass, response_is_server_err,
};
pub use config::*;
pub use error::*;
pub use fluent::*;
pub use meta::*;
pub use utils::*;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
