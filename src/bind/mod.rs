//! Request binding.
//!
//! A bound handler is a plain async function taking a [`Context`] and,
//! optionally, a request struct:
//!
//! ```text
//! async fn(Context) -> Output
//! async fn(Context, R) -> Output      where R: BindRequest
//! ```
//!
//! The fields of `R` are named after the part of the request they come from
//! and are decoded in a fixed order, stopping at the first failure:
//!
//! | Field     | Source                             | Decoder                  |
//! |-----------|------------------------------------|--------------------------|
//! | `body`    | JSON request body                  | `serde_json`             |
//! | `query`   | query string                       | `serde_urlencoded`       |
//! | `uri`     | path parameters of the route       | `serde_urlencoded`       |
//! | `header`  | request headers                    | [`FromHeaders`]          |
//! | `meta`    | [`Meta`](crate::Meta) set upstream | copied from extensions   |
//! | `context` | the request itself                 | [`Context`] snapshot     |
//!
//! A failing field yields a [`BindError`] tagged with its [`Part`]; the
//! handler is not called. The layout of `R` is validated once, when the
//! handler is bound, and every problem is reported together in a
//! [`RegistrationError`].
//!
//! `Output` is any [`IntoOutcome`]: `()`, `Result<T, E>`, an error type, or
//! [`Data<T>`].

mod binder;
mod context;
mod decode;
mod handler;
mod header;
mod layout;
mod macros;
mod part;

pub use {
    binder::{Binder, BindMarker, Bound, DEFAULT_BODY_LIMIT, Descriptor, RegistrationError, RegistrationErrors},
    context::Context,
    decode::BindError,
    handler::{BoxFuture, Data, Endpoint, IntoOutcome, Outcome, OutputShape, Responder},
    header::{
        FromHeaderValue, FromHeaders, HeaderError, HeaderFieldEntry, HeaderFields, HeaderSchema,
        TimeOptions, Zone, bind_header, parse_timestamp,
    },
    layout::{BindOptions, BindRequest, EntryBuilder, FieldLayout, Layout, LayoutIssue},
    part::Part,
};
