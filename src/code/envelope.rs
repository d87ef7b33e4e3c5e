use {
    super::{
        CLIENT_ERR, CLIENT_ERR_BODY, CLIENT_ERR_HEADER, CLIENT_ERR_QUERY, CLIENT_ERR_URI, Code,
        SERVER_ERR, SERVER_ERR_PANIC, SUCCESS, is_client_err, is_server_err,
    },
    crate::{BindError, Context, Outcome, Part, Responder, config::ResponseConfig},
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

/// The JSON body of every bound handler response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub ret: i32,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Response extension holding the envelope `ret`, for middleware that
/// classifies responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ret(pub i32);

/// Response extension marking a code passed through from a downstream
/// service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassThrough;

/// Request extension enabling error detail in envelope messages for the
/// routes it is added to:
///
/// ```rust
/// use axum::{Extension, Router};
/// use axum_bind::ShowErrorDetail;
///
/// let admin: Router = Router::new().layer(Extension(ShowErrorDetail));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowErrorDetail;

/// Request extension enabling the envelope `trace_id` for the routes it is
/// added to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowTraceId;

/// The default [`Responder`]: HTTP 200 with an [`Envelope`].
#[derive(Debug, Clone)]
pub struct EnvelopeResponder {
    default_split: String,
    show_error_detail: bool,
    show_trace_id: bool,
}

impl Default for EnvelopeResponder {
    fn default() -> Self {
        Self::from_config(&ResponseConfig::default())
    }
}

impl EnvelopeResponder {
    pub fn from_config(config: &ResponseConfig) -> Self {
        EnvelopeResponder {
            default_split: config.default_split.clone(),
            show_error_detail: config.shows_error_detail(),
            show_trace_id: config.shows_trace_id(),
        }
    }

    /// Resolves the code, message, trace id and data of an outcome.
    pub fn envelope(&self, ctx: &Context, outcome: Outcome) -> (Code, Envelope) {
        let (data, error) = outcome.into_parts();
        let code = match error {
            None => SUCCESS.clone(),
            Some(err) => match err.downcast::<Code>() {
                Ok(code) => *code,
                Err(err) => match err.downcast::<BindError>() {
                    Ok(bind) => bind_code(bind.part()).clone().with_error(*bind),
                    Err(err) => SERVER_ERR.clone().with_error(err),
                },
            },
        };
        let code = code.localized(ctx.language());

        let show_detail = self.show_error_detail || ctx.get::<ShowErrorDetail>().is_some();
        let msg = if show_detail {
            code.message_with_detail(&self.default_split)
        } else {
            code.message().to_string()
        };

        let show_trace_id = self.show_trace_id || ctx.get::<ShowTraceId>().is_some();
        let trace_id = show_trace_id
            .then(|| ctx.request_id().map(str::to_string))
            .flatten();

        let data = if code.ret() == 0 { data } else { None };
        let envelope = Envelope {
            ret: code.ret(),
            msg,
            trace_id,
            data,
        };
        (code, envelope)
    }
}

fn bind_code(part: Part) -> &'static Code {
    match part {
        Part::Body => &CLIENT_ERR_BODY,
        Part::Query => &CLIENT_ERR_QUERY,
        Part::Uri => &CLIENT_ERR_URI,
        Part::Header => &CLIENT_ERR_HEADER,
        Part::Meta | Part::Context => &CLIENT_ERR,
    }
}

impl Responder for EnvelopeResponder {
    fn respond(&self, ctx: &Context, outcome: Outcome) -> Response {
        let (code, envelope) = self.envelope(ctx, outcome);

        if code.is_server_err() {
            tracing::error!(
                ret = code.ret(),
                error = %code,
                method = %ctx.method(),
                uri = %ctx.uri(),
                "Handler failed"
            );
        } else if code.is_client_err() {
            tracing::debug!(
                ret = code.ret(),
                error = %code,
                method = %ctx.method(),
                uri = %ctx.uri(),
                "Client error"
            );
        }

        let mut response = (StatusCode::OK, Json(envelope)).into_response();
        response.extensions_mut().insert(Ret(code.ret()));
        if code.is_pass() {
            response.extensions_mut().insert(PassThrough);
        }
        response
    }
}

/// HTTP 500 envelope used when a handler panics.
pub fn panic_response() -> Response {
    let code = &*SERVER_ERR_PANIC;
    let envelope = Envelope {
        ret: code.ret(),
        msg: code.message().to_string(),
        trace_id: None,
        data: None,
    };
    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, Json(envelope)).into_response();
    response.extensions_mut().insert(Ret(code.ret()));
    response
}

/// Whether a response is a server error, by HTTP status or envelope `ret`.
pub fn response_is_server_err<B>(response: &http::Response<B>) -> bool {
    response.status().is_server_error()
        || response
            .extensions()
            .get::<Ret>()
            .is_some_and(|Ret(ret)| is_server_err(*ret))
}

/// Whether a response is a client error, by HTTP status or envelope `ret`.
pub fn response_is_client_err<B>(response: &http::Response<B>) -> bool {
    response.status().is_client_error()
        || response
            .extensions()
            .get::<Ret>()
            .is_some_and(|Ret(ret)| is_client_err(*ret))
}

/// Whether the response carries a code passed through from downstream.
pub fn response_is_pass<B>(response: &http::Response<B>) -> bool {
    response.extensions().get::<PassThrough>().is_some()
}
