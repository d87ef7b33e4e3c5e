use {
    super::{BindRequest, Context, FieldLayout, Part},
    crate::{BoxError, Meta},
    axum::{
        body::Body,
        extract::{FromRequestParts, Query, RawPathParams},
    },
    bytes::Bytes,
    http::{HeaderMap, Request, request::Parts},
    serde::de::DeserializeOwned,
    thiserror::Error,
};

/// A request field failed to decode. Carries the part so the response layer
/// can pick a matching result code.
#[derive(Debug, Error)]
#[error("invalid {part} `{path}`: {source}")]
pub struct BindError {
    part: Part,
    path: String,
    #[source]
    source: BoxError,
}

impl BindError {
    pub fn new(part: Part, path: impl Into<String>, source: impl Into<BoxError>) -> Self {
        BindError {
            part,
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn part(&self) -> Part {
        self.part
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

enum BodyState {
    Unread,
    Buffered(Bytes),
    Consumed,
    Failed(String),
}

/// The parts of one request a layout decodes from.
pub(crate) struct Source {
    parts: Parts,
    body: BodyState,
    path_params: Result<Vec<(String, String)>, String>,
}

impl Source {
    /// Reads what `layout` needs from the request: the path parameters when
    /// a `uri` field is bound and the body, up to `body_limit` bytes, when a
    /// `body` or `context` field is bound.
    pub(crate) async fn collect<R>(
        request: Request<Body>,
        layout: &FieldLayout<R>,
        body_limit: usize,
    ) -> Source {
        let (mut parts, body) = request.into_parts();

        let path_params = if layout.contains(Part::Uri) {
            match RawPathParams::from_request_parts(&mut parts, &()).await {
                Ok(params) => Ok(params
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect()),
                Err(rejection) => Err(rejection.body_text()),
            }
        } else {
            Ok(Vec::new())
        };

        let body = if layout.contains(Part::Body) || layout.contains(Part::Context) {
            match axum::body::to_bytes(body, body_limit).await {
                Ok(bytes) => BodyState::Buffered(bytes),
                Err(err) => BodyState::Failed(format!("failed to read request body: {err}")),
            }
        } else {
            BodyState::Unread
        };

        Source {
            parts,
            body,
            path_params,
        }
    }

    pub(crate) fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Hands out the buffered body. Unless `reuse` is set, later readers find
    /// it consumed.
    pub(crate) fn take_body(&mut self, reuse: bool) -> Result<Bytes, BoxError> {
        match std::mem::replace(&mut self.body, BodyState::Consumed) {
            BodyState::Buffered(bytes) => {
                if reuse {
                    self.body = BodyState::Buffered(bytes.clone());
                }
                Ok(bytes)
            }
            BodyState::Consumed => Err("request body already consumed".into()),
            BodyState::Unread => {
                self.body = BodyState::Unread;
                Err("request body was not read".into())
            }
            BodyState::Failed(reason) => {
                self.body = BodyState::Failed(reason.clone());
                Err(reason.into())
            }
        }
    }

    pub(crate) fn query<V: DeserializeOwned>(&self) -> Result<V, BoxError> {
        let Query(value) = Query::<V>::try_from_uri(&self.parts.uri)?;
        Ok(value)
    }

    /// Path parameters are re-encoded as a form so that typed fields parse
    /// from their text.
    pub(crate) fn path_params<V: DeserializeOwned>(&self) -> Result<V, BoxError> {
        let params = self.path_params.as_ref().map_err(|reason| reason.clone())?;
        let encoded = serde_urlencoded::to_string(params)?;
        Ok(serde_urlencoded::from_str::<V>(&encoded)?)
    }

    pub(crate) fn meta(&self) -> Meta {
        self.parts.extensions.get::<Meta>().cloned().unwrap_or_default()
    }

    /// Snapshot of the request, with the body when it is still available.
    pub(crate) fn context(&self) -> Context {
        let body = match &self.body {
            BodyState::Buffered(bytes) => Some(bytes.clone()),
            _ => None,
        };
        Context::from_parts(&self.parts, body)
    }
}

impl<R: BindRequest> FieldLayout<R> {
    /// Decodes a fresh `R` field by field in decode order. The first failing
    /// field stops decoding unless it is tagged `ignore_error`.
    pub(crate) fn decode(&self, source: &mut Source) -> Result<R, BindError> {
        let mut request = R::default();
        for entry in &self.entries {
            if let Err(err) = (*entry.setter)(&mut request, source, &entry.options) {
                if entry.options.ignore_error {
                    tracing::debug!(
                        part = %entry.part,
                        path = %entry.path,
                        error = %err,
                        "Ignoring request field decode error"
                    );
                    continue;
                }
                return Err(BindError::new(entry.part, entry.path.clone(), err));
            }
        }
        Ok(request)
    }
}
