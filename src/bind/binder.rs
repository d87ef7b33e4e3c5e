use {
    super::{
        FieldLayout, LayoutIssue, Part,
        decode::Source,
        handler::{BoxFuture, Endpoint, IntoOutcome, Outcome, OutputShape, Responder},
    },
    crate::{Config, EnvelopeResponder, Error},
    axum::{body::Body, handler::Handler, response::Response},
    http::Request,
    std::{fmt, marker::PhantomData, panic::Location, sync::Arc},
    thiserror::Error,
};

/// Body limit used when the binder is not built from a [`Config`].
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Adapts plain async handlers into axum handlers.
///
/// [`Binder::bind`] validates a handler's request struct once, at
/// registration, and returns every problem found. The resulting [`Bound`]
/// decodes each request into a fresh struct, calls the handler and hands
/// the outcome to the [`Responder`].
///
/// ```rust
/// use axum::{Router, routing::post};
/// use axum_bind::{Binder, Code, Context, bind_request};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Deserialize, Serialize)]
/// struct Greeting {
///     name: String,
/// }
///
/// bind_request! {
///     struct Greet {
///         body: Greeting,
///     }
/// }
///
/// async fn greet(_: Context, req: Greet) -> Result<String, Code> {
///     Ok(format!("hello {}", req.body.name))
/// }
///
/// let binder = Binder::new();
/// let app: Router = Router::new().route("/greet", post(binder.bind(greet).unwrap()));
/// ```
#[derive(Clone)]
pub struct Binder {
    responder: Arc<dyn Responder>,
    body_limit: usize,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

impl Binder {
    /// Binder answering with the default envelope.
    pub fn new() -> Self {
        Binder {
            responder: Arc::new(EnvelopeResponder::default()),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Binder using the `[response]` section and the body limit of `config`.
    pub fn from_config(config: &Config) -> Self {
        Binder {
            responder: Arc::new(EnvelopeResponder::from_config(&config.response)),
            body_limit: config.http.body_limit(),
        }
    }

    /// Replaces the envelope with a custom responder.
    pub fn with_responder(mut self, responder: impl Responder) -> Self {
        self.responder = Arc::new(responder);
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    /// Validates `handler` and wraps it for axum.
    ///
    /// Errors name the caller's source location and every layout problem.
    /// Handler signatures the binder cannot call do not compile.
    #[track_caller]
    pub fn bind<H, Args>(&self, handler: H) -> Result<Bound<H, Args>, RegistrationError>
    where
        H: Endpoint<Args>,
    {
        let location = Location::caller();
        let name = std::any::type_name::<H>();

        let layout = FieldLayout::<H::Request>::of().map_err(|issues| RegistrationError {
            location,
            handler: name,
            route: None,
            issues,
        })?;

        let descriptor = Descriptor {
            handler: name,
            takes_request: H::TAKES_REQUEST,
            output: <H::Output as IntoOutcome>::SHAPE,
            parts: layout.parts().map(|(part, path)| (part, path.to_string())).collect(),
            location,
        };
        tracing::debug!(
            handler = descriptor.handler,
            takes_request = descriptor.takes_request,
            output = ?descriptor.output,
            parts = ?descriptor.parts,
            location = %descriptor.location,
            "Bound handler"
        );

        Ok(Bound {
            handler,
            shared: Arc::new(Shared {
                layout,
                descriptor,
                responder: Arc::clone(&self.responder),
                body_limit: self.body_limit,
            }),
            _args: PhantomData,
        })
    }
}

/// What the binder learned about a handler at registration.
#[derive(Debug, Clone)]
pub struct Descriptor {
    handler: &'static str,
    takes_request: bool,
    output: OutputShape,
    parts: Vec<(Part, String)>,
    location: &'static Location<'static>,
}

impl Descriptor {
    /// Type name of the handler.
    pub fn handler(&self) -> &'static str {
        self.handler
    }

    pub fn takes_request(&self) -> bool {
        self.takes_request
    }

    pub fn output(&self) -> OutputShape {
        self.output
    }

    /// Bound parts with their field paths, in decode order.
    pub fn parts(&self) -> &[(Part, String)] {
        &self.parts
    }

    /// Where the handler was bound.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

/// A handler whose request struct failed validation.
#[derive(Debug, Clone)]
pub struct RegistrationError {
    location: &'static Location<'static>,
    handler: &'static str,
    route: Option<String>,
    issues: Vec<LayoutIssue>,
}

impl RegistrationError {
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn handler(&self) -> &'static str {
        self.handler
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn issues(&self) -> &[LayoutIssue] {
        &self.issues
    }

    pub(crate) fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot bind `{}` at {}", self.handler, self.location)?;
        if let Some(route) = &self.route {
            write!(f, " for {route}")?;
        }
        f.write_str(": ")?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RegistrationError {}

impl From<RegistrationError> for Error {
    fn from(err: RegistrationError) -> Self {
        Error::registration(err)
    }
}

/// Every handler rejected while building a router.
#[derive(Debug, Error)]
#[error("{} handler(s) failed to bind:\n{}", .0.len(), list(.0))]
pub struct RegistrationErrors(pub Vec<RegistrationError>);

fn list(errors: &[RegistrationError]) -> String {
    errors
        .iter()
        .map(|err| format!("  - {err}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<RegistrationErrors> for Error {
    fn from(errors: RegistrationErrors) -> Self {
        Error::registration(errors)
    }
}

struct Shared<R> {
    layout: FieldLayout<R>,
    descriptor: Descriptor,
    responder: Arc<dyn Responder>,
    body_limit: usize,
}

/// A validated handler, usable anywhere axum takes a handler.
pub struct Bound<H: Endpoint<Args>, Args> {
    handler: H,
    shared: Arc<Shared<H::Request>>,
    _args: PhantomData<fn() -> Args>,
}

impl<H: Endpoint<Args>, Args> Clone for Bound<H, Args> {
    fn clone(&self) -> Self {
        Bound {
            handler: self.handler.clone(),
            shared: Arc::clone(&self.shared),
            _args: PhantomData,
        }
    }
}

impl<H: Endpoint<Args>, Args> fmt::Debug for Bound<H, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("descriptor", &self.shared.descriptor)
            .finish()
    }
}

impl<H: Endpoint<Args>, Args> Bound<H, Args> {
    pub fn descriptor(&self) -> &Descriptor {
        &self.shared.descriptor
    }

    async fn serve(self, request: Request<Body>) -> Response {
        let shared = &self.shared;
        let mut source = Source::collect(request, &shared.layout, shared.body_limit).await;

        let decoded = match shared.layout.decode(&mut source) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::debug!(
                    handler = shared.descriptor.handler,
                    part = %err.part(),
                    error = %err,
                    "Rejected request"
                );
                let ctx = source.context();
                return shared.responder.respond(&ctx, Outcome::from_error(err));
            }
        };

        let ctx = source.context();
        let output = self.handler.call(ctx.clone(), decoded).await;
        shared.responder.respond(&ctx, output.into_outcome())
    }
}

/// Marker type for the [`Handler`] impl of [`Bound`].
#[doc(hidden)]
pub enum BindMarker {}

impl<H, Args, S> Handler<BindMarker, S> for Bound<H, Args>
where
    H: Endpoint<Args>,
    Args: 'static,
    S: Send + Sync + 'static,
{
    type Future = BoxFuture<Response>;

    fn call(self, req: Request<Body>, _state: S) -> Self::Future {
        Box::pin(self.serve(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Code, Context, Data, Layout, bind::BindRequest};

    #[derive(Debug, Default)]
    struct Broken {
        body: u32,
    }

    impl BindRequest for Broken {
        fn layout(layout: &mut Layout<Self>) {
            layout.body(|r: &mut Self| &mut r.body);
            layout.body(|r: &mut Self| &mut r.body);
            layout.unrecognized("cookie");
        }
    }

    async fn broken(_: Context, _: Broken) -> Option<Code> {
        None
    }

    async fn ping(_: Context) -> Data<&'static str> {
        Data("pong")
    }

    #[test]
    fn test_bind_reports_all_issues_with_location() {
        let err = Binder::new().bind(broken).unwrap_err();
        assert_eq!(err.issues().len(), 2);
        assert_eq!(err.location().file(), file!());
        assert!(err.handler().ends_with("broken"));

        let text = err.with_route("POST /broken").to_string();
        assert!(text.contains("for POST /broken"));
        assert!(text.contains("`cookie`"));
        assert!(text.contains("body is bound twice"));
    }

    #[test]
    fn test_descriptor() {
        let bound = Binder::new().bind(ping).unwrap();
        let descriptor = bound.descriptor();
        assert!(!descriptor.takes_request());
        assert_eq!(descriptor.output(), OutputShape::DataOnly);
        assert!(descriptor.parts().is_empty());
        assert_eq!(descriptor.location().file(), file!());
    }

    #[test]
    fn test_registration_errors_convert() {
        let err = Binder::new().bind(broken).unwrap_err();
        let all = RegistrationErrors(vec![err]);
        assert!(all.to_string().starts_with("1 handler(s) failed to bind"));
        let err: Error = all.into();
        assert_eq!(err.kind(), crate::ErrorKind::Registration);
    }

    #[test]
    fn test_with_body_limit() {
        let binder = Binder::new().with_body_limit(10);
        assert_eq!(binder.body_limit(), 10);
        assert_eq!(Binder::default().body_limit(), DEFAULT_BODY_LIMIT);
    }
}
