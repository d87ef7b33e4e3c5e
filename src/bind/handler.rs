use {
    super::{BindRequest, Context},
    crate::{BoxError, Code, Error},
    axum::response::Response,
    serde::Serialize,
    serde_json::Value,
    std::{future::Future, pin::Pin},
};

/// Boxed future returned by [`Endpoint::call`].
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// The normalized `(data, error)` pair a handler produced.
#[derive(Debug, Default)]
pub struct Outcome {
    data: Option<Value>,
    error: Option<BoxError>,
}

impl Outcome {
    pub fn empty() -> Self {
        Outcome::default()
    }

    /// Serializes `data`. `null` means no data; a value that fails to
    /// serialize turns into an error.
    pub fn from_data<T: Serialize>(data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(Value::Null) => Outcome::empty(),
            Ok(value) => Outcome {
                data: Some(value),
                error: None,
            },
            Err(err) => Outcome::from_error(Error::internal(format!(
                "failed to serialize response data: {err}"
            ))),
        }
    }

    pub fn from_error(error: impl Into<BoxError>) -> Self {
        Outcome {
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.error.as_deref()
    }

    pub fn into_parts(self) -> (Option<Value>, Option<BoxError>) {
        (self.data, self.error)
    }
}

/// How a handler's return value splits into data and error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// Nothing is returned.
    Empty,
    /// Only an error, absent on success.
    ErrorOnly,
    /// Only data; the handler cannot fail.
    DataOnly,
    /// Data on success, error on failure.
    DataAndError,
}

/// A handler return type.
///
/// Error-like types (`Code`, [`Error`], [`BoxError`], `Option<E>`) are
/// always treated as errors. To return data from a handler that cannot
/// fail, wrap it in [`Data`] or return a [`serde_json::Value`]. To return
/// either, use `Result<T, E>`.
pub trait IntoOutcome: Send + 'static {
    const SHAPE: OutputShape;

    fn into_outcome(self) -> Outcome;
}

/// Data returned by a handler that cannot fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Data<T>(pub T);

impl IntoOutcome for () {
    const SHAPE: OutputShape = OutputShape::Empty;

    fn into_outcome(self) -> Outcome {
        Outcome::empty()
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: Serialize + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    const SHAPE: OutputShape = OutputShape::DataAndError;

    fn into_outcome(self) -> Outcome {
        match self {
            Ok(data) => Outcome::from_data(data),
            Err(err) => Outcome::from_error(err),
        }
    }
}

impl IntoOutcome for Code {
    const SHAPE: OutputShape = OutputShape::ErrorOnly;

    fn into_outcome(self) -> Outcome {
        Outcome::from_error(self)
    }
}

impl IntoOutcome for Error {
    const SHAPE: OutputShape = OutputShape::ErrorOnly;

    fn into_outcome(self) -> Outcome {
        Outcome::from_error(self)
    }
}

impl IntoOutcome for BoxError {
    const SHAPE: OutputShape = OutputShape::ErrorOnly;

    fn into_outcome(self) -> Outcome {
        Outcome::from_error(self)
    }
}

impl<E> IntoOutcome for Option<E>
where
    E: Into<BoxError> + Send + 'static,
{
    const SHAPE: OutputShape = OutputShape::ErrorOnly;

    fn into_outcome(self) -> Outcome {
        match self {
            Some(err) => Outcome::from_error(err),
            None => Outcome::empty(),
        }
    }
}

impl<T> IntoOutcome for Data<T>
where
    T: Serialize + Send + 'static,
{
    const SHAPE: OutputShape = OutputShape::DataOnly;

    fn into_outcome(self) -> Outcome {
        Outcome::from_data(self.0)
    }
}

impl IntoOutcome for Value {
    const SHAPE: OutputShape = OutputShape::DataOnly;

    fn into_outcome(self) -> Outcome {
        Outcome::from_data(self)
    }
}

/// An async handler the binder can call: `async fn(Context)` or
/// `async fn(Context, R)` where `R` is a [`BindRequest`].
///
/// `Args` only disambiguates the two forms; it is inferred.
pub trait Endpoint<Args>: Clone + Send + Sync + 'static {
    type Request: BindRequest;
    type Output: IntoOutcome;

    const TAKES_REQUEST: bool;

    fn call(&self, ctx: Context, request: Self::Request) -> BoxFuture<Self::Output>;
}

impl<F, Fut> Endpoint<(Context,)> for F
where
    F: Fn(Context) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoOutcome,
{
    type Request = ();
    type Output = Fut::Output;

    const TAKES_REQUEST: bool = false;

    fn call(&self, ctx: Context, _: ()) -> BoxFuture<Self::Output> {
        Box::pin(self(ctx))
    }
}

impl<F, Fut, R> Endpoint<(Context, R)> for F
where
    F: Fn(Context, R) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoOutcome,
    R: BindRequest,
{
    type Request = R;
    type Output = Fut::Output;

    const TAKES_REQUEST: bool = true;

    fn call(&self, ctx: Context, request: R) -> BoxFuture<Self::Output> {
        Box::pin(self(ctx, request))
    }
}

/// Turns an [`Outcome`] into the HTTP response.
///
/// The default is [`EnvelopeResponder`](crate::EnvelopeResponder); closures
/// work too:
///
/// ```rust
/// use axum::response::{IntoResponse, Response};
/// use axum_bind::{Binder, Context, Outcome};
///
/// let binder = Binder::new().with_responder(|_: &Context, outcome: Outcome| -> Response {
///     match outcome.error() {
///         Some(err) => err.to_string().into_response(),
///         None => "ok".into_response(),
///     }
/// });
/// ```
pub trait Responder: Send + Sync + 'static {
    fn respond(&self, ctx: &Context, outcome: Outcome) -> Response;
}

impl<F> Responder for F
where
    F: Fn(&Context, Outcome) -> Response + Send + Sync + 'static,
{
    fn respond(&self, ctx: &Context, outcome: Outcome) -> Response {
        self(ctx, outcome)
    }
}
