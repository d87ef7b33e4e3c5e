//! Core `BindRouter` struct and initialization methods.

use {
    super::shutdown::{ShutdownNotifier, ShutdownPhase},
    crate::{Binder, CodeBook, Config, HttpMiddleware, RegistrationError, Responder, Result},
    axum::Router,
    tokio::sync::{broadcast, mpsc},
    tokio_util::sync::CancellationToken,
};

/// Fluent builder around `axum::Router` for bound handlers.
///
/// Handlers registered with [`BindRouter::bind`] (or `get`, `post`, ...) go
/// through a [`Binder`] built from the configuration. A handler whose request
/// struct is invalid does not stop the chain: the problem is recorded and
/// reported, together with every other one, by
/// [`BindRouter::setup_middleware`] or [`BindRouter::validate_routes`].
///
/// ```rust
/// use axum_bind::{BindRouter, Config, Context, Data};
///
/// async fn ping(_: Context) -> Data<&'static str> {
///     Data("pong")
/// }
///
/// # fn example() -> axum_bind::Result<()> {
/// let app = BindRouter::without_state(Config::default())?
///     .get("/ping", ping)
///     .setup_middleware()?
///     .into_inner();
/// # Ok(())
/// # }
/// ```
pub struct BindRouter<State = ()> {
    pub(crate) config: Config,
    pub(crate) state: State,
    pub(crate) inner: Router<State>,
    pub(crate) binder: Binder,
    pub(crate) code_book: CodeBook,
    pub(crate) registration_errors: Vec<RegistrationError>,
    pub(crate) panic_channel: Option<mpsc::Sender<String>>,
    pub(crate) shutdown_notifier: ShutdownNotifier,
}

impl BindRouter {
    /// Creates a new `BindRouter` without application state.
    pub fn without_state(config: Config) -> Result<BindRouter<()>> {
        BindRouter::<()>::with_state(config, ())
    }
}

impl<State> BindRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Creates a new `BindRouter` after validating `config`.
    ///
    /// The binder takes its body limit and envelope settings from the
    /// configuration and the code book uses its `response.code_prefix`.
    pub fn with_state<S: Clone + Send + Sync + 'static>(
        config: Config,
        state: S,
    ) -> Result<BindRouter<S>> {
        config.validate()?;

        let binder = Binder::from_config(&config);
        let code_book = CodeBook::with_prefix(config.response.code_prefix)?;

        Ok(BindRouter {
            config,
            state,
            inner: Router::new(),
            binder,
            code_book,
            registration_errors: Vec::new(),
            panic_channel: None,
            shutdown_notifier: ShutdownNotifier::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The binder used for handlers registered from now on.
    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    /// The service's result codes.
    pub fn code_book(&self) -> &CodeBook {
        &self.code_book
    }

    /// Registers service codes at startup.
    ///
    /// ```rust
    /// # use axum_bind::{BindRouter, Config};
    /// # fn example() -> axum_bind::Result<()> {
    /// let mut router = BindRouter::without_state(Config::default())?;
    /// let sold_out = router.code_book_mut().add_local(-12, "sold out")?;
    /// assert_eq!(sold_out.ret(), -1_000_012);
    /// # Ok(())
    /// # }
    /// ```
    pub fn code_book_mut(&mut self) -> &mut CodeBook {
        &mut self.code_book
    }

    /// Answers handlers registered from now on with `responder` instead of
    /// the envelope.
    #[must_use]
    pub fn with_responder(mut self, responder: impl Responder) -> Self {
        self.binder = self.binder.with_responder(responder);
        self
    }

    #[must_use]
    pub fn shutdown_notifier(&self) -> &ShutdownNotifier {
        &self.shutdown_notifier
    }

    /// Token cancelled when shutdown begins. Cancelling it also stops the
    /// server started by [`BindRouter::start`].
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown_notifier.cancellation_token()
    }

    #[must_use]
    pub fn subscribe_to_shutdown(&self) -> broadcast::Receiver<ShutdownPhase> {
        self.shutdown_notifier.subscribe()
    }

    /// Without a middleware section every middleware is enabled.
    pub(crate) fn is_middleware_enabled(&self, middleware: HttpMiddleware) -> bool {
        self.config
            .http
            .middleware
            .as_ref()
            .map(|config| config.is_enabled(middleware))
            .unwrap_or(true)
    }

    /// Sends a message to `ch` for every panic caught by
    /// [`BindRouter::setup_catch_panic`].
    ///
    /// ```rust,no_run
    /// # use axum_bind::{BindRouter, Config};
    /// # async fn example() -> axum_bind::Result<()> {
    /// let (tx, mut rx) = tokio::sync::mpsc::channel(100);
    /// let router = BindRouter::without_state(Config::default())?
    ///     .with_panic_notification_channel(tx);
    ///
    /// tokio::spawn(async move {
    ///     while let Some(msg) = rx.recv().await {
    ///         eprintln!("{msg}");
    ///     }
    /// });
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_panic_notification_channel(self, ch: mpsc::Sender<String>) -> Self {
        Self {
            panic_channel: Some(ch),
            ..self
        }
    }
}
