//! Orchestration and router delegation: setup_middleware(), start(), layer(), route(), etc.

use super::router::BindRouter;
use super::shutdown::{ShutdownNotifier, ShutdownPhase};
use crate::{RegistrationErrors, Result};

use {
    axum::{Router, body::Body, routing::Route},
    http::Request,
    std::{convert::Infallible, net::SocketAddr, time::Duration},
    tokio::signal,
    tower::{Layer, Service},
};

impl<State> BindRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up the standard middleware in the right order.
    ///
    /// Fails with [`ErrorKind::Registration`](crate::ErrorKind::Registration),
    /// listing every rejected handler, when any bound handler failed
    /// validation. Nothing is served in that case.
    ///
    /// # Middleware Order
    ///
    /// The last layer added is the outermost one and sees a request first.
    /// From innermost to outermost:
    ///
    /// 1. **Max payload size** - bounds request bodies
    /// 2. **Timeout** - answers 408 past `http.request_timeout` (optional)
    /// 3. **Logging** - one span per request
    /// 4. **Request ID** - set before logging so the span carries it
    /// 5. **Panic catching** - outermost, turns panics into a 500 envelope
    ///
    /// Each middleware can be switched off with `[http.middleware]`:
    ///
    /// ```toml
    /// [http.middleware]
    /// exclude = ["timeout", "logging"]
    /// ```
    ///
    /// Routes added after this call are not wrapped by these layers.
    pub fn setup_middleware(mut self) -> Result<Self> {
        const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");
        const VERSION: &str = env!("CARGO_PKG_VERSION");
        tracing::info!("Starting {PACKAGE_NAME} version {VERSION}...");

        let errors = std::mem::take(&mut self.registration_errors);
        if !errors.is_empty() {
            tracing::error!(count = errors.len(), "Refusing to build router with rejected handlers");
            return Err(RegistrationErrors(errors).into());
        }

        Ok(self
            .setup_max_payload_size() // 1. Body size limits
            .setup_timeout() // 2. Request timeout (optional)
            .setup_logging() // 3. Request/response logging
            .setup_request_id() // 4. Request ID - before logging sees the request
            .setup_catch_panic()) // 5. Outermost - panic recovery
    }

    /// Starts the HTTP server.
    ///
    /// The server stops on SIGINT, SIGTERM, or when the router's
    /// [cancellation token](BindRouter::cancellation_token) is cancelled.
    /// It then emits [`ShutdownPhase::Initiated`], stops accepting
    /// connections, emits [`ShutdownPhase::GracePeriodStarted`] and waits
    /// for in-flight requests for at most `http.shutdown_timeout`. When that
    /// expires, [`ShutdownPhase::GracePeriodEnded`] is emitted and the
    /// server returns without waiting further.
    ///
    /// Fails before binding the socket when a handler was rejected.
    pub async fn start(self) -> Result<()> {
        self.validate_routes()?;

        let bind_addr = self.config.http.full_bind_addr();
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Bound to {}", &bind_addr);
        tracing::info!("Waiting for connections");

        let service = self
            .inner
            .with_state(self.state)
            .into_make_service_with_connect_info::<SocketAddr>();

        let shutdown_timeout = self.config.http.shutdown_timeout;
        let shutdown_notifier = self.shutdown_notifier.clone();
        let mut shutdown_rx = shutdown_notifier.subscribe();

        let serve_future = axum::serve(listener, service).with_graceful_shutdown(
            shutdown_signal_with_notifications(shutdown_timeout, shutdown_notifier.clone()),
        );

        // The timeout only starts once shutdown was initiated.
        tokio::select! {
            result = serve_future => {
                tracing::info!("Graceful shutdown completed");
                result?;
            }
            _ = async {
                loop {
                    match shutdown_rx.recv().await {
                        Ok(ShutdownPhase::Initiated) => break,
                        Ok(_) => continue,
                        Err(_) => std::future::pending::<()>().await,
                    }
                }
                tokio::time::sleep(shutdown_timeout).await;
            } => {
                tracing::warn!("Graceful shutdown timeout expired, forcing shutdown");
                shutdown_notifier.emit(ShutdownPhase::GracePeriodEnded);
            }
        }

        Ok(())
    }

    /// Adds a Tower layer around every route added so far.
    ///
    /// Route groups use it to switch envelope options on for a subset of
    /// routes:
    ///
    /// ```rust
    /// use axum::Extension;
    /// use axum_bind::{BindRouter, Config, Context, ShowErrorDetail};
    ///
    /// async fn debug_me(_: Context) {}
    ///
    /// # fn example() -> axum_bind::Result<()> {
    /// let internal = BindRouter::without_state(Config::default())?
    ///     .get("/debug", debug_me)
    ///     .layer(Extension(ShowErrorDetail))
    ///     .into_inner();
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request<Body>> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request<Body>>>::Response: axum::response::IntoResponse + 'static,
        <L::Service as Service<Request<Body>>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request<Body>>>::Future: Send + 'static,
    {
        self.inner = self.inner.layer(layer);
        self
    }

    /// Adds a plain axum route, not going through the binder.
    #[must_use]
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter<State>) -> Self {
        self.inner = self.inner.route(path, route);
        self
    }

    #[must_use]
    pub fn nest(mut self, path: &str, router: Router<State>) -> Self {
        self.inner = self.inner.nest(path, router);
        self
    }

    #[must_use]
    pub fn merge(mut self, other: Router<State>) -> Self {
        self.inner = self.inner.merge(other);
        self
    }

    pub fn into_inner(self) -> Router<State> {
        self.inner
    }
}

/// Resolves when SIGINT or SIGTERM arrives or the notifier's token is
/// cancelled, after emitting the first two shutdown phases.
pub(crate) async fn shutdown_signal_with_notifications(
    timeout: Duration,
    notifier: ShutdownNotifier,
) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::debug!("Ctrl+C signal received"),
            Err(err) => {
                tracing::warn!("Failed to install Ctrl+C handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut handler) => {
                handler.recv().await;
                tracing::debug!("SIGTERM signal received");
            }
            Err(err) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let token = notifier.cancellation_token();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => tracing::debug!("Shutdown requested through the cancellation token"),
    }

    tracing::info!(
        "Shutdown signal received, starting graceful shutdown (timeout: {}s)",
        timeout.as_secs()
    );
    let subscribers = notifier.emit(ShutdownPhase::Initiated);
    tracing::debug!("Shutdown initiated notification sent to {} subscriber(s)", subscribers);

    notifier.emit(ShutdownPhase::GracePeriodStarted { timeout });
}
