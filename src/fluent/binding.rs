//! Registration of bound handlers: bind(), get(), post(), validate_routes().

use {
    super::router::BindRouter,
    crate::{Endpoint, RegistrationError, RegistrationErrors, Result},
    axum::routing::{MethodFilter, on},
};

impl<State> BindRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Binds `handler` to `path` for the methods in `filter`.
    ///
    /// The handler's request struct is validated here. On failure the route
    /// is left out and the error, naming the caller's location, is kept
    /// until [`BindRouter::setup_middleware`] or
    /// [`BindRouter::validate_routes`] reports it.
    ///
    /// ```rust
    /// use axum::routing::MethodFilter;
    /// use axum_bind::{BindRouter, Config, Context};
    ///
    /// async fn touch(_: Context) {}
    ///
    /// # fn example() -> axum_bind::Result<()> {
    /// let router = BindRouter::without_state(Config::default())?
    ///     .bind("/touch", MethodFilter::PUT.or(MethodFilter::PATCH), touch);
    /// router.validate_routes()?;
    /// # Ok(())
    /// # }
    /// ```
    #[track_caller]
    #[must_use]
    pub fn bind<H, Args>(self, path: &str, filter: MethodFilter, handler: H) -> Self
    where
        H: Endpoint<Args>,
        Args: 'static,
    {
        self.bind_route(path, filter, path.to_string(), handler)
    }

    #[track_caller]
    #[must_use]
    pub fn get<H, Args>(self, path: &str, handler: H) -> Self
    where
        H: Endpoint<Args>,
        Args: 'static,
    {
        self.bind_route(path, MethodFilter::GET, format!("GET {path}"), handler)
    }

    #[track_caller]
    #[must_use]
    pub fn post<H, Args>(self, path: &str, handler: H) -> Self
    where
        H: Endpoint<Args>,
        Args: 'static,
    {
        self.bind_route(path, MethodFilter::POST, format!("POST {path}"), handler)
    }

    #[track_caller]
    #[must_use]
    pub fn put<H, Args>(self, path: &str, handler: H) -> Self
    where
        H: Endpoint<Args>,
        Args: 'static,
    {
        self.bind_route(path, MethodFilter::PUT, format!("PUT {path}"), handler)
    }

    #[track_caller]
    #[must_use]
    pub fn patch<H, Args>(self, path: &str, handler: H) -> Self
    where
        H: Endpoint<Args>,
        Args: 'static,
    {
        self.bind_route(path, MethodFilter::PATCH, format!("PATCH {path}"), handler)
    }

    #[track_caller]
    #[must_use]
    pub fn delete<H, Args>(self, path: &str, handler: H) -> Self
    where
        H: Endpoint<Args>,
        Args: 'static,
    {
        self.bind_route(path, MethodFilter::DELETE, format!("DELETE {path}"), handler)
    }

    #[track_caller]
    fn bind_route<H, Args>(
        mut self,
        path: &str,
        filter: MethodFilter,
        route: String,
        handler: H,
    ) -> Self
    where
        H: Endpoint<Args>,
        Args: 'static,
    {
        match self.binder.bind(handler) {
            Ok(bound) => {
                self.inner = self.inner.route(path, on(filter, bound));
            }
            Err(err) => {
                let err = err.with_route(route);
                tracing::error!(error = %err, "Handler rejected");
                self.registration_errors.push(err);
            }
        }
        self
    }

    /// Handlers rejected so far.
    pub fn registration_errors(&self) -> &[RegistrationError] {
        &self.registration_errors
    }

    /// Fails with every registration error collected so far.
    pub fn validate_routes(&self) -> Result<()> {
        if self.registration_errors.is_empty() {
            return Ok(());
        }
        Err(RegistrationErrors(self.registration_errors.clone()).into())
    }
}
