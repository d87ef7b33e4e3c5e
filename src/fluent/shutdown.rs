//! Shutdown notifications.
//!
//! [`BindRouter::start`](crate::BindRouter::start) stops on SIGINT, SIGTERM,
//! or when its [`CancellationToken`] is cancelled. Components learn about it
//! in two ways: the token, for tasks that only need to stop, and a broadcast
//! of [`ShutdownPhase`] values, for tasks that clean up in steps.
//!
//! ```rust,no_run
//! use axum_bind::{BindRouter, Config, ShutdownPhase};
//!
//! # async fn example() -> axum_bind::Result<()> {
//! let router = BindRouter::without_state(Config::default())?;
//! let mut phases = router.subscribe_to_shutdown();
//!
//! tokio::spawn(async move {
//!     while let Ok(phase) = phases.recv().await {
//!         if let ShutdownPhase::GracePeriodStarted { timeout } = phase {
//!             tracing::info!(?timeout, "Draining in-flight requests");
//!         }
//!     }
//! });
//! # Ok(())
//! # }
//! ```

use {std::time::Duration, tokio::sync::broadcast, tokio_util::sync::CancellationToken};

/// Steps of a graceful shutdown, emitted in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShutdownPhase {
    /// A signal arrived or the token was cancelled. New connections are refused.
    Initiated,

    /// In-flight requests are draining for at most `timeout`.
    GracePeriodStarted { timeout: Duration },

    /// The drain timed out and the server stops without waiting further.
    GracePeriodEnded,
}

/// Broadcasts [`ShutdownPhase`]s and owns the shutdown [`CancellationToken`].
///
/// Clones share the same channel and token.
#[derive(Clone)]
pub struct ShutdownNotifier {
    sender: broadcast::Sender<ShutdownPhase>,
    token: CancellationToken,
}

impl ShutdownNotifier {
    /// `capacity` bounds how many phases a slow subscriber may lag behind.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            token: CancellationToken::new(),
        }
    }

    /// A receiver for phases emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownPhase> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    #[must_use]
    pub fn is_shutdown_initiated(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Sends `phase` to every subscriber and returns how many received it.
    /// [`ShutdownPhase::Initiated`] also cancels the token.
    pub(crate) fn emit(&self, phase: ShutdownPhase) -> usize {
        if phase == ShutdownPhase::Initiated {
            self.token.cancel();
        }
        self.sender.send(phase).unwrap_or(0)
    }
}

impl Default for ShutdownNotifier {
    fn default() -> Self {
        Self::new(16)
    }
}

impl std::fmt::Debug for ShutdownNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownNotifier")
            .field("subscribers", &self.sender.receiver_count())
            .field("initiated", &self.is_shutdown_initiated())
            .finish()
    }
}
