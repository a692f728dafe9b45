use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::{NotificationError, WatchError};

/// Trait for notification delivery channels (push topic, email, ...)
#[async_trait::async_trait]
pub trait MessageSink: Send + Sync {
    /// Deliver one message to `destination`
    async fn send(
        &self,
        title: &str,
        body: &str,
        destination: &str,
    ) -> Result<(), NotificationError>;
}

/// Zero-argument readiness check evaluated at dispatch time
pub type StatusCheck =
    Arc<dyn Fn() -> BoxFuture<'static, Result<bool, WatchError>> + Send + Sync>;

/// Wrap an async closure as a [`StatusCheck`]
pub fn status_check<F, Fut>(check: F) -> StatusCheck
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, WatchError>> + Send + 'static,
{
    Arc::new(move || check().boxed())
}

/// The check used when a gate is built without one: always ready
pub fn always_ready() -> StatusCheck {
    status_check(|| async { Ok(true) })
}

/// How a gate decides whether to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Re-check every `poll_interval` until ready, then send
    WhenReady {
        /// Pause between checks
        poll_interval: Duration,
    },
    /// Check once, send only if ready
    IfReady,
    /// Send without checking
    Force,
}

/// Outcome of a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The sink accepted the message
    Sent,
    /// The check was false and nothing was sent
    Skipped,
}

/// A notification payload guarded by a readiness check
pub struct NotificationGate {
    title: String,
    body: String,
    status: StatusCheck,
}

impl NotificationGate {
    /// Build a gate. `status` defaults to [`always_ready`] when `None`.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        status: Option<StatusCheck>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            status: status.unwrap_or_else(always_ready),
        }
    }

    /// Notification title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Notification body
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Evaluate the readiness check once
    pub async fn is_ready(&self) -> Result<bool, WatchError> {
        (self.status)().await
    }

    /// Dispatch to `destination` through `sink` according to `mode`
    pub async fn dispatch(
        &self,
        mode: DispatchMode,
        sink: &dyn MessageSink,
        destination: &str,
    ) -> Result<Dispatch, WatchError> {
        match mode {
            DispatchMode::WhenReady { poll_interval } => {
                while !self.is_ready().await? {
                    sleep(poll_interval).await;
                }
            }
            DispatchMode::IfReady => {
                if !self.is_ready().await? {
                    debug!("Skipping \"{}\" to {}: not ready", self.title, destination);
                    return Ok(Dispatch::Skipped);
                }
            }
            DispatchMode::Force => {}
        }

        self.send(sink, destination).await?;
        Ok(Dispatch::Sent)
    }

    async fn send(&self, sink: &dyn MessageSink, destination: &str) -> Result<(), WatchError> {
        sink.send(&self.title, &self.body, destination).await?;
        info!("Sent \"{}\" to {}", self.title, destination);
        Ok(())
    }
}
