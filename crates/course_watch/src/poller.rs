use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::course::{CourseInfoSource, CourseSnapshot};
use crate::error::WatchError;
use crate::gate::{
    Dispatch, DispatchMode, MessageSink, NotificationGate, StatusCheck, status_check,
};
use crate::registry::{CourseRegistry, WatchEntry};

/// Which availability a sweep is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKind {
    /// A regular seat is vacant
    Open,
    /// A waitlist spot is vacant
    Waitlist,
}

impl SweepKind {
    /// Notification title for this kind
    pub fn title(self) -> &'static str {
        match self {
            SweepKind::Open => "Course Open",
            SweepKind::Waitlist => "Waitlist Available",
        }
    }

    /// Pause after each course of a sweep
    pub fn delay(self, config: &PollerConfig) -> Duration {
        match self {
            SweepKind::Open => config.open_delay,
            SweepKind::Waitlist => config.waitlist_delay,
        }
    }

    /// Evaluate this kind's predicate for `course` in its own term
    pub async fn check(self, course: &CourseSnapshot) -> Result<bool, WatchError> {
        let term = course.term();
        match self {
            SweepKind::Open => course.is_open_for(term).await,
            SweepKind::Waitlist => course.waitlist_available_for(term).await,
        }
    }

    /// The predicate as a gate check bound to `course`
    pub fn status_check(self, course: CourseSnapshot) -> StatusCheck {
        status_check(move || {
            let course = course.clone();
            async move { self.check(&course).await }
        })
    }
}

/// Poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Pause after each course in the open-seat sweep (default: 5 seconds)
    pub open_delay: Duration,

    /// Pause after each course in the waitlist sweep (default: 3 seconds)
    pub waitlist_delay: Duration,

    /// Run the waitlist sweep after every open-seat sweep (default: off)
    pub waitlist_enabled: bool,

    /// Log and skip a course whose availability check fails instead of
    /// failing the pass. Registry and delivery errors still fail the pass.
    /// (default: off)
    pub isolate_course_failures: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            open_delay: Duration::from_secs(5),
            waitlist_delay: Duration::from_secs(3),
            waitlist_enabled: false,
            isolate_course_failures: false,
        }
    }
}

/// Sequential availability poller over a [`CourseRegistry`]
pub struct AvailabilityPoller {
    registry: CourseRegistry,
    sink: Arc<dyn MessageSink>,
    config: PollerConfig,
}

impl AvailabilityPoller {
    /// Create a poller. `config` falls back to [`PollerConfig::default`].
    pub fn new(
        registry: CourseRegistry,
        sink: Arc<dyn MessageSink>,
        config: Option<PollerConfig>,
    ) -> Self {
        Self {
            registry,
            sink,
            config: config.unwrap_or_default(),
        }
    }

    /// Registry being polled
    pub fn registry(&self) -> &CourseRegistry {
        &self.registry
    }

    /// Sweep until the registry is empty
    pub async fn run(&mut self) -> Result<(), WatchError> {
        while !self.registry.is_empty() {
            let sent = self.run_sweep(SweepKind::Open).await?;
            debug!("Open sweep sent {} notifications", sent);

            if self.config.waitlist_enabled && !self.registry.is_empty() {
                let sent = self.run_sweep(SweepKind::Waitlist).await?;
                debug!("Waitlist sweep sent {} notifications", sent);
            }
        }

        info!("Registry is empty, nothing left to watch");
        Ok(())
    }

    /// One pass over a copy of the current pairs. Returns how many
    /// notifications were sent.
    pub async fn run_sweep(&mut self, kind: SweepKind) -> Result<usize, WatchError> {
        let entries = self.registry.pairs().to_vec();
        debug!("Starting {:?} sweep over {} courses", kind, entries.len());

        let mut sent = 0;
        for entry in &entries {
            match self.notify_if_available(kind, entry).await {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(e @ WatchError::AvailabilityCheckFailed { .. })
                    if self.config.isolate_course_failures =>
                {
                    warn!("Skipping CRN {}: {}", entry.course.crn(), e);
                }
                Err(e) => return Err(e),
            }

            // Throttle requests to the registration site
            sleep(kind.delay(&self.config)).await;
        }

        Ok(sent)
    }

    async fn notify_if_available(
        &mut self,
        kind: SweepKind,
        entry: &WatchEntry,
    ) -> Result<bool, WatchError> {
        let course = &entry.course;

        if !kind.check(course).await? {
            debug!("CRN {} not available ({:?})", course.crn(), kind);
            return Ok(false);
        }

        let name = course.name().await?;
        let check = kind.status_check(course.clone());
        let gate = NotificationGate::new(kind.title(), name, Some(check));

        // The gate checks again right before sending
        match gate
            .dispatch(DispatchMode::IfReady, self.sink.as_ref(), &entry.topic)
            .await?
        {
            Dispatch::Sent => {
                self.registry.remove(course.crn()).await?;
                Ok(true)
            }
            Dispatch::Skipped => {
                info!("CRN {} closed again before the notification went out", course.crn());
                Ok(false)
            }
        }
    }
}

/// Backoff between supervisor restarts
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    /// Delay before the first restart (default: 5 seconds)
    pub backoff: Duration,

    /// Double the delay after each consecutive failed pass (default: off)
    pub exponential: bool,

    /// Upper bound for the exponential delay (default: 5 minutes)
    pub max_backoff: Duration,

    /// Give up after this many consecutive failed passes (default: never)
    pub max_attempts: Option<u32>,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(5),
            exponential: false,
            max_backoff: Duration::from_secs(5 * 60),
            max_attempts: None,
        }
    }
}

impl RestartPolicy {
    /// Delay before restart number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if !self.exponential {
            return self.backoff;
        }

        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// A pass that ended in an error
struct FailedPass {
    error: WatchError,
    /// Entries were removed before the error
    made_progress: bool,
}

/// Restarts the poller from a fresh registry load whenever a pass fails
pub struct Supervisor {
    registry_path: PathBuf,
    term: String,
    source: Arc<dyn CourseInfoSource>,
    sink: Arc<dyn MessageSink>,
    poller_config: PollerConfig,
    restart: RestartPolicy,
}

impl Supervisor {
    /// Create a supervisor for the registry at `registry_path`
    pub fn new(
        registry_path: impl Into<PathBuf>,
        term: impl Into<String>,
        source: Arc<dyn CourseInfoSource>,
        sink: Arc<dyn MessageSink>,
        poller_config: Option<PollerConfig>,
        restart: Option<RestartPolicy>,
    ) -> Self {
        Self {
            registry_path: registry_path.into(),
            term: term.into(),
            source,
            sink,
            poller_config: poller_config.unwrap_or_default(),
            restart: restart.unwrap_or_default(),
        }
    }

    /// Run passes until the registry is empty.
    ///
    /// Only returns an error when [`RestartPolicy::max_attempts`] is set and
    /// exhausted; otherwise failures are retried forever. A failed pass that
    /// still removed entries resets the attempt count.
    pub async fn start(&self) -> Result<(), WatchError> {
        info!(
            "Watching {} for term {}",
            self.registry_path.display(),
            self.term
        );

        let mut attempt: u32 = 0;
        loop {
            let FailedPass {
                error: err,
                made_progress,
            } = match self.run_pass().await {
                Ok(()) => return Ok(()),
                Err(failed) => failed,
            };

            if made_progress {
                attempt = 0;
            }
            attempt += 1;
            if self.restart.max_attempts.is_some_and(|max| attempt >= max) {
                error!("Giving up after {} failed passes: {}", attempt, err);
                return Err(err);
            }

            let delay = self.restart.delay_for(attempt);
            error!(
                "Poller pass failed ({}), restarting in {:?} (attempt {})",
                err, delay, attempt
            );
            sleep(delay).await;
        }
    }

    async fn run_pass(&self) -> Result<(), FailedPass> {
        let registry =
            CourseRegistry::load(&self.registry_path, self.term.as_str(), self.source.clone())
                .await
                .map_err(|error| FailedPass {
                    error,
                    made_progress: false,
                })?;
        let watched = registry.len();

        let mut poller =
            AvailabilityPoller::new(registry, self.sink.clone(), Some(self.poller_config.clone()));
        poller.run().await.map_err(|error| FailedPass {
            error,
            made_progress: poller.registry().len() < watched,
        })
    }
}
