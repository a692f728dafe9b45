use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use course_watch::{
    CourseInfoSource, CourseRegistry, CourseSnapshot, MessageSink, PollerConfig, RestartPolicy,
};
use notification_services::{ConsoleSink, NtfySink, SesEmailSink, SnsSink};
use oscar::{OscarClient, OscarConfig};

/// Delivery channel for availability alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkKind {
    /// ntfy push topic (destination = topic name)
    Ntfy,
    /// AWS SES email (destination = email address)
    Email,
    /// AWS SNS topic (destination = topic ARN)
    Sns,
    /// Log only
    Console,
}

/// Flags that tune the poller and the restart loop
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackerOptions {
    /// Also sweep for open waitlist spots
    pub waitlist: bool,
    /// Skip courses whose check fails instead of restarting the pass
    pub isolate_failures: bool,
    /// Grow the restart delay exponentially
    pub exponential_backoff: bool,
}

impl TrackerOptions {
    /// Poller settings for these options
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            waitlist_enabled: self.waitlist,
            isolate_course_failures: self.isolate_failures,
            ..PollerConfig::default()
        }
    }

    /// Restart policy for these options
    pub fn restart_policy(&self) -> RestartPolicy {
        RestartPolicy {
            exponential: self.exponential_backoff,
            ..RestartPolicy::default()
        }
    }
}

/// Build the course source, honoring `OSCAR_BASE_URL`
pub fn build_source() -> anyhow::Result<Arc<dyn CourseInfoSource>> {
    let mut config = OscarConfig::default();
    if let Ok(base_url) = std::env::var("OSCAR_BASE_URL") {
        log::info!("🌐 Using schedule site {}", base_url);
        config.base_url = base_url;
    }
    if let Some(timeout) = std::env::var("OSCAR_TIMEOUT_SECS")
        .ok()
        .and_then(|secs| secs.parse().ok())
    {
        config.timeout = Duration::from_secs(timeout);
    }

    Ok(Arc::new(OscarClient::new(Some(config))?))
}

/// Build the notification sink for `kind`
pub async fn build_sink(kind: SinkKind) -> anyhow::Result<Arc<dyn MessageSink>> {
    let sink: Arc<dyn MessageSink> = match kind {
        SinkKind::Ntfy => Arc::new(NtfySink::new(std::env::var("NTFY_BASE_URL").ok())?),
        SinkKind::Email => Arc::new(SesEmailSink::new().await?),
        SinkKind::Sns => Arc::new(SnsSink::new().await),
        SinkKind::Console => Arc::new(ConsoleSink),
    };
    log::info!("📣 Notifications go through {:?}", kind);
    Ok(sink)
}

/// Print a summary of every watched course, one block per course
pub async fn print_course_info(registry: &CourseRegistry) -> anyhow::Result<()> {
    for entry in registry.pairs() {
        let summary = entry.course.summary().await?;
        println!("{}\nnotify: {}\n", summary, entry.topic);
    }
    Ok(())
}

/// Summaries for CRNs given on the command line, in the order given
pub async fn crn_summaries(
    crns: &[String],
    term: &str,
    source: Arc<dyn CourseInfoSource>,
) -> anyhow::Result<Vec<String>> {
    let mut summaries = Vec::with_capacity(crns.len());
    for crn in crns {
        let course = CourseSnapshot::new(crn.as_str(), term, source.clone());
        summaries.push(course.summary().await?);
    }
    Ok(summaries)
}

/// Print a summary of each CRN given on the command line
pub async fn print_crn_info(
    crns: &[String],
    term: &str,
    source: Arc<dyn CourseInfoSource>,
) -> anyhow::Result<()> {
    for summary in crn_summaries(crns, term, source).await? {
        println!("{}\n", summary);
    }
    Ok(())
}
