use std::path::PathBuf;

/// Errors raised by a [`CourseInfoSource`](crate::CourseInfoSource) while
/// fetching or parsing a course page.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Transport failure or unexpected HTTP status
    #[error("HTTP error: {0}")]
    Http(String),

    /// The registration site throttled us
    #[error("Rate limited by registration site")]
    RateLimited,

    /// No section with this CRN exists for the term
    #[error("Course not found")]
    NotFound,

    /// The page came back but did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors raised by a [`MessageSink`](crate::MessageSink).
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Push service (ntfy) errors.
    #[error("Push error: {0}")]
    Push(String),

    /// Simple email service (SES) errors.
    #[error("AWS SES error: {0}")]
    Ses(String),

    /// Simple notification service (SNS) errors.
    #[error("AWS SNS error: {0}")]
    Sns(String),

    /// Destination is empty or not usable by this sink.
    #[error("Invalid destination: {0:?}")]
    InvalidDestination(String),
}

/// Errors surfaced by the tracking engine.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Season token is not spring, summer or fall
    #[error("Season must be either spring, summer, or fall (got {0:?})")]
    InvalidSeason(String),

    /// Registry file exists but is not a topic -> CRN list mapping
    #[error("Malformed registry {}: {source}", path.display())]
    ConfigParse {
        /// Registry file
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Registry file could not be read or written
    #[error("Registry storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        /// Registry file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Availability of a course could not be determined
    #[error("Availability check failed for CRN {crn}: {source}")]
    AvailabilityCheckFailed {
        /// Course registration number
        crn: String,
        /// Collaborator error
        #[source]
        source: SourceError,
    },

    /// The sink refused or failed to deliver a notification
    #[error("Notification failed: {0}")]
    NotificationFailed(#[from] NotificationError),
}
