//! # Notification Services
//!
//! This crate provides the delivery channels for course availability alerts.
//! Each channel implements [`course_watch::MessageSink`]: ntfy push topics,
//! AWS SES email, AWS SNS topics, and a console sink for dry runs.

/// AWS backed sinks (SES email, SNS topics).
pub mod service;
/// ntfy push topic sink.
pub mod push;
/// Log-only sink.
pub mod console;
/// Message formatting and destination checks shared by the sinks.
pub mod types;

pub use console::ConsoleSink;
pub use push::NtfySink;
pub use service::{SesEmailSink, SnsSink};
