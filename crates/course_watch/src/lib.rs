//! # Course Watch
//!
//! This crate provides the tracking engine for course seat availability.
//! It resolves term codes, keeps the file-backed registry of watched
//! (course, topic) pairs, and runs the polling loop that sends a one-shot
//! notification when a watched section opens up.

/// Error types for the engine and its collaborators
mod error;
pub use error::*;

/// Season to term code resolution
mod term;
pub use term::*;

/// Course identity and on-demand availability view
mod course;
pub use course::*;

/// File-backed registry of watched courses
mod registry;
pub use registry::*;

/// Readiness-gated notifications
mod gate;
pub use gate::*;

/// Availability sweeps and the restart supervisor
mod poller;
pub use poller::*;
