//! # Oscar
//!
//! This crate provides a [`course_watch::CourseInfoSource`] backed by the
//! OSCAR class schedule detail pages. It fetches a section's page and scrapes
//! its title, seat counters and prerequisites.

/// HTTP client for the schedule detail page
mod client;
pub use client::*;

/// Scrapers for the detail page HTML
pub mod parse;
