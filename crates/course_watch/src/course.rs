use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{SourceError, WatchError};

/// Capacity counters for either the seats or the waitlist of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeatCounts {
    /// Total capacity
    pub capacity: u32,
    /// Spots already taken
    pub taken: u32,
    /// Spots still vacant
    pub vacant: u32,
}

impl SeatCounts {
    /// Whether at least one spot is vacant
    pub fn has_vacancy(&self) -> bool {
        self.vacant > 0
    }
}

/// Registration availability for one section in one term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistrationInfo {
    /// Regular seats
    pub seats: SeatCounts,
    /// Waitlist seats
    pub waitlist: SeatCounts,
}

/// Trait for the remote registration data provider
#[async_trait::async_trait]
pub trait CourseInfoSource: Send + Sync {
    /// Display name of the section
    async fn course_name(&self, crn: &str, term: &str) -> Result<String, SourceError>;

    /// Current seat and waitlist counters
    async fn registration_info(
        &self,
        crn: &str,
        term: &str,
    ) -> Result<RegistrationInfo, SourceError>;

    /// Cleaned-up prerequisite text
    async fn prerequisites(&self, crn: &str, term: &str) -> Result<String, SourceError>;
}

/// View of one watched section.
///
/// Only the identity (CRN and term) is stored. Every availability accessor goes
/// back to the [`CourseInfoSource`], so two consecutive calls may disagree.
#[derive(Clone)]
pub struct CourseSnapshot {
    crn: String,
    term: String,
    source: Arc<dyn CourseInfoSource>,
}

impl CourseSnapshot {
    /// Create a view over `crn` in `term`. Does not touch the network.
    pub fn new(
        crn: impl Into<String>,
        term: impl Into<String>,
        source: Arc<dyn CourseInfoSource>,
    ) -> Self {
        Self {
            crn: crn.into(),
            term: term.into(),
            source,
        }
    }

    /// Course registration number
    pub fn crn(&self) -> &str {
        &self.crn
    }

    /// Term code this view was created for
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Display name of the section
    pub async fn name(&self) -> Result<String, WatchError> {
        self.source
            .course_name(&self.crn, &self.term)
            .await
            .map_err(|e| self.check_failed(e))
    }

    /// Seat and waitlist counters for `term`
    pub async fn registration_info(&self, term: &str) -> Result<RegistrationInfo, WatchError> {
        debug!("Fetching registration info for CRN {} in {}", self.crn, term);
        self.source
            .registration_info(&self.crn, term)
            .await
            .map_err(|e| self.check_failed(e))
    }

    /// Whether a regular seat is vacant in `term`
    pub async fn is_open_for(&self, term: &str) -> Result<bool, WatchError> {
        Ok(self.registration_info(term).await?.seats.has_vacancy())
    }

    /// Whether a regular seat is vacant in this view's term
    pub async fn is_open(&self) -> Result<bool, WatchError> {
        self.is_open_for(&self.term).await
    }

    /// Whether a waitlist spot is vacant in `term`
    pub async fn waitlist_available_for(&self, term: &str) -> Result<bool, WatchError> {
        Ok(self.registration_info(term).await?.waitlist.has_vacancy())
    }

    /// Whether a waitlist spot is vacant in this view's term
    pub async fn waitlist_available(&self) -> Result<bool, WatchError> {
        self.waitlist_available_for(&self.term).await
    }

    /// Prerequisite text, or `"None"` if it could not be fetched or parsed
    pub async fn prereqs(&self) -> String {
        match self.source.prerequisites(&self.crn, &self.term).await {
            Ok(text) => text,
            Err(e) => {
                debug!("No prerequisites for CRN {}: {}", self.crn, e);
                "None".to_string()
            }
        }
    }

    /// Multi-line human readable report of the section
    pub async fn summary(&self) -> Result<String, WatchError> {
        let name = self.name().await?;
        let info = self.registration_info(&self.term).await?;
        let waitlist_open = self.waitlist_available().await?;
        let prereqs = self.prereqs().await;

        Ok(format!(
            "{}\nseats:\t{}\ntaken:\t{}\nvacant:\t{}\nwaitlist open: {}\nprerequisites: {}",
            name,
            info.seats.capacity,
            info.seats.taken,
            info.seats.vacant,
            if waitlist_open { "yes" } else { "no" },
            prereqs
        ))
    }

    fn check_failed(&self, source: SourceError) -> WatchError {
        WatchError::AvailabilityCheckFailed {
            crn: self.crn.clone(),
            source,
        }
    }
}

impl fmt::Debug for CourseSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CourseSnapshot")
            .field("crn", &self.crn)
            .field("term", &self.term)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CourseSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.crn == other.crn && self.term == other.term
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockSource {
        info: RegistrationInfo,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl CourseInfoSource for MockSource {
        async fn course_name(&self, crn: &str, _term: &str) -> Result<String, SourceError> {
            Ok(format!("Intro to Things - {crn} - CS 1000 - A"))
        }

        async fn registration_info(
            &self,
            _crn: &str,
            term: &str,
        ) -> Result<RegistrationInfo, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if term == "199901" {
                return Err(SourceError::NotFound);
            }
            Ok(self.info)
        }

        async fn prerequisites(&self, _crn: &str, _term: &str) -> Result<String, SourceError> {
            Err(SourceError::Parse("no prerequisites block".to_string()))
        }
    }

    fn snapshot(seats_vacant: u32, waitlist_vacant: u32) -> (CourseSnapshot, Arc<MockSource>) {
        let source = Arc::new(MockSource {
            info: RegistrationInfo {
                seats: SeatCounts {
                    capacity: 30,
                    taken: 30 - seats_vacant,
                    vacant: seats_vacant,
                },
                waitlist: SeatCounts {
                    capacity: 10,
                    taken: 10 - waitlist_vacant,
                    vacant: waitlist_vacant,
                },
            },
            calls: AtomicUsize::new(0),
        });
        (CourseSnapshot::new("12345", "202408", source.clone()), source)
    }

    #[tokio::test]
    async fn open_predicate_reads_vacant_seats() {
        let (open, _) = snapshot(2, 0);
        let (full, _) = snapshot(0, 3);

        assert!(open.is_open().await.unwrap());
        assert!(!open.waitlist_available().await.unwrap());
        assert!(!full.is_open().await.unwrap());
        assert!(full.waitlist_available().await.unwrap());
    }

    #[tokio::test]
    async fn every_query_goes_to_the_source() {
        let (course, source) = snapshot(1, 0);
        course.is_open().await.unwrap();
        course.is_open().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn source_failure_becomes_availability_check_failed() {
        let (course, _) = snapshot(1, 0);
        let err = course.is_open_for("199901").await.unwrap_err();
        match err {
            WatchError::AvailabilityCheckFailed { crn, source } => {
                assert_eq!(crn, "12345");
                assert!(matches!(source, SourceError::NotFound));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn prereqs_fall_back_to_none() {
        let (course, _) = snapshot(0, 0);
        assert_eq!(course.prereqs().await, "None");
    }

    #[tokio::test]
    async fn summary_lists_counts_and_waitlist() {
        let (course, _) = snapshot(4, 1);
        let summary = course.summary().await.unwrap();
        assert_eq!(
            summary,
            "Intro to Things - 12345 - CS 1000 - A\nseats:\t30\ntaken:\t26\nvacant:\t4\nwaitlist open: yes\nprerequisites: None"
        );
    }
}
