use std::time::Duration;

use async_trait::async_trait;
use course_watch::{CourseInfoSource, RegistrationInfo, SourceError};
use reqwest::Client;
use tracing::debug;

use crate::parse::{parse_course_name, parse_prerequisites, parse_registration_info};

/// Path of the per-section detail page under the base URL
const DETAIL_PAGE_PATH: &str = "bwckschd.p_disp_detail_sched";

/// Settings for [`OscarClient`]
#[derive(Debug, Clone)]
pub struct OscarConfig {
    /// Base URL of the schedule app (default: https://oscar.gatech.edu/bprod)
    pub base_url: String,

    /// Per-request timeout (default: 30 seconds)
    pub timeout: Duration,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for OscarConfig {
    fn default() -> Self {
        Self {
            base_url: "https://oscar.gatech.edu/bprod".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// Client for the OSCAR class schedule detail pages
pub struct OscarClient {
    client: Client,
    base_url: String,
}

impl OscarClient {
    /// Create a new client
    pub fn new(config: Option<OscarConfig>) -> Result<Self, SourceError> {
        let config = config.unwrap_or_default();

        let client = Client::builder()
            .user_agent(config.user_agent)
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SourceError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the raw detail page for `crn` in `term`
    pub async fn fetch_detail_page(&self, crn: &str, term: &str) -> Result<String, SourceError> {
        let url = format!("{}/{}", self.base_url, DETAIL_PAGE_PATH);
        debug!("Fetching detail page for CRN {} in term {}", crn, term);

        let response = self
            .client
            .get(&url)
            .query(&[("term_in", term), ("crn_in", crn)])
            .send()
            .await
            .map_err(|e| SourceError::Http(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            match status.as_u16() {
                429 => return Err(SourceError::RateLimited),
                404 => return Err(SourceError::NotFound),
                _ => return Err(SourceError::Http(format!("HTTP {}", status))),
            }
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Http(format!("Failed to read response: {}", e)))
    }
}

#[async_trait]
impl CourseInfoSource for OscarClient {
    async fn course_name(&self, crn: &str, term: &str) -> Result<String, SourceError> {
        let page = self.fetch_detail_page(crn, term).await?;
        parse_course_name(&page)
    }

    async fn registration_info(
        &self,
        crn: &str,
        term: &str,
    ) -> Result<RegistrationInfo, SourceError> {
        let page = self.fetch_detail_page(crn, term).await?;
        parse_registration_info(&page)
    }

    async fn prerequisites(&self, crn: &str, term: &str) -> Result<String, SourceError> {
        let page = self.fetch_detail_page(crn, term).await?;
        parse_prerequisites(&page)
    }
}
