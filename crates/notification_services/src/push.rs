use std::time::Duration;

use async_trait::async_trait;
use course_watch::{MessageSink, NotificationError};
use reqwest::Client;

use crate::types::validate_destination;

/// Public ntfy server used when no base URL is configured
pub const DEFAULT_NTFY_URL: &str = "https://ntfy.sh";

/// Push sink for ntfy topics. The destination is the topic name.
#[derive(Debug, Clone)]
pub struct NtfySink {
    client: Client,
    base_url: String,
}

impl NtfySink {
    /// Creates a sink posting to `base_url` (default: [`DEFAULT_NTFY_URL`]).
    pub fn new(base_url: Option<String>) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NotificationError::Push(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.unwrap_or_else(|| DEFAULT_NTFY_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn topic_url(&self, topic: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(topic))
    }
}

#[async_trait]
impl MessageSink for NtfySink {
    async fn send(
        &self,
        title: &str,
        body: &str,
        destination: &str,
    ) -> Result<(), NotificationError> {
        let topic = validate_destination(destination)?;
        let url = self.topic_url(topic);

        let response = self
            .client
            .post(&url)
            .header("Title", title)
            .header("Tags", "mortar_board")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| NotificationError::Push(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(NotificationError::Push(format!(
                "ntfy returned HTTP {} for topic {}",
                response.status(),
                topic
            )));
        }

        log::info!("📣 Pushed \"{}\" to ntfy topic {}", title, topic);
        Ok(())
    }
}
