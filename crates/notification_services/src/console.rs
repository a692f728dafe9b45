use async_trait::async_trait;
use course_watch::{MessageSink, NotificationError};

use crate::types::validate_destination;

/// Sink that only logs, for dry runs and local testing
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink;

#[async_trait]
impl MessageSink for ConsoleSink {
    async fn send(
        &self,
        title: &str,
        body: &str,
        destination: &str,
    ) -> Result<(), NotificationError> {
        let destination = validate_destination(destination)?;
        log::info!("🖥️ [CONSOLE] To: {}", destination);
        log::info!("🖥️ [CONSOLE] {}: {}", title, body);
        Ok(())
    }
}
