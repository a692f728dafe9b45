use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ses::Client as SesClient;
use aws_sdk_sns::Client as SnsClient;
use course_watch::{MessageSink, NotificationError};

use crate::types::{email_subject, email_text, validate_destination, validate_email};

/// Email sink backed by AWS SES.
#[derive(Debug, Clone)]
pub struct SesEmailSink {
    ses_client: SesClient,
    from_email: String,
}

impl SesEmailSink {
    /// Creates a sink from the default AWS configuration chain.
    /// The sender address is read from `FROM_EMAIL`.
    pub async fn new() -> Result<Self, NotificationError> {
        let from_email = std::env::var("FROM_EMAIL").map_err(|_| {
            NotificationError::Ses("FROM_EMAIL environment variable not set".to_string())
        })?;

        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Ok(Self::from_client(SesClient::new(&config), from_email))
    }

    /// Creates a sink around an existing SES client.
    pub fn from_client(ses_client: SesClient, from_email: impl Into<String>) -> Self {
        Self {
            ses_client,
            from_email: from_email.into(),
        }
    }
}

#[async_trait]
impl MessageSink for SesEmailSink {
    async fn send(
        &self,
        title: &str,
        body: &str,
        destination: &str,
    ) -> Result<(), NotificationError> {
        let email = validate_email(destination)?;
        log::info!("📧 Sending \"{}\" to {} via AWS SES", title, email);

        let subject_content = aws_sdk_ses::types::Content::builder()
            .data(email_subject(title))
            .build()
            .map_err(|e| {
                log::error!("❌ Failed to build subject content: {}", e);
                NotificationError::Ses(format!("Failed to build subject: {}", e))
            })?;

        let text_content = aws_sdk_ses::types::Content::builder()
            .data(email_text(title, body))
            .build()
            .map_err(|e| {
                log::error!("❌ Failed to build text content: {}", e);
                NotificationError::Ses(format!("Failed to build text body: {}", e))
            })?;

        let message = aws_sdk_ses::types::Message::builder()
            .subject(subject_content)
            .body(aws_sdk_ses::types::Body::builder().text(text_content).build())
            .build();

        let destination = aws_sdk_ses::types::Destination::builder()
            .to_addresses(email)
            .build();

        let result = self
            .ses_client
            .send_email()
            .source(&self.from_email)
            .destination(destination)
            .message(message)
            .send()
            .await;

        match result {
            Ok(output) => {
                log::info!("📧 SES Message ID: {}", output.message_id());
                Ok(())
            }
            Err(e) => {
                log::error!("❌ AWS SES error: {:#?}", e);
                let error_msg = if let Some(service_error) = e.as_service_error() {
                    format!("AWS SES service error: {:?}", service_error)
                } else {
                    format!("AWS SES error: {}", e)
                };
                Err(NotificationError::Ses(error_msg))
            }
        }
    }
}

/// Sink publishing to AWS SNS topics. The destination is a topic ARN.
#[derive(Debug, Clone)]
pub struct SnsSink {
    sns_client: SnsClient,
}

impl SnsSink {
    /// Creates a sink from the default AWS configuration chain.
    pub async fn new() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::from_client(SnsClient::new(&config))
    }

    /// Creates a sink around an existing SNS client.
    pub fn from_client(sns_client: SnsClient) -> Self {
        Self { sns_client }
    }
}

#[async_trait]
impl MessageSink for SnsSink {
    async fn send(
        &self,
        title: &str,
        body: &str,
        destination: &str,
    ) -> Result<(), NotificationError> {
        let topic_arn = validate_destination(destination)?;
        if !topic_arn.starts_with("arn:") {
            return Err(NotificationError::InvalidDestination(destination.to_string()));
        }

        let output = self
            .sns_client
            .publish()
            .topic_arn(topic_arn)
            .subject(title)
            .message(body)
            .send()
            .await
            .map_err(|e| NotificationError::Sns(e.to_string()))?;

        log::info!(
            "SNS message published to {} (id {})",
            topic_arn,
            output.message_id().unwrap_or("unknown")
        );
        Ok(())
    }
}
