//! Publishing application payloads to the topic.

use crate::{
    models::message::Payload,
    services::provider::{MessagingProvider, ProviderError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("publish failed: {0}")]
    Provider(#[from] ProviderError),
}

#[derive(Clone)]
pub struct PublishService {
    provider: Arc<dyn MessagingProvider>,
}

impl PublishService {
    pub fn new(provider: Arc<dyn MessagingProvider>) -> Self {
        Self { provider }
    }

    /// Serialize `payload` as JSON and publish it; returns the message id.
    ///
    /// Returning does not mean any subscriber has the message yet: fan-out
    /// to the queue happens asynchronously on the provider.
    pub async fn publish(
        &self,
        topic_arn: &str,
        payload: &Payload,
        subject: Option<&str>,
    ) -> Result<String, PublishError> {
        let body = serde_json::to_string(payload)?;
        let message_id = self.provider.publish(topic_arn, &body, subject).await?;
        info!("Message published to {}: {}", topic_arn, message_id);
        Ok(message_id)
    }
}
