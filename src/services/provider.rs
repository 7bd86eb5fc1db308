//! The messaging provider seam.
//!
//! Provisioning, publishing and the receive lifecycle talk to the provider
//! only through [`MessagingProvider`], so each can run against the real AWS
//! clients or an in-memory fake.

use crate::models::{
    message::ReceivedMessage,
    topology::{QueueSettings, ReceiveSettings},
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} response is missing `{field}`")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
    #[error("receipt handle is invalid or already consumed")]
    InvalidReceiptHandle,
}

impl ProviderError {
    pub fn service(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            operation,
            message: message.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Control-plane and data-plane calls against the topic/queue provider.
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Create (or return the existing) topic named `name`; yields its ARN.
    async fn create_topic(&self, name: &str) -> ProviderResult<String>;

    /// Look up a queue URL by name. `None` when the queue does not exist.
    async fn find_queue(&self, name: &str) -> ProviderResult<Option<String>>;

    /// Create a queue and return its URL.
    async fn create_queue(&self, name: &str, settings: QueueSettings) -> ProviderResult<String>;

    /// Resolve the ARN of the queue behind `queue_url`.
    async fn queue_arn(&self, queue_url: &str) -> ProviderResult<String>;

    /// Replace the access policy document of a queue.
    async fn set_queue_policy(&self, queue_url: &str, policy: &str) -> ProviderResult<()>;

    /// Subscribe the queue `queue_arn` to the topic; yields the subscription ARN.
    async fn subscribe(&self, topic_arn: &str, queue_arn: &str) -> ProviderResult<String>;

    /// Publish `body` to the topic; yields the provider message id.
    async fn publish(
        &self,
        topic_arn: &str,
        body: &str,
        subject: Option<&str>,
    ) -> ProviderResult<String>;

    /// Long-poll for at most one message.
    async fn receive_message(
        &self,
        queue_url: &str,
        settings: ReceiveSettings,
    ) -> ProviderResult<Option<ReceivedMessage>>;

    /// Acknowledge a delivery by its receipt handle.
    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> ProviderResult<()>;

    async fn unsubscribe(&self, subscription_arn: &str) -> ProviderResult<()>;

    async fn delete_queue(&self, queue_url: &str) -> ProviderResult<()>;

    async fn delete_topic(&self, topic_arn: &str) -> ProviderResult<()>;
}
