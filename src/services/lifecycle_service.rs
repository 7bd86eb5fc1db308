//! src/services/lifecycle_service.rs
//!
//! LifecycleService — pulls at most one message from the queue, hands it to
//! a [`MessageHandler`] and acknowledges it by deleting its receipt handle.
//!
//! Delivery is at-least-once. The visibility timeout hides a received
//! message from other consumers; a message that is never deleted becomes
//! visible again once that timeout elapses. Whether a processing failure
//! still acknowledges the message is controlled by
//! [`LifecycleConfig::acknowledge_before_process`].

use crate::{
    handlers::message_handlers::MessageHandler,
    models::topology::ReceiveSettings,
    services::provider::{MessagingProvider, ProviderError},
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, Default)]
pub struct LifecycleConfig {
    pub receive: ReceiveSettings,

    /// `true`: delete before processing, so a processing failure loses the
    /// message. `false`: delete only after successful processing, so a
    /// failure leads to redelivery after the visibility timeout.
    pub acknowledge_before_process: bool,
}

/// Terminal state of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing arrived within the long-poll window.
    Empty,
    /// The message was processed and deleted.
    Acknowledged { message_id: String },
    /// The handler failed. `acknowledged` tells whether the message was
    /// already deleted or is still in flight awaiting redelivery.
    ProcessingFailed {
        message_id: String,
        acknowledged: bool,
        reason: String,
    },
    /// The poll was cancelled before a message arrived.
    Cancelled,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("receive failed: {0}")]
    Receive(#[source] ProviderError),
    #[error("acknowledging message `{message_id}` failed: {source}")]
    Delete {
        message_id: String,
        #[source]
        source: ProviderError,
    },
}

#[derive(Clone)]
pub struct LifecycleService {
    provider: Arc<dyn MessagingProvider>,
    config: LifecycleConfig,
}

impl LifecycleService {
    pub fn new(provider: Arc<dyn MessagingProvider>, config: LifecycleConfig) -> Self {
        Self { provider, config }
    }

    /// Delete a delivery by receipt handle.
    ///
    /// Not retried. A failed delete is not message loss: the message comes
    /// back once its visibility timeout expires.
    pub async fn acknowledge(
        &self,
        queue_url: &str,
        message_id: &str,
        receipt_handle: &str,
    ) -> Result<(), LifecycleError> {
        match self.provider.delete_message(queue_url, receipt_handle).await {
            Ok(()) => {
                info!("Message {} deleted", message_id);
                Ok(())
            }
            Err(source) => {
                warn!(
                    "Failed to delete message {}: {}; it will be redelivered after the visibility timeout",
                    message_id, source
                );
                Err(LifecycleError::Delete {
                    message_id: message_id.to_string(),
                    source,
                })
            }
        }
    }

    /// Run one receive → process → acknowledge cycle.
    ///
    /// Cancelling `cancel` while the long poll is pending drops the receive
    /// request and returns [`PollOutcome::Cancelled`].
    pub async fn poll_once(
        &self,
        queue_url: &str,
        handler: &dyn MessageHandler,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, LifecycleError> {
        let received = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Poll cancelled");
                return Ok(PollOutcome::Cancelled);
            }
            result = self.provider.receive_message(queue_url, self.config.receive) => {
                result.map_err(LifecycleError::Receive)?
            }
        };

        let Some(message) = received else {
            info!("No messages available in the queue.");
            return Ok(PollOutcome::Empty);
        };
        info!("Message received: {}", message.body);

        let message_id = message.message_id.clone();

        if self.config.acknowledge_before_process {
            self.acknowledge(queue_url, &message_id, &message.receipt_handle)
                .await?;
            return Ok(match handler.handle(&message).await {
                Ok(()) => PollOutcome::Acknowledged { message_id },
                Err(err) => {
                    warn!(
                        "Processing of message {} failed after it was acknowledged: {}",
                        message_id, err
                    );
                    PollOutcome::ProcessingFailed {
                        message_id,
                        acknowledged: true,
                        reason: err.to_string(),
                    }
                }
            });
        }

        if let Err(err) = handler.handle(&message).await {
            warn!(
                "Processing of message {} failed, leaving it for redelivery: {}",
                message_id, err
            );
            return Ok(PollOutcome::ProcessingFailed {
                message_id,
                acknowledged: false,
                reason: err.to_string(),
            });
        }

        self.acknowledge(queue_url, &message_id, &message.receipt_handle)
            .await?;
        Ok(PollOutcome::Acknowledged { message_id })
    }
}
