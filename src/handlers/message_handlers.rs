//! Message processing hooks invoked by the receive lifecycle.
//!
//! The lifecycle owns receiving and acknowledging; what happens to a message
//! body in between is delegated to a [`MessageHandler`].

use crate::models::message::{Payload, ReceivedMessage};
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("message body is not a valid payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("message rejected: {0}")]
    Rejected(String),
}

/// Processes one received message. `Ok` means the message may be
/// acknowledged.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &ReceivedMessage) -> Result<(), HandlerError>;
}

/// Decodes the payload and logs it. Payloads without text are rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingHandler;

#[async_trait]
impl MessageHandler for LoggingHandler {
    async fn handle(&self, message: &ReceivedMessage) -> Result<(), HandlerError> {
        let payload = Payload::from_body(&message.body)?;
        if payload.text.trim().is_empty() {
            return Err(HandlerError::Rejected("payload text is empty".into()));
        }
        info!(
            message_id = %message.message_id,
            generated_at = %payload.timestamp,
            "Processed message: {}",
            payload.text
        );
        Ok(())
    }
}
