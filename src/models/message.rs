//! Messages published to the topic and received from the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Application payload carried through the topic.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    /// Free-form message text.
    pub text: String,

    /// When the payload was generated (serialized as RFC 3339).
    pub timestamp: DateTime<Utc>,
}

impl Payload {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Decode a payload from a queue message body.
    ///
    /// Accepts either the SNS notification envelope that SNS wraps around
    /// deliveries to SQS, or the bare payload when raw delivery is enabled.
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<SnsEnvelope>(body) {
            Ok(envelope) => serde_json::from_str(&envelope.message),
            Err(_) => serde_json::from_str(body),
        }
    }
}

/// The JSON document SNS enqueues into a subscribed SQS queue.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct SnsEnvelope {
    #[serde(rename = "Type")]
    pub kind: String,

    pub message_id: String,

    pub topic_arn: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// The published message body, verbatim.
    pub message: String,

    pub timestamp: DateTime<Utc>,
}

/// One delivery attempt pulled from the queue.
///
/// The receipt handle is only valid for this delivery's visibility window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
}
