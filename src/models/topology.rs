//! Identifiers and settings for the topic → queue wiring.

/// Everything provisioning produced, kept so later stages and teardown can
/// address the same resources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topology {
    pub topic_arn: String,

    /// Operational handle for the queue (receive/delete/attributes).
    pub queue_url: String,

    /// Resource identifier for the queue (policy/subscription binding).
    pub queue_arn: String,

    pub subscription_arn: String,
}

/// Attributes applied when a queue is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueSettings {
    pub delay_seconds: u32,
    pub retention_seconds: u32,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            delay_seconds: 0,
            retention_seconds: 86_400,
        }
    }
}

/// Parameters of a single receive call. `max_messages` is always 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiveSettings {
    pub wait_seconds: u32,
    pub visibility_timeout_seconds: u32,
}

impl ReceiveSettings {
    pub const MAX_MESSAGES: i32 = 1;
}

impl Default for ReceiveSettings {
    fn default() -> Self {
        Self {
            wait_seconds: 10,
            visibility_timeout_seconds: 30,
        }
    }
}
