//! Queue access policy granting a single SNS topic permission to deliver
//! into a single SQS queue.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const POLICY_VERSION: &str = "2012-10-17";
pub const SNS_SERVICE_PRINCIPAL: &str = "sns.amazonaws.com";
pub const SEND_MESSAGE_ACTION: &str = "sqs:SendMessage";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("queue ARN must not be empty")]
    EmptyQueueArn,
    #[error("topic ARN must not be empty")]
    EmptyTopicArn,
    #[error("failed to serialize policy: {0}")]
    Serialize(String),
}

/// Top-level IAM-style policy document attached to a queue.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: String,
    pub principal: Principal,
    pub action: String,
    pub resource: String,
    pub condition: Condition,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    pub service: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Condition {
    #[serde(rename = "ArnEquals")]
    pub arn_equals: ArnEquals,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ArnEquals {
    #[serde(rename = "aws:SourceArn")]
    pub source_arn: String,
}

impl PolicyDocument {
    /// Build the document allowing `topic_arn` to send into `queue_arn`.
    ///
    /// Both identifiers must be non-blank; a blank one would still produce a
    /// syntactically valid policy that the topic can never satisfy.
    pub fn allow_topic_to_queue(queue_arn: &str, topic_arn: &str) -> Result<Self, PolicyError> {
        if queue_arn.trim().is_empty() {
            return Err(PolicyError::EmptyQueueArn);
        }
        if topic_arn.trim().is_empty() {
            return Err(PolicyError::EmptyTopicArn);
        }

        Ok(Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![PolicyStatement {
                effect: "Allow".to_string(),
                principal: Principal {
                    service: SNS_SERVICE_PRINCIPAL.to_string(),
                },
                action: SEND_MESSAGE_ACTION.to_string(),
                resource: queue_arn.to_string(),
                condition: Condition {
                    arn_equals: ArnEquals {
                        source_arn: topic_arn.to_string(),
                    },
                },
            }],
        })
    }

    /// True when some statement lets `topic_arn` send into `queue_arn`.
    #[cfg(test)]
    pub fn permits(&self, queue_arn: &str, topic_arn: &str) -> bool {
        self.statement.iter().any(|s| {
            s.effect == "Allow"
                && s.principal.service == SNS_SERVICE_PRINCIPAL
                && s.action == SEND_MESSAGE_ACTION
                && s.resource == queue_arn
                && s.condition.arn_equals.source_arn == topic_arn
        })
    }
}

/// Serialize the queue policy for `queue_arn` trusting `topic_arn`.
///
/// Pure: identical inputs always yield byte-identical output.
pub fn generate_policy(queue_arn: &str, topic_arn: &str) -> Result<String, PolicyError> {
    let document = PolicyDocument::allow_topic_to_queue(queue_arn, topic_arn)?;
    serde_json::to_string(&document).map_err(|err| PolicyError::Serialize(err.to_string()))
}
