//! src/services/provisioning_service.rs
//!
//! ProvisioningService — brings the topic, queue, queue policy and
//! subscription into existence in dependency order, and tears them down
//! again on request.
//!
//! Every step is an "ensure": re-running against an account where the
//! resources already exist reuses them instead of failing or duplicating.

use crate::{
    models::{
        policy::{PolicyError, generate_policy},
        topology::{QueueSettings, Topology},
    },
    services::provider::{MessagingProvider, ProviderError},
};
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::{info, warn};

/// The provisioning step that was running when a failure happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProvisioningStep {
    Topic,
    Queue,
    QueueArn,
    Policy,
    Subscription,
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Topic => "ensure topic",
            Self::Queue => "ensure queue",
            Self::QueueArn => "resolve queue ARN",
            Self::Policy => "attach queue policy",
            Self::Subscription => "subscribe queue to topic",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("{step} failed: {source}")]
    Provider {
        step: ProvisioningStep,
        #[source]
        source: ProviderError,
    },
    #[error("{step} failed: {source}")]
    Policy {
        step: ProvisioningStep,
        #[source]
        source: PolicyError,
    },
}

impl ProvisioningError {
    pub fn step(&self) -> ProvisioningStep {
        match self {
            Self::Provider { step, .. } | Self::Policy { step, .. } => *step,
        }
    }
}

#[derive(Debug, Error)]
#[error("teardown left {} resource(s) behind; first failure: {first}", .failures.len())]
pub struct TeardownError {
    pub first: ProviderError,
    pub failures: Vec<String>,
}

pub type ProvisioningResult<T> = Result<T, ProvisioningError>;

fn at(step: ProvisioningStep) -> impl FnOnce(ProviderError) -> ProvisioningError {
    move |source| ProvisioningError::Provider { step, source }
}

/// Names and attributes of the resources to provision.
#[derive(Clone, Debug)]
pub struct TopologySpec {
    pub topic_name: String,
    pub queue_name: String,
    pub queue_settings: QueueSettings,
}

#[derive(Clone)]
pub struct ProvisioningService {
    provider: Arc<dyn MessagingProvider>,
}

impl ProvisioningService {
    pub fn new(provider: Arc<dyn MessagingProvider>) -> Self {
        Self { provider }
    }

    /// Ensure the topic exists. Topic creation is idempotent on the provider
    /// side, so an existing topic's ARN comes back unchanged.
    pub async fn ensure_topic(&self, name: &str) -> ProvisioningResult<String> {
        let topic_arn = self
            .provider
            .create_topic(name)
            .await
            .map_err(at(ProvisioningStep::Topic))?;
        info!("Topic ready: {}", topic_arn);
        Ok(topic_arn)
    }

    /// Ensure the queue exists, reusing one with the same name.
    ///
    /// An existing queue keeps its attributes; `settings` apply only when
    /// the queue is created here.
    pub async fn ensure_queue(
        &self,
        name: &str,
        settings: QueueSettings,
    ) -> ProvisioningResult<String> {
        let existing = self
            .provider
            .find_queue(name)
            .await
            .map_err(at(ProvisioningStep::Queue))?;

        if let Some(queue_url) = existing {
            info!("Reusing existing queue: {}", queue_url);
            return Ok(queue_url);
        }

        let queue_url = self
            .provider
            .create_queue(name, settings)
            .await
            .map_err(at(ProvisioningStep::Queue))?;
        info!("Queue created: {}", queue_url);
        Ok(queue_url)
    }

    /// Attach the policy letting `topic_arn` deliver into the queue.
    pub async fn attach_policy(
        &self,
        queue_url: &str,
        queue_arn: &str,
        topic_arn: &str,
    ) -> ProvisioningResult<()> {
        let policy =
            generate_policy(queue_arn, topic_arn).map_err(|source| ProvisioningError::Policy {
                step: ProvisioningStep::Policy,
                source,
            })?;
        self.provider
            .set_queue_policy(queue_url, &policy)
            .await
            .map_err(at(ProvisioningStep::Policy))?;
        info!("Policy attached to queue {}", queue_url);
        Ok(())
    }

    /// Run the full sequence: topic, queue, queue ARN, policy, subscription.
    ///
    /// Aborts at the first failing step. Resources created by earlier steps
    /// are left in place; [`ProvisioningService::teardown`] removes them.
    pub async fn provision(&self, spec: &TopologySpec) -> ProvisioningResult<Topology> {
        let topic_arn = self.ensure_topic(&spec.topic_name).await?;
        let queue_url = self
            .ensure_queue(&spec.queue_name, spec.queue_settings)
            .await?;

        let queue_arn = self
            .provider
            .queue_arn(&queue_url)
            .await
            .map_err(at(ProvisioningStep::QueueArn))?;
        info!("Queue ARN: {}", queue_arn);

        self.attach_policy(&queue_url, &queue_arn, &topic_arn)
            .await?;

        let subscription_arn = self
            .provider
            .subscribe(&topic_arn, &queue_arn)
            .await
            .map_err(at(ProvisioningStep::Subscription))?;
        info!("Queue subscribed to topic: {}", subscription_arn);

        Ok(Topology {
            topic_arn,
            queue_url,
            queue_arn,
            subscription_arn,
        })
    }

    /// Remove the subscription, queue and topic.
    ///
    /// Every step is attempted even after a failure so one stuck resource does
    /// not strand the others.
    pub async fn teardown(&self, topology: &Topology) -> Result<(), TeardownError> {
        let mut first: Option<ProviderError> = None;
        let mut failures = Vec::new();

        let results = [
            (
                format!("subscription {}", topology.subscription_arn),
                self.provider.unsubscribe(&topology.subscription_arn).await,
            ),
            (
                format!("queue {}", topology.queue_url),
                self.provider.delete_queue(&topology.queue_url).await,
            ),
            (
                format!("topic {}", topology.topic_arn),
                self.provider.delete_topic(&topology.topic_arn).await,
            ),
        ];

        for (resource, result) in results {
            match result {
                Ok(()) => info!("Removed {}", resource),
                Err(err) => {
                    warn!("Failed to remove {}: {}", resource, err);
                    failures.push(resource);
                    first.get_or_insert(err);
                }
            }
        }

        match first {
            None => Ok(()),
            Some(first) => Err(TeardownError { first, failures }),
        }
    }
}
