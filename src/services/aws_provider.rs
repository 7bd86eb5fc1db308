//! src/services/aws_provider.rs
//!
//! AwsProvider — `MessagingProvider` backed by the AWS SDK clients for SNS
//! (topics, subscriptions, publish) and SQS (queues, receive, delete).

use crate::{
    models::{
        message::ReceivedMessage,
        topology::{QueueSettings, ReceiveSettings},
    },
    services::provider::{MessagingProvider, ProviderError, ProviderResult},
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::Client as SnsClient;
use aws_sdk_sqs::{Client as SqsClient, error::DisplayErrorContext, types::QueueAttributeName};
use std::error::Error;
use tracing::debug;

/// Protocol used when subscribing a queue to a topic.
const SQS_PROTOCOL: &str = "sqs";

#[derive(Clone, Debug)]
pub struct AwsProvider {
    sns: SnsClient,
    sqs: SqsClient,
}

impl AwsProvider {
    pub fn new(sns: SnsClient, sqs: SqsClient) -> Self {
        Self { sns, sqs }
    }

    /// Build both clients from one shared SDK configuration.
    pub fn from_config(config: &SdkConfig) -> Self {
        Self::new(SnsClient::new(config), SqsClient::new(config))
    }
}

/// Render an SDK error with its full source chain.
fn sdk_failure<E>(operation: &'static str, err: E) -> ProviderError
where
    E: Error + Send + Sync + 'static,
{
    ProviderError::service(operation, DisplayErrorContext(err).to_string())
}

#[async_trait]
impl MessagingProvider for AwsProvider {
    async fn create_topic(&self, name: &str) -> ProviderResult<String> {
        debug!("CreateTopic name={}", name);
        let output = self
            .sns
            .create_topic()
            .name(name)
            .send()
            .await
            .map_err(|err| sdk_failure("CreateTopic", err))?;

        output
            .topic_arn()
            .map(str::to_string)
            .ok_or(ProviderError::MissingField {
                operation: "CreateTopic",
                field: "TopicArn",
            })
    }

    async fn find_queue(&self, name: &str) -> ProviderResult<Option<String>> {
        debug!("GetQueueUrl name={}", name);
        match self.sqs.get_queue_url().queue_name(name).send().await {
            Ok(output) => Ok(output.queue_url().map(str::to_string)),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|svc| svc.is_queue_does_not_exist()) =>
            {
                Ok(None)
            }
            Err(err) => Err(sdk_failure("GetQueueUrl", err)),
        }
    }

    async fn create_queue(&self, name: &str, settings: QueueSettings) -> ProviderResult<String> {
        debug!(
            "CreateQueue name={} delay={}s retention={}s",
            name, settings.delay_seconds, settings.retention_seconds
        );
        let output = self
            .sqs
            .create_queue()
            .queue_name(name)
            .attributes(
                QueueAttributeName::DelaySeconds,
                settings.delay_seconds.to_string(),
            )
            .attributes(
                QueueAttributeName::MessageRetentionPeriod,
                settings.retention_seconds.to_string(),
            )
            .send()
            .await
            .map_err(|err| sdk_failure("CreateQueue", err))?;

        output
            .queue_url()
            .map(str::to_string)
            .ok_or(ProviderError::MissingField {
                operation: "CreateQueue",
                field: "QueueUrl",
            })
    }

    async fn queue_arn(&self, queue_url: &str) -> ProviderResult<String> {
        debug!("GetQueueAttributes url={}", queue_url);
        let output = self
            .sqs
            .get_queue_attributes()
            .queue_url(queue_url)
            .attribute_names(QueueAttributeName::QueueArn)
            .send()
            .await
            .map_err(|err| sdk_failure("GetQueueAttributes", err))?;

        output
            .attributes()
            .and_then(|attrs| attrs.get(&QueueAttributeName::QueueArn))
            .cloned()
            .ok_or(ProviderError::MissingField {
                operation: "GetQueueAttributes",
                field: "QueueArn",
            })
    }

    async fn set_queue_policy(&self, queue_url: &str, policy: &str) -> ProviderResult<()> {
        debug!("SetQueueAttributes url={} policy={}", queue_url, policy);
        self.sqs
            .set_queue_attributes()
            .queue_url(queue_url)
            .attributes(QueueAttributeName::Policy, policy)
            .send()
            .await
            .map_err(|err| sdk_failure("SetQueueAttributes", err))?;
        Ok(())
    }

    async fn subscribe(&self, topic_arn: &str, queue_arn: &str) -> ProviderResult<String> {
        debug!("Subscribe topic={} endpoint={}", topic_arn, queue_arn);
        let output = self
            .sns
            .subscribe()
            .topic_arn(topic_arn)
            .protocol(SQS_PROTOCOL)
            .endpoint(queue_arn)
            .return_subscription_arn(true)
            .send()
            .await
            .map_err(|err| sdk_failure("Subscribe", err))?;

        output
            .subscription_arn()
            .map(str::to_string)
            .ok_or(ProviderError::MissingField {
                operation: "Subscribe",
                field: "SubscriptionArn",
            })
    }

    async fn publish(
        &self,
        topic_arn: &str,
        body: &str,
        subject: Option<&str>,
    ) -> ProviderResult<String> {
        debug!("Publish topic={} bytes={}", topic_arn, body.len());
        let output = self
            .sns
            .publish()
            .topic_arn(topic_arn)
            .message(body)
            .set_subject(subject.map(str::to_string))
            .send()
            .await
            .map_err(|err| sdk_failure("Publish", err))?;

        output
            .message_id()
            .map(str::to_string)
            .ok_or(ProviderError::MissingField {
                operation: "Publish",
                field: "MessageId",
            })
    }

    async fn receive_message(
        &self,
        queue_url: &str,
        settings: ReceiveSettings,
    ) -> ProviderResult<Option<ReceivedMessage>> {
        debug!(
            "ReceiveMessage url={} wait={}s visibility={}s",
            queue_url, settings.wait_seconds, settings.visibility_timeout_seconds
        );
        let output = self
            .sqs
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(ReceiveSettings::MAX_MESSAGES)
            .wait_time_seconds(settings.wait_seconds as i32)
            .visibility_timeout(settings.visibility_timeout_seconds as i32)
            .send()
            .await
            .map_err(|err| sdk_failure("ReceiveMessage", err))?;

        let Some(message) = output.messages.unwrap_or_default().into_iter().next() else {
            return Ok(None);
        };

        let receipt_handle =
            message
                .receipt_handle()
                .map(str::to_string)
                .ok_or(ProviderError::MissingField {
                    operation: "ReceiveMessage",
                    field: "ReceiptHandle",
                })?;

        Ok(Some(ReceivedMessage {
            message_id: message.message_id().unwrap_or_default().to_string(),
            receipt_handle,
            body: message.body().unwrap_or_default().to_string(),
        }))
    }

    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> ProviderResult<()> {
        debug!("DeleteMessage url={}", queue_url);
        match self
            .sqs
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err)
                if err.as_service_error().is_some_and(|svc| {
                    svc.is_receipt_handle_is_invalid() || svc.is_invalid_id_format()
                }) =>
            {
                Err(ProviderError::InvalidReceiptHandle)
            }
            Err(err) => Err(sdk_failure("DeleteMessage", err)),
        }
    }

    async fn unsubscribe(&self, subscription_arn: &str) -> ProviderResult<()> {
        debug!("Unsubscribe subscription={}", subscription_arn);
        self.sns
            .unsubscribe()
            .subscription_arn(subscription_arn)
            .send()
            .await
            .map_err(|err| sdk_failure("Unsubscribe", err))?;
        Ok(())
    }

    async fn delete_queue(&self, queue_url: &str) -> ProviderResult<()> {
        debug!("DeleteQueue url={}", queue_url);
        self.sqs
            .delete_queue()
            .queue_url(queue_url)
            .send()
            .await
            .map_err(|err| sdk_failure("DeleteQueue", err))?;
        Ok(())
    }

    async fn delete_topic(&self, topic_arn: &str) -> ProviderResult<()> {
        debug!("DeleteTopic topic={}", topic_arn);
        self.sns
            .delete_topic()
            .topic_arn(topic_arn)
            .send()
            .await
            .map_err(|err| sdk_failure("DeleteTopic", err))?;
        Ok(())
    }
}
