//! In-memory `MessagingProvider` used by the service tests.
//!
//! Models what the services rely on: idempotent topic creation, distinct
//! queue URL and ARN, policy-gated fan-out from topic to queue wrapped in an
//! SNS envelope, single-use receipt handles and visibility windows.

use crate::{
    models::{
        message::{ReceivedMessage, SnsEnvelope},
        policy::PolicyDocument,
        topology::{QueueSettings, ReceiveSettings},
    },
    services::provider::{MessagingProvider, ProviderError, ProviderResult},
};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    sync::Mutex,
};
use uuid::Uuid;

const ACCOUNT: &str = "000000000000";
const REGION: &str = "ap-south-1";

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
}

#[derive(Debug, Default)]
struct FakeQueue {
    arn: String,
    settings: Option<QueueSettings>,
    policy: Option<String>,
    visible: VecDeque<StoredMessage>,
    in_flight: HashMap<String, StoredMessage>,
}

#[derive(Debug, Default)]
struct State {
    topics: BTreeMap<String, Vec<(String, String)>>,
    queues: BTreeMap<String, FakeQueue>,
    calls: Vec<&'static str>,
    failures: HashSet<&'static str>,
}

#[derive(Debug, Default)]
pub struct FakeProvider {
    state: Mutex<State>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call to `operation` fail with a service error.
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().failures.insert(operation);
    }

    /// Operation names in call order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|c| **c == operation).count()
    }

    /// Enqueue a raw body directly into a queue, bypassing the topic.
    pub fn enqueue(&self, queue_url: &str, body: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let queue = state
            .queues
            .get_mut(queue_url)
            .expect("enqueue into unknown queue");
        let message_id = Uuid::new_v4().to_string();
        queue.visible.push_back(StoredMessage {
            message_id: message_id.clone(),
            body: body.to_string(),
        });
        message_id
    }

    /// Let every in-flight delivery's visibility timeout elapse.
    pub fn expire_visibility(&self, queue_url: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(queue) = state.queues.get_mut(queue_url) {
            let expired: Vec<_> = queue.in_flight.drain().map(|(_, msg)| msg).collect();
            for msg in expired {
                queue.visible.push_front(msg);
            }
        }
    }

    pub fn visible_count(&self, queue_url: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.queues.get(queue_url).map_or(0, |q| q.visible.len())
    }

    pub fn in_flight_count(&self, queue_url: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.queues.get(queue_url).map_or(0, |q| q.in_flight.len())
    }

    pub fn queue_policy(&self, queue_url: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.queues.get(queue_url).and_then(|q| q.policy.clone())
    }

    pub fn queue_settings(&self, queue_url: &str) -> Option<QueueSettings> {
        let state = self.state.lock().unwrap();
        state.queues.get(queue_url).and_then(|q| q.settings)
    }

    pub fn topic_exists(&self, topic_arn: &str) -> bool {
        self.state.lock().unwrap().topics.contains_key(topic_arn)
    }

    pub fn queue_exists(&self, queue_url: &str) -> bool {
        self.state.lock().unwrap().queues.contains_key(queue_url)
    }

    pub fn subscription_count(&self, topic_arn: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.topics.get(topic_arn).map_or(0, Vec::len)
    }

    /// Record the call and honour injected failures.
    fn enter(&self, operation: &'static str) -> ProviderResult<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(operation);
        if state.failures.contains(operation) {
            return Err(ProviderError::service(operation, "injected failure"));
        }
        Ok(state)
    }
}

fn queue_url_for(name: &str) -> String {
    format!("https://sqs.{REGION}.amazonaws.com/{ACCOUNT}/{name}")
}

#[async_trait]
impl MessagingProvider for FakeProvider {
    async fn create_topic(&self, name: &str) -> ProviderResult<String> {
        let mut state = self.enter("CreateTopic")?;
        let arn = format!("arn:aws:sns:{REGION}:{ACCOUNT}:{name}");
        state.topics.entry(arn.clone()).or_default();
        Ok(arn)
    }

    async fn find_queue(&self, name: &str) -> ProviderResult<Option<String>> {
        let state = self.enter("GetQueueUrl")?;
        let url = queue_url_for(name);
        Ok(state.queues.contains_key(&url).then_some(url))
    }

    async fn create_queue(&self, name: &str, settings: QueueSettings) -> ProviderResult<String> {
        let mut state = self.enter("CreateQueue")?;
        let url = queue_url_for(name);
        state.queues.entry(url.clone()).or_insert_with(|| FakeQueue {
            arn: format!("arn:aws:sqs:{REGION}:{ACCOUNT}:{name}"),
            settings: Some(settings),
            ..FakeQueue::default()
        });
        Ok(url)
    }

    async fn queue_arn(&self, queue_url: &str) -> ProviderResult<String> {
        let state = self.enter("GetQueueAttributes")?;
        state
            .queues
            .get(queue_url)
            .map(|q| q.arn.clone())
            .ok_or_else(|| ProviderError::service("GetQueueAttributes", "queue does not exist"))
    }

    async fn set_queue_policy(&self, queue_url: &str, policy: &str) -> ProviderResult<()> {
        let mut state = self.enter("SetQueueAttributes")?;
        let queue = state
            .queues
            .get_mut(queue_url)
            .ok_or_else(|| ProviderError::service("SetQueueAttributes", "queue does not exist"))?;
        queue.policy = Some(policy.to_string());
        Ok(())
    }

    async fn subscribe(&self, topic_arn: &str, queue_arn: &str) -> ProviderResult<String> {
        let mut state = self.enter("Subscribe")?;
        let subscriptions = state
            .topics
            .get_mut(topic_arn)
            .ok_or_else(|| ProviderError::service("Subscribe", "topic does not exist"))?;
        if let Some((arn, _)) = subscriptions.iter().find(|(_, ep)| ep == queue_arn) {
            return Ok(arn.clone());
        }
        let arn = format!("{topic_arn}:{}", Uuid::new_v4());
        subscriptions.push((arn.clone(), queue_arn.to_string()));
        Ok(arn)
    }

    async fn publish(
        &self,
        topic_arn: &str,
        body: &str,
        subject: Option<&str>,
    ) -> ProviderResult<String> {
        let mut state = self.enter("Publish")?;
        let endpoints: Vec<String> = state
            .topics
            .get(topic_arn)
            .ok_or_else(|| ProviderError::service("Publish", "topic does not exist"))?
            .iter()
            .map(|(_, endpoint)| endpoint.clone())
            .collect();

        let message_id = Uuid::new_v4().to_string();
        let envelope = SnsEnvelope {
            kind: "Notification".into(),
            message_id: message_id.clone(),
            topic_arn: topic_arn.to_string(),
            subject: subject.map(str::to_string),
            message: body.to_string(),
            timestamp: Utc::now(),
        };
        let wrapped = serde_json::to_string(&envelope)
            .map_err(|err| ProviderError::service("Publish", err.to_string()))?;

        for endpoint in endpoints {
            let Some(queue) = state.queues.values_mut().find(|q| q.arn == endpoint) else {
                continue;
            };
            // Deliveries the queue policy does not allow are dropped silently.
            let allowed = queue
                .policy
                .as_deref()
                .and_then(|p| serde_json::from_str::<PolicyDocument>(p).ok())
                .is_some_and(|doc| doc.permits(&queue.arn, topic_arn));
            if allowed {
                queue.visible.push_back(StoredMessage {
                    message_id: Uuid::new_v4().to_string(),
                    body: wrapped.clone(),
                });
            }
        }

        Ok(message_id)
    }

    async fn receive_message(
        &self,
        queue_url: &str,
        _settings: ReceiveSettings,
    ) -> ProviderResult<Option<ReceivedMessage>> {
        let mut state = self.enter("ReceiveMessage")?;
        let queue = state
            .queues
            .get_mut(queue_url)
            .ok_or_else(|| ProviderError::service("ReceiveMessage", "queue does not exist"))?;

        let Some(message) = queue.visible.pop_front() else {
            return Ok(None);
        };
        let receipt_handle = Uuid::new_v4().to_string();
        queue
            .in_flight
            .insert(receipt_handle.clone(), message.clone());

        Ok(Some(ReceivedMessage {
            message_id: message.message_id,
            receipt_handle,
            body: message.body,
        }))
    }

    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> ProviderResult<()> {
        let mut state = self.enter("DeleteMessage")?;
        let queue = state
            .queues
            .get_mut(queue_url)
            .ok_or_else(|| ProviderError::service("DeleteMessage", "queue does not exist"))?;
        queue
            .in_flight
            .remove(receipt_handle)
            .map(|_| ())
            .ok_or(ProviderError::InvalidReceiptHandle)
    }

    async fn unsubscribe(&self, subscription_arn: &str) -> ProviderResult<()> {
        let mut state = self.enter("Unsubscribe")?;
        for subscriptions in state.topics.values_mut() {
            subscriptions.retain(|(arn, _)| arn != subscription_arn);
        }
        Ok(())
    }

    async fn delete_queue(&self, queue_url: &str) -> ProviderResult<()> {
        let mut state = self.enter("DeleteQueue")?;
        state.queues.remove(queue_url);
        Ok(())
    }

    async fn delete_topic(&self, topic_arn: &str) -> ProviderResult<()> {
        let mut state = self.enter("DeleteTopic")?;
        state.topics.remove(topic_arn);
        Ok(())
    }
}
