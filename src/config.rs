use crate::{
    models::topology::{QueueSettings, ReceiveSettings},
    services::{lifecycle_service::LifecycleConfig, provisioning_service::TopologySpec},
};
use anyhow::{Context, Result, ensure};
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_sqs::config::Region;
use clap::Parser;
use std::{env, str::FromStr};

const ENV_PREFIX: &str = "TOPIC_BRIDGE_";

/// SQS hard limits.
const MAX_DELAY_SECONDS: u32 = 900;
const MIN_RETENTION_SECONDS: u32 = 60;
const MAX_RETENTION_SECONDS: u32 = 1_209_600;
const MAX_WAIT_SECONDS: u32 = 20;
const MAX_VISIBILITY_TIMEOUT_SECONDS: u32 = 43_200;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub region: String,
    pub endpoint_url: Option<String>,
    pub topic_name: String,
    pub queue_name: String,
    pub queue_settings: QueueSettings,
    pub receive: ReceiveSettings,
    pub subject: String,
    pub message_text: String,
    pub acknowledge_before_process: bool,
    pub teardown: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Provision an SNS topic and SQS queue, then publish and consume one message"
)]
pub struct Args {
    /// AWS region (overrides TOPIC_BRIDGE_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom endpoint, e.g. LocalStack (overrides TOPIC_BRIDGE_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Topic name (overrides TOPIC_BRIDGE_TOPIC_NAME)
    #[arg(long)]
    pub topic_name: Option<String>,

    /// Queue name (overrides TOPIC_BRIDGE_QUEUE_NAME)
    #[arg(long)]
    pub queue_name: Option<String>,

    /// Delivery delay applied to a newly created queue (overrides TOPIC_BRIDGE_DELAY_SECONDS)
    #[arg(long)]
    pub delay_seconds: Option<u32>,

    /// Message retention of a newly created queue (overrides TOPIC_BRIDGE_RETENTION_SECONDS)
    #[arg(long)]
    pub retention_seconds: Option<u32>,

    /// Long-poll wait per receive (overrides TOPIC_BRIDGE_WAIT_SECONDS)
    #[arg(long)]
    pub wait_seconds: Option<u32>,

    /// Visibility timeout per receive (overrides TOPIC_BRIDGE_VISIBILITY_TIMEOUT)
    #[arg(long)]
    pub visibility_timeout: Option<u32>,

    /// Subject line of the published message (overrides TOPIC_BRIDGE_SUBJECT)
    #[arg(long)]
    pub subject: Option<String>,

    /// Text of the published message (overrides TOPIC_BRIDGE_MESSAGE)
    #[arg(long)]
    pub message: Option<String>,

    /// Delete received messages before processing them
    /// (or TOPIC_BRIDGE_ACKNOWLEDGE_BEFORE_PROCESS=true)
    #[arg(long)]
    pub acknowledge_before_process: bool,

    /// Remove the subscription, queue and topic once the run finishes
    /// (or TOPIC_BRIDGE_TEARDOWN=true)
    #[arg(long)]
    pub teardown: bool,
}

/// Parse `{ENV_PREFIX}{name}` with `default` when unset.
fn env_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let key = format!("{ENV_PREFIX}{name}");
    match lookup(&key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        None => Ok(default),
    }
}

impl AppConfig {
    /// Parse environment variables (including `.env`) + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        // Parse CLI once
        let args = Args::parse();
        Self::from_sources(args, |key| env::var(key).ok())
    }

    /// Merge CLI args over values from `lookup`, falling back to defaults.
    pub fn from_sources(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let queue_defaults = QueueSettings::default();
        let receive_defaults = ReceiveSettings::default();

        // --- Environment fallback ---
        let env_region = env_or(&lookup, "REGION", "ap-south-1".to_string())?;
        let env_endpoint = lookup(&format!("{ENV_PREFIX}ENDPOINT_URL")).filter(|v| !v.is_empty());
        let env_topic = env_or(&lookup, "TOPIC_NAME", "MyNewTopic".to_string())?;
        let env_queue = env_or(&lookup, "QUEUE_NAME", "testQueue1".to_string())?;
        let env_delay = env_or(&lookup, "DELAY_SECONDS", queue_defaults.delay_seconds)?;
        let env_retention = env_or(&lookup, "RETENTION_SECONDS", queue_defaults.retention_seconds)?;
        let env_wait = env_or(&lookup, "WAIT_SECONDS", receive_defaults.wait_seconds)?;
        let env_visibility = env_or(
            &lookup,
            "VISIBILITY_TIMEOUT",
            receive_defaults.visibility_timeout_seconds,
        )?;
        let env_subject = env_or(&lookup, "SUBJECT", "Test Message".to_string())?;
        let env_message = env_or(&lookup, "MESSAGE", "Hello from SNS!".to_string())?;
        let env_ack_first = env_or(&lookup, "ACKNOWLEDGE_BEFORE_PROCESS", false)?;
        let env_teardown = env_or(&lookup, "TEARDOWN", false)?;

        // --- Merge ---
        let cfg = Self {
            region: args.region.unwrap_or(env_region),
            endpoint_url: args.endpoint_url.or(env_endpoint),
            topic_name: args.topic_name.unwrap_or(env_topic),
            queue_name: args.queue_name.unwrap_or(env_queue),
            queue_settings: QueueSettings {
                delay_seconds: args.delay_seconds.unwrap_or(env_delay),
                retention_seconds: args.retention_seconds.unwrap_or(env_retention),
            },
            receive: ReceiveSettings {
                wait_seconds: args.wait_seconds.unwrap_or(env_wait),
                visibility_timeout_seconds: args.visibility_timeout.unwrap_or(env_visibility),
            },
            subject: args.subject.unwrap_or(env_subject),
            message_text: args.message.unwrap_or(env_message),
            acknowledge_before_process: args.acknowledge_before_process || env_ack_first,
            teardown: args.teardown || env_teardown,
        };

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.region.trim().is_empty(), "region must not be empty");
        ensure!(!self.topic_name.trim().is_empty(), "topic name must not be empty");
        ensure!(!self.queue_name.trim().is_empty(), "queue name must not be empty");
        ensure!(
            self.queue_settings.delay_seconds <= MAX_DELAY_SECONDS,
            "delay seconds must be at most {}",
            MAX_DELAY_SECONDS
        );
        ensure!(
            (MIN_RETENTION_SECONDS..=MAX_RETENTION_SECONDS)
                .contains(&self.queue_settings.retention_seconds),
            "retention seconds must be between {} and {}",
            MIN_RETENTION_SECONDS,
            MAX_RETENTION_SECONDS
        );
        ensure!(
            self.receive.wait_seconds <= MAX_WAIT_SECONDS,
            "wait seconds must be at most {}",
            MAX_WAIT_SECONDS
        );
        ensure!(
            self.receive.visibility_timeout_seconds <= MAX_VISIBILITY_TIMEOUT_SECONDS,
            "visibility timeout must be at most {}",
            MAX_VISIBILITY_TIMEOUT_SECONDS
        );
        Ok(())
    }

    pub fn topology_spec(&self) -> TopologySpec {
        TopologySpec {
            topic_name: self.topic_name.clone(),
            queue_name: self.queue_name.clone(),
            queue_settings: self.queue_settings,
        }
    }

    pub fn lifecycle(&self) -> LifecycleConfig {
        LifecycleConfig {
            receive: self.receive,
            acknowledge_before_process: self.acknowledge_before_process,
        }
    }

    /// Load the shared AWS SDK configuration. Credentials come from the
    /// default provider chain.
    pub async fn load_sdk_config(&self) -> SdkConfig {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(self.region.clone()));
        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        loader.load().await
    }
}
