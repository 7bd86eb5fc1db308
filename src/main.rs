use std::{process::ExitCode, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod errors;
mod handlers;
mod models;
mod services;

use crate::{
    config::AppConfig,
    errors::AppError,
    handlers::message_handlers::LoggingHandler,
    models::{message::Payload, topology::Topology},
    services::{
        aws_provider::AwsProvider,
        lifecycle_service::{LifecycleService, PollOutcome},
        provider::MessagingProvider,
        provisioning_service::ProvisioningService,
        publish_service::PublishService,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let run_id = Uuid::new_v4();
    match run().instrument(tracing::info_span!("run", %run_id)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(code = err.code(), "{}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<(), AppError> {
    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args().map_err(AppError::Config)?;
    tracing::info!("Starting topic-bridge with config: {:?}", cfg);

    // --- Provider clients ---
    let sdk_config = cfg.load_sdk_config().await;
    let provider: Arc<dyn MessagingProvider> = Arc::new(AwsProvider::from_config(&sdk_config));

    // --- Ctrl-C aborts a pending long poll ---
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    // --- Provision topic, queue, policy, subscription ---
    let provisioning = ProvisioningService::new(provider.clone());
    let topology = match provisioning.provision(&cfg.topology_spec()).await {
        Ok(topology) => topology,
        Err(err) => {
            tracing::warn!(
                "Resources ensured before `{}` were left in place",
                err.step()
            );
            return Err(err.into());
        }
    };
    tracing::info!("Topology ready: {:?}", topology);

    // --- Publish then consume one message ---
    let exchanged = exchange(&cfg, provider, &topology, &cancel).await;

    let torn_down = if cfg.teardown {
        provisioning
            .teardown(&topology)
            .await
            .map_err(AppError::from)
    } else {
        tracing::info!(
            "Leaving topic {} and queue {} in place",
            topology.topic_arn,
            topology.queue_url
        );
        Ok(())
    };

    exchanged.and(torn_down)
}

/// Publish one payload to the topic and run a single receive cycle on the queue.
async fn exchange(
    cfg: &AppConfig,
    provider: Arc<dyn MessagingProvider>,
    topology: &Topology,
    cancel: &CancellationToken,
) -> Result<(), AppError> {
    let publisher = PublishService::new(provider.clone());
    let payload = Payload::new(cfg.message_text.clone());
    publisher
        .publish(&topology.topic_arn, &payload, Some(&cfg.subject))
        .await?;

    tracing::info!("Waiting to receive message from the queue...");
    let lifecycle = LifecycleService::new(provider, cfg.lifecycle());
    match lifecycle
        .poll_once(&topology.queue_url, &LoggingHandler, cancel)
        .await?
    {
        PollOutcome::ProcessingFailed {
            message_id, reason, ..
        } => Err(AppError::Processing { message_id, reason }),
        PollOutcome::Empty | PollOutcome::Acknowledged { .. } | PollOutcome::Cancelled => Ok(()),
    }
}
