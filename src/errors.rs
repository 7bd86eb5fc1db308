use crate::services::{
    lifecycle_service::LifecycleError,
    provisioning_service::{ProvisioningError, TeardownError},
    publish_service::PublishError,
};
use std::process::ExitCode;
use thiserror::Error;

/// Top-level failure of a run. Each variant maps to its own exit status so
/// callers can tell which stage failed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0:#}")]
    Config(anyhow::Error),

    #[error("provisioning failed: {0}")]
    Provisioning(#[from] ProvisioningError),

    #[error("{0}")]
    Publish(#[from] PublishError),

    #[error("{0}")]
    Receive(#[source] LifecycleError),

    #[error("{0}")]
    Delete(#[source] LifecycleError),

    #[error("processing of message `{message_id}` failed: {reason}")]
    Processing { message_id: String, reason: String },

    #[error(transparent)]
    Teardown(#[from] TeardownError),
}

impl AppError {
    /// Process exit status for this failure.
    pub fn code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Provisioning(_) => 3,
            Self::Publish(_) => 4,
            Self::Receive(_) => 5,
            Self::Delete(_) => 6,
            Self::Processing { .. } => 7,
            Self::Teardown(_) => 8,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Receive(_) => Self::Receive(err),
            LifecycleError::Delete { .. } => Self::Delete(err),
        }
    }
}
