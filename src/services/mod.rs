//! Service layer: the provider seam and the stages built on top of it.

pub mod aws_provider;
#[cfg(test)]
pub mod fake_provider;
pub mod lifecycle_service;
pub mod provider;
pub mod provisioning_service;
pub mod publish_service;
