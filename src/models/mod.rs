//! Core data models for the topic → queue bridge.
//!
//! Every entity here is either a provider-side identifier or a JSON document
//! exchanged with the provider; nothing is persisted locally.

pub mod message;
pub mod policy;
pub mod topology;
