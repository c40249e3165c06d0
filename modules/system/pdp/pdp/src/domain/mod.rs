//! Domain layer for the policy decision point.

pub mod engine;
pub mod error;
pub mod local_client;
pub mod service;

pub use engine::{DecisionEngine, classify};
pub use error::DomainError;
pub use local_client::PdpLocalClient;
pub use service::Service;
