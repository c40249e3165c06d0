//! Policy Decision Point Module
//!
//! Validates decision requests, evaluates them against a prepared rule
//! evaluator and classifies the raw result into a [`pdp_sdk::Decision`].
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod module;

pub use config::PdpConfig;
pub use domain::{DecisionEngine, DomainError, PdpLocalClient, Service};
pub use module::PdpModule;
