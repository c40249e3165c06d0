#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Policy Decision Point SDK
//!
//! This crate provides the public contract of the `pdp` module:
//!
//! - [`Request`], [`Subject`], [`Resource`], [`Operation`] - Request model
//! - [`ValidatedRequest`], [`MalformedRequest`] - Structural validation
//! - [`Decision`], [`Evaluation`], [`DenialDescription`] - Outcome taxonomy
//! - [`RuleEngine`], [`PreparedQuery`] - Contract for rule-evaluation backends
//! - [`PolicyDecisionClient`] - Public API trait for consumers
//! - [`pep`] - Enforcement helper ([`PolicyEnforcer`], [`EnforcerError`])
//! - [`FlatRequest`] - Adapter for the legacy flat request shape
//!
//! ## Usage
//!
//! ```ignore
//! use pdp_sdk::{Operation, PolicyEnforcer, Resource, ResourceKind, Subject, SubjectKind};
//!
//! let enforcer = PolicyEnforcer::new(pdp_client);
//!
//! enforcer
//!     .check(
//!         Subject::new(SubjectKind::Person, "u1"),
//!         Operation::Read,
//!         Resource::new(ResourceKind::Post).attribute("owner", "u1"),
//!     )
//!     .await?;
//! ```

pub mod adapter;
pub mod api;
pub mod decision;
pub mod error;
pub mod evaluator_api;
pub mod models;
pub mod pep;
pub mod validation;

// Re-export main types at crate root
pub use adapter::FlatRequest;
pub use api::PolicyDecisionClient;
pub use decision::{
    Decision, DenialDescription, Evaluation, EvaluationReport, Outcome, UndefinedReason,
};
pub use error::EvaluatorError;
pub use evaluator_api::{PreparedQuery, ResultSet, RuleEngine, SerializedQuery};
pub use models::{Attributes, Operation, Request, Resource, ResourceKind, Subject, SubjectKind};
pub use pep::{EnforcerError, POLICY_ERROR_ID, POLICY_ERROR_WHERE, PolicyEnforcer};
pub use validation::{MalformedRequest, ValidatedRequest, ValidationOptions};
