//! Domain errors for the policy decision point.

use pdp_sdk::EvaluatorError;

/// Startup and reload errors.
///
/// Per-request failures never surface here; they are folded into
/// [`pdp_sdk::Decision`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to prepare rule evaluator: {0}")]
    Prepare(#[from] EvaluatorError),
}
