//! Error types for rule-evaluation backends.

use std::time::Duration;

use thiserror::Error;

/// Failures of the rule-evaluation collaborator itself.
///
/// These mean the authorization system is broken, not that a request was
/// disallowed. Policy refusals are expressed through
/// [`Decision::Denied`](crate::Decision::Denied), never through this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluatorError {
    /// The policy bundle could not be read or parsed.
    #[error("failed to load policy bundle '{location}': {reason}")]
    BundleLoad { location: String, reason: String },

    /// The fixed query expression is invalid.
    #[error("failed to compile query '{query}': {reason}")]
    QueryCompile { query: String, reason: String },

    /// The evaluator faulted while running the query.
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// Evaluation did not finish within the configured deadline.
    #[error("evaluation exceeded deadline of {0:?}")]
    Timeout(Duration),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}
