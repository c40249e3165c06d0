//! Public API trait for the policy decision point.

use async_trait::async_trait;

use crate::decision::Evaluation;
use crate::models::Request;

/// Public API trait for the policy decision point.
///
/// Consumed by enforcement layers acting as PEPs:
///
/// ```ignore
/// let evaluation = pdp.evaluate(&request).await;
/// if !evaluation.is_allowed() {
///     return Err(forbidden(evaluation.denial));
/// }
/// ```
#[async_trait]
pub trait PolicyDecisionClient: Send + Sync {
    /// Evaluate an authorization request.
    ///
    /// Infallible by signature: malformed requests and evaluator failures are
    /// reported through [`Decision`](crate::Decision) so that callers cannot
    /// confuse them with policy refusals.
    async fn evaluate(&self, request: &Request) -> Evaluation;
}
