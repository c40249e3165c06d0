//! Policy Enforcement Point (`PEP`) object.
//!
//! [`PolicyEnforcer`] encapsulates the enforcement flow:
//! build request → call PDP → map the outcome to an error the transport layer
//! can render.
//!
//! Constructed once during service initialisation with the PDP client.

use std::sync::Arc;

use crate::api::PolicyDecisionClient;
use crate::decision::{Decision, DenialDescription, Evaluation};
use crate::error::EvaluatorError;
use crate::models::{Operation, Request, Resource, Subject};
use crate::validation::MalformedRequest;

/// Stable error id attached to policy refusals.
pub const POLICY_ERROR_ID: &str = "api.context.policy.app_error";

/// Component name reported as the origin of policy errors.
pub const POLICY_ERROR_WHERE: &str = "authz";

/// Error from the PEP enforcement flow.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnforcerError {
    /// The policy refused the request, explicitly or because no rule applied.
    #[error("access denied by policy: {denial}")]
    Forbidden {
        denial: DenialDescription,
        /// `true` when the refusal came from an undefined policy result.
        undefined: bool,
    },

    /// The request was structurally invalid.
    #[error("malformed authorization request: {reason}")]
    BadRequest {
        reason: MalformedRequest,
        denial: DenialDescription,
    },

    /// The authorization system itself failed.
    #[error("authorization evaluation failed: {0}")]
    Internal(EvaluatorError),
}

impl EnforcerError {
    /// HTTP-style status code for the transport layer.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden { .. } => 403,
            Self::BadRequest { .. } => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable error id.
    #[must_use]
    pub fn error_id(&self) -> &'static str {
        match self {
            Self::Forbidden { .. } => POLICY_ERROR_ID,
            Self::BadRequest { .. } => "api.context.policy.malformed_request",
            Self::Internal(_) => "api.context.policy.engine_failure",
        }
    }

    /// Component the error is attributed to when rendered.
    #[must_use]
    pub fn origin(&self) -> &'static str {
        match self {
            Self::Forbidden { .. } | Self::BadRequest { .. } | Self::Internal(_) => {
                POLICY_ERROR_WHERE
            }
        }
    }

    /// Denial context, when the request was refused or malformed.
    #[must_use]
    pub fn denial(&self) -> Option<&DenialDescription> {
        match self {
            Self::Forbidden { denial, .. } | Self::BadRequest { denial, .. } => Some(denial),
            Self::Internal(_) => None,
        }
    }

    fn from_evaluation(evaluation: Evaluation) -> Option<Self> {
        let denial = evaluation.denial.unwrap_or_default();
        match evaluation.decision {
            Decision::Allowed => None,
            Decision::Denied => Some(Self::Forbidden {
                denial,
                undefined: false,
            }),
            Decision::Undefined(_) => Some(Self::Forbidden {
                denial,
                undefined: true,
            }),
            Decision::Malformed(reason) => Some(Self::BadRequest { reason, denial }),
            Decision::EngineFailure(err) => Some(Self::Internal(err)),
        }
    }
}

/// Policy Enforcement Point.
///
/// Cloneable and cheap to pass around (`Arc` inside).
///
/// # Example
///
/// ```ignore
/// let enforcer = PolicyEnforcer::new(pdp.clone());
///
/// enforcer
///     .check(subject, Operation::Delete, Resource::new(ResourceKind::Post))
///     .await?;
/// ```
#[derive(Clone)]
pub struct PolicyEnforcer {
    pdp: Arc<dyn PolicyDecisionClient>,
}

impl PolicyEnforcer {
    /// Create a new enforcer.
    pub fn new(pdp: Arc<dyn PolicyDecisionClient>) -> Self {
        Self { pdp }
    }

    /// Build a request from its parts and enforce it.
    ///
    /// # Errors
    ///
    /// - [`EnforcerError::Forbidden`] if the policy denies or is undefined
    /// - [`EnforcerError::BadRequest`] if the request is malformed
    /// - [`EnforcerError::Internal`] if the evaluator failed
    pub async fn check(
        &self,
        subject: Subject,
        operation: Operation,
        resource: Resource,
    ) -> Result<(), EnforcerError> {
        self.enforce(&Request::new(subject, operation, resource))
            .await
    }

    /// Evaluate `request` and turn every non-allowed outcome into an error.
    ///
    /// # Errors
    ///
    /// Same as [`PolicyEnforcer::check`].
    pub async fn enforce(&self, request: &Request) -> Result<(), EnforcerError> {
        let evaluation = self.pdp.evaluate(request).await;
        match EnforcerError::from_evaluation(evaluation) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for PolicyEnforcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEnforcer").finish_non_exhaustive()
    }
}
