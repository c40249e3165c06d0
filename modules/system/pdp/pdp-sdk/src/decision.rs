//! Decision taxonomy.
//!
//! Every evaluation ends in exactly one [`Decision`]. Only
//! [`Decision::Allowed`] grants access; everything else fails closed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EvaluatorError;
use crate::models::{Attributes, Request};
use crate::validation::MalformedRequest;

/// Why a decision could not be determined from the evaluator output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndefinedReason {
    /// The evaluator produced zero result sets: no rule matched.
    NoResults,
    /// A result set exists but the bound variable is missing or not a boolean.
    UnexpectedResult {
        binding: String,
        /// JSON type observed for the binding (`"missing"` when absent).
        found: String,
    },
}

impl fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResults => f.write_str("no rule produced a result"),
            Self::UnexpectedResult { binding, found } => {
                write!(f, "binding '{binding}' is {found}, expected boolean")
            }
        }
    }
}

/// Outcome of a single evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The policy granted the request.
    Allowed,
    /// The policy refused the request.
    Denied,
    /// No determinate answer; enforced as a denial.
    Undefined(UndefinedReason),
    /// The request was structurally invalid and never reached the evaluator.
    Malformed(MalformedRequest),
    /// The evaluator is unavailable or broken.
    EngineFailure(EvaluatorError),
}

impl Decision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// `true` for outcomes that are a policy-level refusal (explicit or
    /// fail-closed), as opposed to a client or system defect.
    #[must_use]
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::Denied | Self::Undefined(_))
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Allowed => Outcome::Allowed,
            Self::Denied => Outcome::Denied,
            Self::Undefined(_) => Outcome::Undefined,
            Self::Malformed(_) => Outcome::Malformed,
            Self::EngineFailure(_) => Outcome::EngineFailure,
        }
    }

    /// Human-readable cause for non-decisive outcomes.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Allowed | Self::Denied => None,
            Self::Undefined(reason) => Some(reason.to_string()),
            Self::Malformed(err) => Some(err.to_string()),
            Self::EngineFailure(err) => Some(err.to_string()),
        }
    }
}

/// Field-less projection of [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Allowed,
    Denied,
    Undefined,
    Malformed,
    EngineFailure,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allowed => "allowed",
            Self::Denied => "denied",
            Self::Undefined => "undefined",
            Self::Malformed => "malformed",
            Self::EngineFailure => "engine_failure",
        })
    }
}

/// Full context of a refused request, for access-denied errors and audit logs.
///
/// Parts missing from a malformed request are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DenialDescription {
    pub subject_type: Option<String>,
    pub subject_id: Option<String>,
    pub subject_attributes: Option<Attributes>,
    pub operation: Option<String>,
    pub resource_type: Option<String>,
    pub resource_attributes: Option<Attributes>,
}

impl DenialDescription {
    #[must_use]
    pub fn from_request(request: &Request) -> Self {
        let subject = request.subject.as_ref();
        let resource = request.resource.as_ref();
        Self {
            subject_type: subject.map(|s| s.kind.as_str().to_owned()),
            subject_id: subject.map(|s| s.id.clone()),
            subject_attributes: subject.and_then(|s| s.attributes.clone()),
            operation: request.operation.as_ref().map(|o| o.as_str().to_owned()),
            resource_type: resource.map(|r| r.kind.as_str().to_owned()),
            resource_attributes: resource.and_then(|r| r.attributes.clone()),
        }
    }
}

const ABSENT: &str = "<absent>";

fn write_attributes(f: &mut fmt::Formatter<'_>, attrs: Option<&Attributes>) -> fmt::Result {
    match attrs {
        Some(attrs) => {
            let rendered = serde_json::to_string(attrs).map_err(|_| fmt::Error)?;
            f.write_str(&rendered)
        }
        None => f.write_str(ABSENT),
    }
}

impl fmt::Display for DenialDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subject_type={}, subject_id={}, subject_attributes=",
            self.subject_type.as_deref().unwrap_or(ABSENT),
            self.subject_id.as_deref().unwrap_or(ABSENT),
        )?;
        write_attributes(f, self.subject_attributes.as_ref())?;
        write!(
            f,
            ", operation={}, resource_type={}, resource_attributes=",
            self.operation.as_deref().unwrap_or(ABSENT),
            self.resource_type.as_deref().unwrap_or(ABSENT),
        )?;
        write_attributes(f, self.resource_attributes.as_ref())
    }
}

/// Result of `Evaluate`: the decision plus, for every outcome other than
/// [`Decision::Allowed`], the denial description.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub decision: Decision,
    pub denial: Option<DenialDescription>,
}

impl Evaluation {
    #[must_use]
    pub fn new(decision: Decision, request: &Request) -> Self {
        let denial = if decision.is_allowed() {
            None
        } else {
            Some(DenialDescription::from_request(request))
        };
        Self { decision, denial }
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.decision.is_allowed()
    }

    /// Serializable summary for logs and command-line output.
    #[must_use]
    pub fn report(&self) -> EvaluationReport {
        EvaluationReport {
            outcome: self.decision.outcome(),
            allowed: self.decision.is_allowed(),
            reason: self.decision.reason(),
            denial: self.denial.clone(),
        }
    }
}

/// Serializable view of an [`Evaluation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub outcome: Outcome,
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialDescription>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::models::{Operation, Resource, ResourceKind, Subject, SubjectKind};

    fn request() -> Request {
        Request::new(
            Subject::new(SubjectKind::Person, "u1").attribute("role", "member"),
            Operation::Delete,
            Resource::new(ResourceKind::Post).attribute("owner", "u2"),
        )
    }

    #[test]
    fn allowed_carries_no_denial() {
        let eval = Evaluation::new(Decision::Allowed, &request());
        assert!(eval.is_allowed());
        assert!(eval.denial.is_none());
    }

    #[test]
    fn every_other_outcome_carries_denial() {
        for decision in [
            Decision::Denied,
            Decision::Undefined(UndefinedReason::NoResults),
            Decision::Malformed(MalformedRequest::EmptySubjectId),
            Decision::EngineFailure(EvaluatorError::Internal("boom".to_owned())),
        ] {
            let eval = Evaluation::new(decision, &request());
            assert!(!eval.is_allowed());
            let denial = eval.denial.expect("denial description");
            assert_eq!(denial.subject_id.as_deref(), Some("u1"));
            assert_eq!(denial.operation.as_deref(), Some("delete"));
        }
    }

    #[test]
    fn denial_description_renders_full_context() {
        let denial = DenialDescription::from_request(&request());
        assert_eq!(
            denial.to_string(),
            r#"subject_type=person, subject_id=u1, subject_attributes={"role":"member"}, operation=delete, resource_type=post, resource_attributes={"owner":"u2"}"#
        );
    }

    #[test]
    fn denial_description_marks_missing_parts() {
        let request = Request {
            subject: None,
            operation: Some(Operation::Read),
            resource: Some(Resource::new(ResourceKind::Post)),
        };
        let denial = DenialDescription::from_request(&request);
        assert!(denial.subject_id.is_none());
        assert!(denial.to_string().starts_with("subject_type=<absent>, subject_id=<absent>"));
    }

    #[test]
    fn undefined_and_denied_are_denials_but_failures_are_not() {
        assert!(Decision::Denied.is_denial());
        assert!(Decision::Undefined(UndefinedReason::NoResults).is_denial());
        assert!(!Decision::Malformed(MalformedRequest::MissingSubject).is_denial());
        assert!(!Decision::EngineFailure(EvaluatorError::Evaluation("x".to_owned())).is_denial());
    }

    #[test]
    fn report_serializes_outcome_in_snake_case() {
        let eval = Evaluation::new(
            Decision::EngineFailure(EvaluatorError::Internal("boom".to_owned())),
            &request(),
        );
        let json = serde_json::to_value(eval.report()).unwrap();
        assert_eq!(json["outcome"], "engine_failure");
        assert_eq!(json["allowed"], false);
        assert_eq!(json["reason"], "internal error: boom");
    }
}
