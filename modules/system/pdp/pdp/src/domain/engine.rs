//! Decision engine: one evaluation round-trip per request.

use std::sync::Arc;
use std::time::Duration;

use pdp_sdk::{
    Decision, Evaluation, EvaluatorError, PreparedQuery, Request, ResultSet, RuleEngine,
    UndefinedReason, ValidationOptions,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::error::DomainError;
use crate::config::PdpConfig;

/// Drives evaluations against a prepared query.
///
/// Immutable after construction; evaluations share nothing but the prepared
/// query handle, so concurrent calls are independent.
pub struct DecisionEngine {
    query: Arc<dyn PreparedQuery>,
    result_binding: String,
    eval_timeout: Duration,
    validation: ValidationOptions,
}

impl DecisionEngine {
    /// Load the bundle and prepare the configured query.
    ///
    /// # Errors
    ///
    /// - [`DomainError::InvalidConfig`] if the configuration is invalid
    /// - [`DomainError::Prepare`] if the rule engine cannot load or compile
    #[tracing::instrument(skip_all, fields(bundle = %config.bundle_path.display()))]
    pub async fn prepare(rules: &dyn RuleEngine, config: &PdpConfig) -> Result<Self, DomainError> {
        config.validate()?;
        info!(query = %config.query, "Preparing rule evaluator");

        let query = rules
            .prepare(&config.bundle_path, &config.query)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to prepare rule evaluator"))?;

        Ok(Self::with_prepared(query, config))
    }

    /// Build an engine around an already prepared query.
    #[must_use]
    pub fn with_prepared(query: Arc<dyn PreparedQuery>, config: &PdpConfig) -> Self {
        Self {
            query,
            result_binding: config.result_binding.clone(),
            eval_timeout: config.eval_timeout,
            validation: config.validation_options(),
        }
    }

    /// Evaluate a request and attach the denial description when not allowed.
    pub async fn evaluate(&self, request: &Request) -> Evaluation {
        let decision = self.decide(request).await;
        Evaluation::new(decision, request)
    }

    #[tracing::instrument(
        skip_all,
        fields(subject_id, operation, resource_type, outcome)
    )]
    async fn decide(&self, request: &Request) -> Decision {
        let validated = match request.validate_with(self.validation) {
            Ok(validated) => validated,
            Err(err) => {
                warn!(error = %err, "Rejecting malformed authorization request");
                return Decision::Malformed(err);
            }
        };

        let span = tracing::Span::current();
        span.record("subject_id", validated.subject().id.as_str());
        span.record("operation", validated.operation().as_str());
        span.record("resource_type", validated.resource().kind.as_str());

        let input = validated.to_input();
        let decision =
            match tokio::time::timeout(self.eval_timeout, self.query.evaluate(input)).await {
                Ok(Ok(results)) => classify(&results, &self.result_binding),
                Ok(Err(err)) => {
                    error!(error = %err, "Rule evaluator call failed");
                    Decision::EngineFailure(err)
                }
                Err(_) => {
                    error!(timeout = ?self.eval_timeout, "Rule evaluator call timed out");
                    Decision::EngineFailure(EvaluatorError::Timeout(self.eval_timeout))
                }
            };

        span.record("outcome", tracing::field::display(decision.outcome()));
        debug!("Authorization decision made");
        decision
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("result_binding", &self.result_binding)
            .field("eval_timeout", &self.eval_timeout)
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

/// Interpret raw evaluator output. Only the first result set is considered.
#[must_use]
pub fn classify(results: &[ResultSet], binding: &str) -> Decision {
    let Some(first) = results.first() else {
        error!("undefined result from authz policies");
        return Decision::Undefined(UndefinedReason::NoResults);
    };

    match first.binding(binding) {
        Some(Value::Bool(true)) => Decision::Allowed,
        Some(Value::Bool(false)) => Decision::Denied,
        other => {
            let found = json_type(other);
            error!(binding, found, "unexpected result type from authz policies");
            Decision::Undefined(UndefinedReason::UnexpectedResult {
                binding: binding.to_owned(),
                found: found.to_owned(),
            })
        }
    }
}

fn json_type(value: Option<&Value>) -> &'static str {
    match value {
        None => "missing",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    #[test]
    fn true_binding_allows_and_false_denies() {
        let allow = [ResultSet::new().with_binding("x", true)];
        let deny = [ResultSet::new().with_binding("x", false)];
        assert_eq!(classify(&allow, "x"), Decision::Allowed);
        assert_eq!(classify(&deny, "x"), Decision::Denied);
    }

    #[test]
    #[traced_test]
    fn zero_results_are_undefined() {
        assert_eq!(
            classify(&[], "x"),
            Decision::Undefined(UndefinedReason::NoResults)
        );
        assert!(logs_contain("undefined result from authz policies"));
        assert!(!logs_contain("unexpected result type"));
    }

    #[test]
    #[traced_test]
    fn non_boolean_binding_is_undefined_and_logged_distinctly() {
        let results = [ResultSet::new().with_binding("x", json!("yes"))];
        assert_eq!(
            classify(&results, "x"),
            Decision::Undefined(UndefinedReason::UnexpectedResult {
                binding: "x".to_owned(),
                found: "string".to_owned(),
            })
        );
        assert!(logs_contain("unexpected result type from authz policies"));
        assert!(!logs_contain("undefined result from authz policies"));
    }

    #[test]
    fn missing_binding_is_undefined() {
        let results = [ResultSet::new().with_binding("y", true)];
        assert_eq!(
            classify(&results, "x"),
            Decision::Undefined(UndefinedReason::UnexpectedResult {
                binding: "x".to_owned(),
                found: "missing".to_owned(),
            })
        );
    }

    #[test]
    fn only_first_result_set_counts() {
        let results = [
            ResultSet::new().with_binding("x", false),
            ResultSet::new().with_binding("x", true),
        ];
        assert_eq!(classify(&results, "x"), Decision::Denied);
    }
}
