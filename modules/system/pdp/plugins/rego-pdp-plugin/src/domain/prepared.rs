//! Prepared Rego query.

use async_trait::async_trait;
use parking_lot::Mutex;
use pdp_sdk::{EvaluatorError, PreparedQuery, ResultSet};
use serde_json::Value;

/// A loaded interpreter plus the fixed query.
///
/// Each evaluation runs on a clone of the interpreter, so concurrent calls
/// never share mutable interpreter state. The lock is held only while
/// cloning.
pub struct PreparedRegoQuery {
    engine: Mutex<regorus::Engine>,
    query: String,
}

impl PreparedRegoQuery {
    pub(crate) fn new(engine: regorus::Engine, query: String) -> Self {
        Self {
            engine: Mutex::new(engine),
            query,
        }
    }

    fn run(
        mut engine: regorus::Engine,
        query: String,
        input: &Value,
    ) -> Result<Vec<ResultSet>, EvaluatorError> {
        let input = regorus::Value::from_json_str(&input.to_string())
            .map_err(|e| EvaluatorError::Internal(format!("invalid input document: {e}")))?;
        engine.set_input(input);

        let results = engine
            .eval_query(query, false)
            .map_err(|e| EvaluatorError::Evaluation(e.to_string()))?;
        let results = serde_json::to_value(&results)
            .map_err(|e| EvaluatorError::Internal(format!("unreadable query results: {e}")))?;

        Ok(result_sets(&results))
    }
}

/// Extract the bindings of every entry in `{"result": [{"bindings": {..}}, ..]}`.
fn result_sets(results: &Value) -> Vec<ResultSet> {
    results
        .get("result")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|entry| ResultSet {
                    bindings: entry
                        .get("bindings")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl PreparedQuery for PreparedRegoQuery {
    async fn evaluate(&self, input: Value) -> Result<Vec<ResultSet>, EvaluatorError> {
        let engine = self.engine.lock().clone();
        let query = self.query.clone();

        tokio::task::spawn_blocking(move || Self::run(engine, query, &input))
            .await
            .map_err(|e| EvaluatorError::Internal(format!("evaluation task failed: {e}")))?
    }
}

impl std::fmt::Debug for PreparedRegoQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedRegoQuery")
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}
