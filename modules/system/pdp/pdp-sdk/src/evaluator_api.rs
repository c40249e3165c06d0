//! Contract for rule-evaluation backends.
//!
//! The decision engine depends only on these traits, never on a specific rule
//! language or bundle format. A backend is prepared once (bundle loaded, query
//! checked) and the resulting [`PreparedQuery`] is shared across calls.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::EvaluatorError;

/// One set of variable bindings produced by a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub bindings: Map<String, Value>,
}

impl ResultSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding.
    #[must_use]
    pub fn with_binding(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }
}

/// Loads a policy bundle and prepares a fixed query against it.
#[async_trait]
pub trait RuleEngine: Send + Sync {
    /// Load the bundle at `bundle` and prepare `query` for repeated evaluation.
    ///
    /// # Errors
    ///
    /// - [`EvaluatorError::BundleLoad`] if the bundle cannot be read or parsed
    /// - [`EvaluatorError::QueryCompile`] if the query is invalid
    async fn prepare(
        &self,
        bundle: &Path,
        query: &str,
    ) -> Result<Arc<dyn PreparedQuery>, EvaluatorError>;
}

/// A query ready for evaluation. Must be safe to call concurrently.
#[async_trait]
pub trait PreparedQuery: Send + Sync {
    /// Evaluate the prepared query with `input` as the input document.
    ///
    /// Returns result sets in evaluator order; an empty vector means the
    /// query was undefined for this input.
    ///
    /// # Errors
    ///
    /// Any evaluator fault. Never used to express a policy refusal.
    async fn evaluate(&self, input: Value) -> Result<Vec<ResultSet>, EvaluatorError>;
}

/// Serializes calls into a prepared query that is not reentrant.
pub struct SerializedQuery<Q> {
    inner: Mutex<Q>,
}

impl<Q> SerializedQuery<Q> {
    #[must_use]
    pub fn new(inner: Q) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }
}

#[async_trait]
impl<Q: PreparedQuery> PreparedQuery for SerializedQuery<Q> {
    async fn evaluate(&self, input: Value) -> Result<Vec<ResultSet>, EvaluatorError> {
        let guard = self.inner.lock().await;
        guard.evaluate(input).await
    }
}

impl<Q> std::fmt::Debug for SerializedQuery<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializedQuery").finish_non_exhaustive()
    }
}
