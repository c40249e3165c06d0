//! Rego rule engine: loads a bundle and prepares the fixed query.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use pdp_sdk::{EvaluatorError, PreparedQuery, RuleEngine};
use tracing::info;

use super::bundle;
use super::prepared::PreparedRegoQuery;
use crate::config::RegoPluginConfig;

/// [`RuleEngine`] backed by the `regorus` Rego interpreter.
#[derive(Debug, Clone, Default)]
pub struct RegoEngine {
    config: RegoPluginConfig,
}

impl RegoEngine {
    #[must_use]
    pub fn new(config: RegoPluginConfig) -> Self {
        Self { config }
    }

    /// Build an interpreter loaded with every module and data document of
    /// the bundle.
    fn compile(&self, location: &Path) -> Result<regorus::Engine, EvaluatorError> {
        let bundle = bundle::load(location, &self.config)?;
        let load_error = |reason: String| EvaluatorError::BundleLoad {
            location: location.display().to_string(),
            reason,
        };

        let mut engine = regorus::Engine::new();
        for (path, source) in bundle.policies {
            engine
                .add_policy(path.clone(), source)
                .map_err(|e| load_error(format!("{path}: {e}")))?;
        }
        for doc in bundle.data {
            let path = doc.path;
            let document: serde_json::Value = serde_json::from_str(&doc.json)
                .map_err(|e| load_error(format!("{path}: {e}")))?;
            let data = regorus::Value::from_json_str(&mounted(document, &doc.mount).to_string())
                .map_err(|e| load_error(format!("{path}: {e}")))?;
            engine
                .add_data(data)
                .map_err(|e| load_error(format!("{path}: {e}")))?;
        }
        Ok(engine)
    }

    fn check_query(engine: &regorus::Engine, query: &str) -> Result<(), EvaluatorError> {
        let compile_error = |reason: String| EvaluatorError::QueryCompile {
            query: query.to_owned(),
            reason,
        };

        let mut probe = engine.clone();
        let empty = regorus::Value::from_json_str("{}").map_err(|e| compile_error(e.to_string()))?;
        probe.set_input(empty);
        probe
            .eval_query(query.to_owned(), false)
            .map_err(|e| compile_error(e.to_string()))?;
        Ok(())
    }
}

/// Nest `document` under `mount`, so `["a", "b"]` yields `{"a": {"b": document}}`.
fn mounted(document: serde_json::Value, mount: &[String]) -> serde_json::Value {
    mount.iter().rev().fold(document, |inner, key| {
        let mut outer = serde_json::Map::new();
        outer.insert(key.clone(), inner);
        serde_json::Value::Object(outer)
    })
}

#[async_trait]
impl RuleEngine for RegoEngine {
    #[tracing::instrument(skip_all, fields(bundle = %bundle.display()))]
    async fn prepare(
        &self,
        bundle: &Path,
        query: &str,
    ) -> Result<Arc<dyn PreparedQuery>, EvaluatorError> {
        let this = self.clone();
        let location = bundle.to_path_buf();
        let query = query.to_owned();

        // Bundle reads and parsing are blocking work.
        let prepared = tokio::task::spawn_blocking(move || {
            let engine = this.compile(&location)?;
            if this.config.check_query {
                Self::check_query(&engine, &query)?;
            }
            Ok::<_, EvaluatorError>(PreparedRegoQuery::new(engine, query))
        })
        .await
        .map_err(|e| EvaluatorError::Internal(format!("bundle preparation task failed: {e}")))??;

        info!("Rego bundle prepared");
        Ok(Arc::new(prepared))
    }
}
