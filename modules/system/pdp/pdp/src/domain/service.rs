//! Domain service for the policy decision point.

use std::sync::Arc;

use arc_swap::ArcSwap;
use pdp_sdk::{Evaluation, Request, RuleEngine};
use tracing::{error, info};

use super::engine::DecisionEngine;
use super::error::DomainError;
use crate::config::PdpConfig;

/// Policy decision service.
///
/// Holds the prepared [`DecisionEngine`] behind an atomically swappable
/// pointer. The bundle is prepared once at startup and again only on an
/// explicit [`Service::reload`].
pub struct Service {
    rules: Arc<dyn RuleEngine>,
    engine: ArcSwap<DecisionEngine>,
}

impl Service {
    /// Prepare the rule evaluator and build the service.
    ///
    /// # Errors
    ///
    /// Configuration or preparation failures.
    pub async fn start(rules: Arc<dyn RuleEngine>, config: &PdpConfig) -> Result<Self, DomainError> {
        let engine = DecisionEngine::prepare(rules.as_ref(), config).await?;
        Ok(Self {
            rules,
            engine: ArcSwap::from_pointee(engine),
        })
    }

    /// Re-prepare the rule evaluator with `config` and swap it in.
    ///
    /// Evaluations already in flight finish on the previous engine. On error
    /// the previous engine stays active.
    ///
    /// # Errors
    ///
    /// Configuration or preparation failures.
    #[tracing::instrument(skip_all)]
    pub async fn reload(&self, config: &PdpConfig) -> Result<(), DomainError> {
        match DecisionEngine::prepare(self.rules.as_ref(), config).await {
            Ok(engine) => {
                self.engine.store(Arc::new(engine));
                info!(bundle = %config.bundle_path.display(), "Policy bundle reloaded");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Policy bundle reload failed, keeping previous engine");
                Err(e)
            }
        }
    }

    /// Evaluate an authorization request.
    #[tracing::instrument(skip_all)]
    pub async fn evaluate(&self, request: &Request) -> Evaluation {
        let engine = self.engine.load_full();
        engine.evaluate(request).await
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("engine", &*self.engine.load_full())
            .finish_non_exhaustive()
    }
}
