//! Policy decision point module.

use std::sync::{Arc, OnceLock};

use pdp_sdk::{PolicyDecisionClient, RuleEngine};
use tracing::info;

use crate::config::PdpConfig;
use crate::domain::{PdpLocalClient, Service};

/// Policy decision point module.
///
/// This module:
/// 1. Prepares the rule evaluator from the configured bundle and query
/// 2. Exposes the [`PolicyDecisionClient`] used by enforcement layers
///
/// Initialization happens once; later bundle changes go through
/// [`Service::reload`].
pub struct PdpModule {
    service: OnceLock<Arc<Service>>,
}

impl PdpModule {
    pub const MODULE_NAME: &'static str = "pdp";

    #[must_use]
    pub fn new() -> Self {
        Self {
            service: OnceLock::new(),
        }
    }

    /// Prepare the evaluator and return the client for enforcement layers.
    ///
    /// # Errors
    ///
    /// - invalid configuration or evaluator preparation failure
    /// - the module was already initialized
    #[tracing::instrument(skip_all, fields(bundle = %cfg.bundle_path.display()))]
    pub async fn init(
        &self,
        rules: Arc<dyn RuleEngine>,
        cfg: &PdpConfig,
    ) -> anyhow::Result<Arc<dyn PolicyDecisionClient>> {
        info!("Initializing {} module", Self::MODULE_NAME);

        if self.service.get().is_some() {
            anyhow::bail!("{} module already initialized", Self::MODULE_NAME);
        }

        let svc = Arc::new(Service::start(rules, cfg).await?);
        self.service
            .set(svc.clone())
            .map_err(|_| anyhow::anyhow!("{} module already initialized", Self::MODULE_NAME))?;

        let api: Arc<dyn PolicyDecisionClient> = Arc::new(PdpLocalClient::new(svc));

        info!("{} module initialized successfully", Self::MODULE_NAME);
        Ok(api)
    }

    /// The running service, once initialized.
    #[must_use]
    pub fn service(&self) -> Option<Arc<Service>> {
        self.service.get().cloned()
    }
}

impl Default for PdpModule {
    fn default() -> Self {
        Self::new()
    }
}
