//! Local (in-process) client for the policy decision point.

use std::sync::Arc;

use async_trait::async_trait;
use pdp_sdk::{Evaluation, PolicyDecisionClient, Request};

use super::Service;

/// Local client wrapping the service.
pub struct PdpLocalClient {
    svc: Arc<Service>,
}

impl PdpLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

#[async_trait]
impl PolicyDecisionClient for PdpLocalClient {
    async fn evaluate(&self, request: &Request) -> Evaluation {
        self.svc.evaluate(request).await
    }
}
