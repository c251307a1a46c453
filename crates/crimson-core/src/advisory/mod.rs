// ── Advisory boundary ──
//
// The controller asks an `Advisor` for text about one endpoint and gets
// back an `Advisory`, never an error. Implementations absorb every
// failure and substitute the fallback text themselves.

mod gemini;
mod tracker;

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::AdvisorConfig;
use crate::error::CoreError;
use crate::model::{AdviceOrigin, Advisory, Endpoint, EndpointId};

pub use gemini::GeminiAdvisor;
pub use tracker::AdvisoryTracker;

/// Reasoning attached to a fallback recommendation.
pub const FALLBACK_REASONING: &str = "Standard optimization based on current network metrics.";

/// What the advisor is told about an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    pub city: String,
    pub country: String,
    pub load: u8,
    pub latency_ms: u32,
}

impl From<&Endpoint> for AdvisoryRequest {
    fn from(endpoint: &Endpoint) -> Self {
        Self {
            city: endpoint.city.clone(),
            country: endpoint.country.clone(),
            load: endpoint.load,
            latency_ms: endpoint.latency_ms,
        }
    }
}

/// Best endpoint for speed and security, as judged by the advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub endpoint_id: EndpointId,
    pub reasoning: String,
    pub origin: AdviceOrigin,
}

impl Recommendation {
    /// First endpoint with the stock reasoning.
    pub fn fallback(endpoints: &[Arc<Endpoint>]) -> Self {
        let endpoint_id = endpoints
            .first()
            .map_or_else(|| EndpointId::from("1"), |e| e.id.clone());
        Self {
            endpoint_id,
            reasoning: FALLBACK_REASONING.to_owned(),
            origin: AdviceOrigin::Fallback,
        }
    }
}

/// Capability that produces advisory text. Must never fail to the caller.
pub trait Advisor: Send + Sync {
    fn advise(&self, request: AdvisoryRequest) -> BoxFuture<'_, Advisory>;

    /// Pick one of `endpoints`. The returned id is always a member.
    fn recommend<'a>(&'a self, endpoints: &'a [Arc<Endpoint>]) -> BoxFuture<'a, Recommendation>;
}

/// Used when no model access is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAdvisor;

impl Advisor for OfflineAdvisor {
    fn advise(&self, _request: AdvisoryRequest) -> BoxFuture<'_, Advisory> {
        Box::pin(async { Advisory::fallback() })
    }

    fn recommend<'a>(&'a self, endpoints: &'a [Arc<Endpoint>]) -> BoxFuture<'a, Recommendation> {
        Box::pin(async move { Recommendation::fallback(endpoints) })
    }
}

/// Build the advisor described by `config`.
pub fn build_advisor(config: &AdvisorConfig) -> Result<Arc<dyn Advisor>, CoreError> {
    match config {
        AdvisorConfig::Offline => Ok(Arc::new(OfflineAdvisor)),
        AdvisorConfig::Gemini { .. } => Ok(Arc::new(GeminiAdvisor::from_config(config)?)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::model::FALLBACK_ADVICE;

    #[tokio::test]
    async fn offline_advisor_always_falls_back() {
        let catalog = Catalog::builtin().unwrap();
        let advisory = OfflineAdvisor
            .advise(AdvisoryRequest::from(catalog.first().as_ref()))
            .await;
        assert_eq!(advisory.text, FALLBACK_ADVICE);
        assert_eq!(advisory.origin, AdviceOrigin::Fallback);

        let endpoints = catalog.endpoints();
        let pick = OfflineAdvisor.recommend(&endpoints).await;
        assert_eq!(pick.endpoint_id.as_str(), "1");
        assert_eq!(pick.reasoning, FALLBACK_REASONING);
    }

    #[test]
    fn request_from_endpoint() {
        let catalog = Catalog::builtin().unwrap();
        let tokyo = catalog.get(&"3".into()).unwrap();
        assert_eq!(
            AdvisoryRequest::from(tokyo.as_ref()),
            AdvisoryRequest {
                city: "Tokyo".into(),
                country: "Japan".into(),
                load: 88,
                latency_ms: 120,
            }
        );
    }

    #[test]
    fn offline_config_builds() {
        assert!(build_advisor(&AdvisorConfig::Offline).is_ok());
    }
}
