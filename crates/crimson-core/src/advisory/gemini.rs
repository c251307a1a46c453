// Generative Language advisor.
//
// Turns endpoint metadata into prompts, sends them through
// `crimson_api::GeminiClient`, and folds every failure into the
// fallback advisory or recommendation.

use std::fmt::Write as _;
use std::sync::Arc;

use crimson_api::transport::{TlsMode, TransportConfig};
use crimson_api::{GeminiClient, Schema, SchemaType};
use futures_util::future::BoxFuture;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Advisor, AdvisoryRequest, Recommendation};
use crate::config::{AdvisorConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{AdviceOrigin, Advisory, Endpoint, EndpointId};

const SYSTEM_INSTRUCTION: &str = "You are a world-class cybersecurity expert specialized in VPN \
technology and digital privacy. Keep advice under 60 words.";

/// Coarse class of a failed request, logged with every fallback.
fn failure_kind(err: &crimson_api::Error) -> &'static str {
    if err.is_auth_error() {
        "credentials"
    } else if err.is_transient() {
        "transient"
    } else {
        "permanent"
    }
}

pub struct GeminiAdvisor {
    client: GeminiClient,
}

impl GeminiAdvisor {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    /// Build from an `AdvisorConfig::Gemini`.
    pub fn from_config(config: &AdvisorConfig) -> Result<Self, CoreError> {
        let AdvisorConfig::Gemini {
            base_url,
            model,
            api_key,
            timeout,
            tls,
        } = config
        else {
            return Err(CoreError::Config {
                message: "advisor is configured offline".into(),
            });
        };

        let transport = TransportConfig {
            tls: match tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            },
            timeout: *timeout,
        };
        let client = GeminiClient::new(base_url.clone(), model.as_str(), api_key, &transport)?;
        debug!(model = client.model(), "gemini advisor ready");
        Ok(Self::new(client))
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }
}

impl Advisor for GeminiAdvisor {
    fn advise(&self, request: AdvisoryRequest) -> BoxFuture<'_, Advisory> {
        Box::pin(async move {
            let prompt = advisory_prompt(&request);
            match self
                .client
                .generate_text(&prompt, Some(SYSTEM_INSTRUCTION))
                .await
            {
                Ok(text) => Advisory::generated(text),
                Err(e) => {
                    warn!(
                        error = %e,
                        kind = failure_kind(&e),
                        code = e.api_error_code().unwrap_or("-"),
                        city = %request.city,
                        "advisory request failed, using fallback"
                    );
                    Advisory::fallback()
                }
            }
        })
    }

    fn recommend<'a>(&'a self, endpoints: &'a [Arc<Endpoint>]) -> BoxFuture<'a, Recommendation> {
        Box::pin(async move {
            if endpoints.is_empty() {
                return Recommendation::fallback(endpoints);
            }

            let prompt = recommendation_prompt(endpoints);
            let pick = match self
                .client
                .generate_json::<RecommendationPayload>(&prompt, recommendation_schema())
                .await
            {
                Ok(pick) => pick,
                Err(e) => {
                    warn!(
                        error = %e,
                        kind = failure_kind(&e),
                        code = e.api_error_code().unwrap_or("-"),
                        "recommendation request failed, using fallback"
                    );
                    return Recommendation::fallback(endpoints);
                }
            };

            let endpoint_id = EndpointId::from(pick.recommended_server_id);
            if !endpoints.iter().any(|e| e.id == endpoint_id) {
                warn!(id = %endpoint_id, "model recommended an endpoint outside the catalog");
                return Recommendation::fallback(endpoints);
            }
            if pick.reasoning.trim().is_empty() {
                return Recommendation::fallback(endpoints);
            }

            Recommendation {
                endpoint_id,
                reasoning: pick.reasoning.trim().to_owned(),
                origin: AdviceOrigin::Generated,
            }
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationPayload {
    recommended_server_id: String,
    #[serde(default)]
    reasoning: String,
}

fn advisory_prompt(request: &AdvisoryRequest) -> String {
    format!(
        "Analyze the security profile of connecting to a VPN server in {}, {}. \
         Current server load is {}% and latency is {}ms. \
         Provide a brief, professional privacy recommendation.",
        request.city, request.country, request.load, request.latency_ms
    )
}

fn recommendation_prompt(endpoints: &[Arc<Endpoint>]) -> String {
    let mut servers = String::new();
    for (i, e) in endpoints.iter().enumerate() {
        if i > 0 {
            servers.push_str(", ");
        }
        let _ = write!(
            servers,
            "{} ({}) [id {}]: load {}%, latency {}ms",
            e.city, e.country, e.id, e.load, e.latency_ms
        );
    }
    format!(
        "Based on these servers: {servers}, pick the best one for a user who prioritizes \
         both speed and security. Explain why briefly."
    )
}

fn recommendation_schema() -> Schema {
    Schema::object([
        ("recommendedServerId", Schema::of(SchemaType::String)),
        ("reasoning", Schema::of(SchemaType::String)),
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn failures_are_classified_for_logging() {
        let auth = crimson_api::Error::Authentication {
            message: "API key not valid".into(),
        };
        let busy = crimson_api::Error::Api {
            message: "overloaded".into(),
            code: Some("UNAVAILABLE".into()),
            status: 503,
        };
        let bad = crimson_api::Error::Api {
            message: "bad field".into(),
            code: Some("INVALID_ARGUMENT".into()),
            status: 400,
        };
        let quota = crimson_api::Error::RateLimited { retry_after_secs: 7 };

        assert_eq!(failure_kind(&auth), "credentials");
        assert_eq!(failure_kind(&busy), "transient");
        assert_eq!(failure_kind(&quota), "transient");
        assert_eq!(failure_kind(&bad), "permanent");
        assert_eq!(
            failure_kind(&crimson_api::Error::EmptyResponse { reason: None }),
            "permanent"
        );
    }

    #[test]
    fn advisory_prompt_wording() {
        let request = AdvisoryRequest {
            city: "Zurich".into(),
            country: "Switzerland".into(),
            load: 22,
            latency_ms: 45,
        };
        assert_eq!(
            advisory_prompt(&request),
            "Analyze the security profile of connecting to a VPN server in Zurich, Switzerland. \
             Current server load is 22% and latency is 45ms. \
             Provide a brief, professional privacy recommendation."
        );
    }

    #[test]
    fn recommendation_prompt_lists_every_endpoint_with_id() {
        let endpoints = Catalog::builtin().unwrap().endpoints();
        let prompt = recommendation_prompt(&endpoints[..2]);
        assert!(prompt.contains(
            "New York (United States) [id 1]: load 45%, latency 12ms, \
             Zurich (Switzerland) [id 2]: load 22%, latency 45ms, pick the best one"
        ));
    }

    #[test]
    fn schema_requires_both_fields() {
        let schema = recommendation_schema();
        assert_eq!(schema.required, ["reasoning", "recommendedServerId"]);
    }
}
