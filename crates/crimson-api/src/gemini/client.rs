// Generative Language API HTTP client
//
// Wraps `reqwest::Client` with model-scoped URL construction, API key
// injection, and error envelope decoding. Callers work with typed
// requests and get back either the decoded response or a crate `Error`.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use super::models::{ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse, Schema};
use crate::error::Error;
use crate::transport::TransportConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";
const API_VERSION: &str = "v1beta";

/// Raw HTTP client for `models/{model}:generateContent`.
///
/// One client is bound to one model. The API key travels as a default
/// header marked sensitive, so it never shows up in debug output.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: Url,
    model: String,
}

impl GeminiClient {
    /// Create a new client from a `TransportConfig` and API key.
    ///
    /// `base_url` is the API root, e.g. `https://generativelanguage.googleapis.com`.
    pub fn new(
        base_url: Url,
        model: impl Into<String>,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut key = HeaderValue::from_str(api_key.expose_secret()).map_err(|_| {
            Error::Authentication {
                message: "API key contains characters not allowed in a header".into(),
            }
        })?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self::with_client(http, base_url, model))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for authentication headers.
    pub fn with_client(http: reqwest::Client, base_url: Url, model: impl Into<String>) -> Self {
        let model = model.into();
        let model = model.strip_prefix("models/").map_or(model.clone(), str::to_owned);
        Self {
            http,
            base_url,
            model,
        }
    }

    /// The model every request is sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The API root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/v1beta/models/{model}:generateContent`
    pub(crate) fn generate_url(&self) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}/{API_VERSION}/models/{}:generateContent", self.model);
        Ok(Url::parse(&full)?)
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Send a raw `generateContent` request.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, Error> {
        let url = self.generate_url()?;
        debug!(model = %self.model, "POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    /// Single-turn prompt returning the model's text.
    pub async fn generate_text(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<String, Error> {
        let mut request = GenerateContentRequest::prompt(prompt);
        if let Some(instruction) = system_instruction {
            request = request.with_system_instruction(instruction);
        }

        let response = self.generate_content(&request).await?;
        response.text().ok_or_else(|| Error::EmptyResponse {
            reason: response.stop_reason(),
        })
    }

    /// Single-turn prompt constrained to `schema`, decoded into `T`.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: Schema,
    ) -> Result<T, Error> {
        let request = GenerateContentRequest::prompt(prompt).with_json_schema(schema);
        let response = self.generate_content(&request).await?;
        let text = response.text().ok_or_else(|| Error::EmptyResponse {
            reason: response.stop_reason(),
        })?;

        serde_json::from_str(&text).map_err(|e| Error::Deserialization {
            message: format!("model output is not the requested JSON: {e}"),
            body: text,
        })
    }

    /// Map HTTP status and the `{"error": {...}}` envelope onto `Error`,
    /// or decode the success body.
    async fn parse_response(resp: reqwest::Response) -> Result<GenerateContentResponse, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            return Err(Error::RateLimited { retry_after_secs });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(status = status.as_u16(), bytes = body.len(), "response received");

        if !status.is_success() {
            let envelope = serde_json::from_str::<ApiErrorEnvelope>(&body).ok();

            if matches!(
                status,
                reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN
            ) {
                return Err(Error::Authentication {
                    message: envelope.map_or_else(
                        || format!("HTTP {status}"),
                        |e| e.error.message,
                    ),
                });
            }

            return Err(match envelope {
                Some(e) => Error::Api {
                    message: e.error.message,
                    code: e.error.status,
                    status: status.as_u16(),
                },
                None => Error::Api {
                    message: format!("HTTP {status}: {}", preview(&body)),
                    code: None,
                    status: status.as_u16(),
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}
