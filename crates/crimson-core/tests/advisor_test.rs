#![allow(clippy::unwrap_used)]
// GeminiAdvisor against a mock Generative Language endpoint.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crimson_core::{
    AdviceOrigin, Advisor, AdvisorConfig, AdvisoryRequest, Catalog, Controller, ControllerConfig,
    FALLBACK_ADVICE, FALLBACK_REASONING, GeminiAdvisor, TlsVerification, build_advisor,
};

const GENERATE_PATH: &str = "/v1beta/models/gemini-3-flash-preview:generateContent";

fn config(server: &MockServer) -> AdvisorConfig {
    AdvisorConfig::Gemini {
        base_url: Url::parse(&server.uri()).unwrap(),
        model: "gemini-3-flash-preview".into(),
        api_key: SecretString::from("k-123".to_string()),
        timeout: Duration::from_secs(5),
        tls: TlsVerification::SystemDefaults,
    }
}

fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    }))
}

fn zurich() -> AdvisoryRequest {
    let catalog = Catalog::builtin().unwrap();
    AdvisoryRequest::from(catalog.get(&"2".into()).unwrap().as_ref())
}

// ── Advice ──────────────────────────────────────────────────────────

#[tokio::test]
async fn advice_uses_prompt_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "k-123"))
        .and(body_string_contains("VPN server in Zurich, Switzerland"))
        .and(body_string_contains("Keep advice under 60 words."))
        .respond_with(reply("Swiss jurisdiction is privacy friendly."))
        .expect(1)
        .mount(&server)
        .await;

    let advisor = GeminiAdvisor::from_config(&config(&server)).unwrap();
    let advisory = advisor.advise(zurich()).await;

    assert_eq!(advisory.text, "Swiss jurisdiction is privacy friendly.");
    assert_eq!(advisory.origin, AdviceOrigin::Generated);
}

#[tokio::test]
async fn server_error_becomes_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let advisor = GeminiAdvisor::from_config(&config(&server)).unwrap();
    let advisory = advisor.advise(zurich()).await;

    assert_eq!(advisory.text, FALLBACK_ADVICE);
    assert_eq!(advisory.origin, AdviceOrigin::Fallback);
}

#[tokio::test]
async fn unreachable_service_becomes_fallback() {
    let server = MockServer::start().await;
    let cfg = config(&server);
    drop(server);

    let advisor = GeminiAdvisor::from_config(&cfg).unwrap();
    let advisory = advisor.advise(zurich()).await;

    assert_eq!(advisory.origin, AdviceOrigin::Fallback);
}

#[tokio::test]
async fn blocked_response_becomes_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "promptFeedback": { "blockReason": "SAFETY" } })),
        )
        .mount(&server)
        .await;

    let advisor = GeminiAdvisor::from_config(&config(&server)).unwrap();
    assert_eq!(advisor.advise(zurich()).await.text, FALLBACK_ADVICE);
}

// ── Recommendation ──────────────────────────────────────────────────

#[tokio::test]
async fn recommendation_in_catalog_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("recommendedServerId"))
        .respond_with(reply(
            r#"{"recommendedServerId":"5","reasoning":"Lowest load and latency."}"#,
        ))
        .mount(&server)
        .await;

    let advisor = GeminiAdvisor::from_config(&config(&server)).unwrap();
    let endpoints = Catalog::builtin().unwrap().endpoints();
    let pick = advisor.recommend(&endpoints).await;

    assert_eq!(pick.endpoint_id.as_str(), "5");
    assert_eq!(pick.reasoning, "Lowest load and latency.");
    assert_eq!(pick.origin, AdviceOrigin::Generated);
}

#[tokio::test]
async fn recommendation_outside_catalog_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(reply(
            r#"{"recommendedServerId":"42","reasoning":"Trust me."}"#,
        ))
        .mount(&server)
        .await;

    let advisor = GeminiAdvisor::from_config(&config(&server)).unwrap();
    let endpoints = Catalog::builtin().unwrap().endpoints();
    let pick = advisor.recommend(&endpoints).await;

    assert_eq!(pick.endpoint_id.as_str(), "1");
    assert_eq!(pick.reasoning, FALLBACK_REASONING);
    assert_eq!(pick.origin, AdviceOrigin::Fallback);
}

#[tokio::test]
async fn malformed_recommendation_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(reply("Frankfurt is best."))
        .mount(&server)
        .await;

    let advisor = GeminiAdvisor::from_config(&config(&server)).unwrap();
    let endpoints = Catalog::builtin().unwrap().endpoints();
    assert_eq!(
        advisor.recommend(&endpoints).await.origin,
        AdviceOrigin::Fallback
    );
}

// ── Through the controller ──────────────────────────────────────────

#[tokio::test]
async fn controller_shows_fallback_when_service_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let advisor = build_advisor(&config(&server)).unwrap();
    let ctrl = Controller::synthetic(ControllerConfig::default(), Catalog::builtin().unwrap(), advisor)
        .unwrap();

    ctrl.select("7").await.unwrap();
    let snap = tokio::time::timeout(Duration::from_secs(5), ctrl.wait_for_advice(&"7".into()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(snap.advice_text(), FALLBACK_ADVICE);
    ctrl.shutdown().await;
}

#[tokio::test]
async fn controller_shows_generated_advice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(reply("Tokyo is busy; expect higher latency."))
        .mount(&server)
        .await;

    let advisor: Arc<dyn Advisor> = build_advisor(&config(&server)).unwrap();
    let ctrl = Controller::synthetic(ControllerConfig::default(), Catalog::builtin().unwrap(), advisor)
        .unwrap();

    ctrl.select("3").await.unwrap();
    let snap = tokio::time::timeout(Duration::from_secs(5), ctrl.wait_for_advice(&"3".into()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(snap.advice_text(), "Tokyo is busy; expect higher latency.");
}
