#![allow(clippy::unwrap_used)]
// Integration tests for `GeminiClient` using wiremock.

use serde::Deserialize;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crimson_api::{Error, GeminiClient, Schema, SchemaType, TransportConfig};

const MODEL: &str = "gemini-3-flash-preview";
const GENERATE_PATH: &str = "/v1beta/models/gemini-3-flash-preview:generateContent";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, GeminiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = GeminiClient::with_client(reqwest::Client::new(), base_url, MODEL);
    (server, client)
}

fn text_response(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "modelVersion": MODEL
    })
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_generate_text_sends_prompt_and_system_instruction() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Is Zurich safe?" }] }],
            "systemInstruction": { "parts": [{ "text": "Be brief." }] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Yes.")))
        .expect(1)
        .mount(&server)
        .await;

    let text = client
        .generate_text("Is Zurich safe?", Some("Be brief."))
        .await
        .unwrap();

    assert_eq!(text, "Yes.");
}

#[tokio::test]
async fn test_api_key_is_sent_as_header() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let key: secrecy::SecretString = "test-key".to_string().into();
    let client = GeminiClient::new(base_url, MODEL, &key, &TransportConfig::default()).unwrap();

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("ok")))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.generate_text("ping", None).await.unwrap(), "ok");
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pick {
    recommended_server_id: String,
    reasoning: String,
}

#[tokio::test]
async fn test_generate_json_decodes_structured_output() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(
            r#"{"recommendedServerId":"4","reasoning":"Low load, low latency."}"#,
        )))
        .mount(&server)
        .await;

    let schema = Schema::object([
        ("recommendedServerId", Schema::of(SchemaType::String)),
        ("reasoning", Schema::of(SchemaType::String)),
    ]);
    let pick: Pick = client.generate_json("pick one", schema).await.unwrap();

    assert_eq!(pick.recommended_server_id, "4");
    assert_eq!(pick.reasoning, "Low load, low latency.");
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn test_structured_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "Invalid JSON payload received.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&server)
        .await;

    let result = client.generate_text("hi", None).await;

    match result {
        Err(Error::Api {
            message,
            code,
            status,
        }) => {
            assert_eq!(status, 400);
            assert_eq!(code.as_deref(), Some("INVALID_ARGUMENT"));
            assert_eq!(message, "Invalid JSON payload received.");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_forbidden_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "API key not valid.", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let result = client.generate_text("hi", None).await;

    assert!(
        matches!(result, Err(Error::Authentication { ref message }) if message == "API key not valid."),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let result = client.generate_text("hi", None).await;

    assert!(
        matches!(result, Err(Error::RateLimited { retry_after_secs: 7 })),
        "expected RateLimited, got: {result:?}"
    );
}

#[tokio::test]
async fn test_unstructured_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client.generate_text("hi", None).await.unwrap_err();

    assert!(err.is_transient());
    assert!(matches!(err, Error::Api { status: 502, code: None, .. }));
}

#[tokio::test]
async fn test_blocked_prompt_is_empty_response() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "promptFeedback": { "blockReason": "SAFETY" } })),
        )
        .mount(&server)
        .await;

    let result = client.generate_text("hi", None).await;

    assert!(
        matches!(result, Err(Error::EmptyResponse { reason: Some(ref r) }) if r == "SAFETY"),
        "expected EmptyResponse, got: {result:?}"
    );
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let result = client.generate_text("hi", None).await;

    assert!(
        matches!(result, Err(Error::Deserialization { ref body, .. }) if body.contains("proxy")),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_non_json_model_output_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Frankfurt, obviously.")))
        .mount(&server)
        .await;

    let schema = Schema::object([("recommendedServerId", Schema::of(SchemaType::String))]);
    let result: Result<serde_json::Value, Error> = client.generate_json("pick", schema).await;

    assert!(matches!(result, Err(Error::Deserialization { .. })));
}
