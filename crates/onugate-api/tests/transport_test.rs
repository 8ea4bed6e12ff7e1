#![allow(clippy::unwrap_used)]
// Integration tests for `UpstreamTransport` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use onugate_api::{Error, Params, RetryPolicy, TransportConfig, UpstreamTransport};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, UpstreamTransport) {
    let server = MockServer::start().await;
    let token = SecretString::from("test-token".to_string());
    let transport = UpstreamTransport::from_token(
        &format!("{}/api", server.uri()),
        &token,
        &TransportConfig::default(),
    )
    .unwrap();
    (server, transport)
}

// ── GET ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_sends_token_and_query() {
    let (server, transport) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/onu/get_onu_optical_power"))
        .and(header("X-Token", "test-token"))
        .and(query_param("id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "response": { "onu_signal_1310": "-21.3" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params = Params::new().with("id", 42);
    let resp = transport
        .get("/onu/get_onu_optical_power", &params)
        .await
        .unwrap();

    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.body["response"]["onu_signal_1310"], "-21.3");
}

#[tokio::test]
async fn test_client_error_is_returned_not_raised() {
    let (server, transport) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/system/get_olts"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "status": false,
            "error": "Hourly limit reached"
        })))
        .mount(&server)
        .await;

    let resp = transport.get("/system/get_olts", &Params::new()).await.unwrap();

    assert_eq!(resp.status_code, 403);
    assert!(resp.is_client_error());
    assert_eq!(resp.body["error"], "Hourly limit reached");
}

#[tokio::test]
async fn test_non_json_client_error_is_kept_as_text() {
    let (server, transport) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/system/get_olts"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let resp = transport.get("/system/get_olts", &Params::new()).await.unwrap();

    assert_eq!(resp.status_code, 404);
    assert_eq!(resp.body, json!("Not Found"));
}

#[tokio::test]
async fn test_server_error_is_raised() {
    let (server, transport) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let result = transport.get("/onu/get_onus_statuses", &Params::new()).await;

    match result {
        Err(Error::Server { status, ref body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected Server error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unparseable_success_body() {
    let (server, transport) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = transport.get("/onu/get_onus_statuses", &Params::new()).await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_empty_success_body_is_an_error() {
    let (server, transport) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/onu/get_onus_statuses"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/onu/get_onu_by_sn"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = transport.get("/onu/get_onus_statuses", &Params::new()).await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );

    // An empty 4xx is still an answer.
    let resp = transport
        .get("/onu/get_onu_by_sn", &Params::new())
        .await
        .unwrap();
    assert_eq!(resp.status_code, 401);
    assert_eq!(resp.body, serde_json::Value::Null);
}

#[tokio::test]
async fn test_timeout_maps_to_timeout_error() {
    let server = MockServer::start().await;
    let token = SecretString::from("test-token".to_string());
    let config = TransportConfig {
        timeout: Duration::from_millis(100),
        ..TransportConfig::default()
    };
    let transport = UpstreamTransport::from_token(&server.uri(), &token, &config).unwrap();

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": true }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let result = transport.get("/system/get_olts", &Params::new()).await;

    assert!(
        matches!(result, Err(Error::Timeout { .. })),
        "expected Timeout error, got: {result:?}"
    );
}

// ── POST ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_post_is_form_encoded() {
    let (server, transport) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/onu/enable_onu"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("id=HWTC0001&reason=manual+test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": true })))
        .expect(1)
        .mount(&server)
        .await;

    let params = Params::new()
        .with("id", "HWTC0001")
        .with("reason", "manual test");
    let resp = transport.post_form("/onu/enable_onu", &params).await.unwrap();

    assert_eq!(resp.body, json!({ "status": true }));
}

// ── Retry over the wire ─────────────────────────────────────────────

#[tokio::test]
async fn test_retry_recovers_after_rate_limit() {
    let (server, transport) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/onu/get_onus_statuses"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "status": false,
            "error": "Too many requests"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/onu/get_onus_statuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "response": []
        })))
        .mount(&server)
        .await;

    let policy = RetryPolicy::new(2, Duration::from_millis(10));
    let params = Params::new();
    let resp = policy
        .run(|| transport.get("/onu/get_onus_statuses", &params))
        .await
        .unwrap();

    assert_eq!(resp.status_code, 200);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
