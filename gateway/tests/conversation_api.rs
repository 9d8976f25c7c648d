//! Integration tests for the gateway HTTP surface against a mocked backend.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::Router;
use convo_gateway::test_util::{test_config, RecordingEventSink, TEST_TOKEN};
use convo_gateway::{
    build_router, AppState, ErrorBody, ForwardingClient, GatewayOptions, GatewayService,
};
use http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_url(server: &MockServer) -> String {
    format!("{}/serving-endpoints/chat/invocations", server.uri())
}

fn app_with_timeout(server: &MockServer, read_timeout: Duration) -> Router {
    let config = test_config(&backend_url(server));
    let transport = Arc::new(ForwardingClient::new(Duration::from_secs(1)).unwrap());
    let service = GatewayService::new(
        GatewayOptions {
            read_timeout,
            ..GatewayOptions::from_config(&config)
        },
        config.backend.clone(),
        transport,
        Arc::new(RecordingEventSink::default()),
    );
    build_router(Arc::new(AppState { config, service }))
}

fn app(server: &MockServer) -> Router {
    let config = test_config(&backend_url(server));
    let transport = Arc::new(ForwardingClient::new(config.backend.connect_timeout()).unwrap());
    let events = Arc::new(RecordingEventSink::default());
    build_router(Arc::new(AppState::new(config, transport, events)))
}

async fn post_conversation(app: Router, body: &str) -> (StatusCode, Option<String>, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/product-conversation")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let correlation = response
        .headers()
        .get("x-correlation-id")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, correlation, serde_json::from_slice(&bytes).unwrap())
}

async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_headache_conversation_returns_first_prediction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/serving-endpoints/chat/invocations"))
        .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .and(body_partial_json(json!({
            "inputs": {
                "message": ["i have a headache"],
                "conversationId": ["test"],
                "messageId": ["test"],
                "metadata": [null]
            }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"predictions": [{"reply": "see a doctor"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (status, correlation, body) = post_conversation(
        app(&server),
        r#"{"message":"i have a headache","conversationId":"test","messageId":"test"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(correlation.is_some());
    let body = body.as_object().unwrap();
    assert_eq!(body.len(), 2);
    assert_eq!(body["reply"], "see a doctor");
    let received = body["received"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(received).is_ok());
}

#[tokio::test]
async fn test_empty_message_is_rejected_without_backend_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"predictions": [{}]})))
        .expect(0)
        .mount(&server)
        .await;

    let (status, correlation, body) = post_conversation(
        app(&server),
        r#"{"message":"","conversationId":"test","messageId":"test"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorBody = serde_json::from_value(body).unwrap();
    assert_eq!(error.error.error_type, "missing_field");
    assert_eq!(error.error.message, "Null values are not allowed");
    assert_eq!(error.error.field.as_deref(), Some("message"));
    assert_eq!(correlation, Some(error.correlation_id.to_string()));
}

#[tokio::test]
async fn test_malformed_json_gets_structured_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, _, body) = post_conversation(app(&server), "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "malformed_input");
    assert_eq!(body["error"]["message"], "Invalid JSON");
}

#[tokio::test]
async fn test_empty_predictions_is_backend_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"predictions": []})))
        .mount(&server)
        .await;

    let (status, _, body) = post_conversation(
        app(&server),
        r#"{"message":"hi","conversationId":"c","messageId":"m"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["type"], "backend_unavailable");
    assert_eq!(body["error"]["message"], "Internal Server Error");
}

#[tokio::test]
async fn test_backend_timeout_is_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"predictions": [{"reply": "too late"}]}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let (status, _, body) = post_conversation(
        app_with_timeout(&server, Duration::from_millis(200)),
        r#"{"message":"hi","conversationId":"c","messageId":"m"}"#,
    )
    .await;

    assert!(status.is_server_error());
    assert_eq!(body["error"]["type"], "backend_unavailable");
}

#[tokio::test]
async fn test_caller_correlation_id_is_not_echoed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"predictions": [{"a": 1}]})))
        .mount(&server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/product-conversation")
        .header("x-correlation-id", "from-caller")
        .body(Body::from(
            r#"{"message":"hi","conversationId":"c","messageId":"m"}"#,
        ))
        .unwrap();
    let response = app(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let ours = response.headers()["x-correlation-id"].to_str().unwrap();
    assert_ne!(ours, "from-caller");
    assert!(uuid::Uuid::parse_str(ours).is_ok());
}

#[tokio::test]
async fn test_welcome_hello_and_health() {
    let server = MockServer::start().await;

    let (status, text) = get_text(app(&server), "/welcome").await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.starts_with("Welcome"));

    let (status, text) = get_text(app(&server), "/hello").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_str::<Value>(&text).unwrap(),
        json!({"message": "hello world"})
    );

    let (status, text) = get_text(app(&server), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&text).unwrap()["status"], "ok");
}
