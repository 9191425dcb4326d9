//! Retry, backoff, and circuit-breaker behavior of the request transport.

mod common;

use std::time::Duration;

use serde_json::{json, Value};

use common::{fast_transport, server_error, ScriptedHttp};
use deerapi_node::host::HttpFailure;
use deerapi_node::transport::RequestDescriptor;
use deerapi_node::{build_request_for_model, Error, Message};

#[tokio::test]
async fn transient_failures_are_retried_until_success() {
    let http = ScriptedHttp::new();
    http.push(Err(server_error(500)));
    http.push(Err(server_error(500)));
    http.push(Ok(json!({ "ok": true })));
    let transport = fast_transport(http.clone());

    let response = transport
        .perform_request(&RequestDescriptor::post("/v1/chat/completions", json!({})))
        .await
        .unwrap();

    assert_eq!(response, json!({ "ok": true }));
    assert_eq!(http.call_count(), 3);
    assert_eq!(transport.breaker().snapshot().consecutive_failures, 0);
}

#[tokio::test]
async fn client_errors_are_never_retried() {
    let http = ScriptedHttp::new();
    http.push(Err(server_error(400)));
    let transport = fast_transport(http.clone());

    let err = transport
        .perform_request(&RequestDescriptor::post("/v1/chat/completions", json!({})))
        .await
        .unwrap_err();

    assert_eq!(http.call_count(), 1);
    match err {
        Error::Api(e) => {
            assert_eq!(e.code, "400");
            assert_eq!(e.message, "Bad Request: Please check your input parameters");
        }
        other => panic!("expected sanitized API error, got {other:?}"),
    }
    assert_eq!(transport.breaker().snapshot().consecutive_failures, 1);
}

#[tokio::test]
async fn rate_limit_is_retryable() {
    let http = ScriptedHttp::new();
    http.push(Err(server_error(429)));
    http.push(Ok(json!({ "ok": true })));
    let transport = fast_transport(http.clone());

    transport
        .perform_request(&RequestDescriptor::post("/v1/chat/completions", json!({})))
        .await
        .unwrap();
    assert_eq!(http.call_count(), 2);
}

#[tokio::test]
async fn exhausted_retries_surface_sanitized_error() {
    let http = ScriptedHttp::new();
    for _ in 0..4 {
        http.push(Err(server_error(503)));
    }
    let transport = fast_transport(http.clone());

    let err = transport
        .perform_request(&RequestDescriptor::post("/v1/chat/completions", json!({})))
        .await
        .unwrap_err();

    // 1 initial attempt + 3 retries.
    assert_eq!(http.call_count(), 4);
    match err {
        Error::Api(e) => {
            assert_eq!(e.code, "503");
            assert_eq!(e.message, "Service Unavailable: DeerAPI is under maintenance");
        }
        other => panic!("expected sanitized API error, got {other:?}"),
    }
    // The whole exhausted sequence counts as one consecutive failure.
    assert_eq!(transport.breaker().snapshot().consecutive_failures, 1);
}

#[tokio::test]
async fn failures_without_status_fail_fast() {
    let http = ScriptedHttp::new();
    http.push(Err(HttpFailure::without_status("connection reset by peer")));
    let transport = fast_transport(http.clone());

    let err = transport
        .perform_request(&RequestDescriptor::post("/v1/chat/completions", json!({})))
        .await
        .unwrap_err();

    assert_eq!(http.call_count(), 1);
    match err {
        Error::Api(e) => {
            assert_eq!(e.code, "0");
            assert_eq!(e.message, "connection reset by peer");
        }
        other => panic!("expected sanitized API error, got {other:?}"),
    }
}

#[tokio::test]
async fn breaker_opens_after_five_consecutive_failures() {
    let http = ScriptedHttp::new();
    for _ in 0..5 {
        http.push(Err(server_error(400)));
    }
    let transport = fast_transport(http.clone());

    for _ in 0..5 {
        let _ = transport
            .perform_request(&RequestDescriptor::post("/v1/chat/completions", json!({})))
            .await;
    }
    assert_eq!(http.call_count(), 5);

    // Sixth call fails fast without touching the HTTP collaborator.
    let err = transport
        .perform_request(&RequestDescriptor::post("/v1/chat/completions", json!({})))
        .await
        .unwrap_err();
    assert!(err.is_circuit_open(), "expected circuit-open, got {err:?}");
    assert_eq!(http.call_count(), 5);

    match err {
        Error::CircuitOpen { retry_after_secs } => assert!(retry_after_secs <= 30),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn breaker_half_opens_after_cooldown_and_success_resets_it() {
    let http = ScriptedHttp::new();
    http.push(Ok(json!({ "ok": true })));
    let transport = fast_transport(http.clone());

    transport
        .breaker()
        .set_state(5, Some(Duration::from_millis(10)));
    tokio::time::sleep(Duration::from_millis(20)).await;

    transport
        .perform_request(&RequestDescriptor::post("/v1/chat/completions", json!({})))
        .await
        .unwrap();

    assert_eq!(http.call_count(), 1);
    let snapshot = transport.breaker().snapshot();
    assert_eq!(snapshot.consecutive_failures, 0);
    assert!(snapshot.open_remaining_ms.is_none());
}

#[tokio::test]
async fn wire_request_carries_auth_and_caller_header_overrides() {
    let http = ScriptedHttp::new();
    http.push(Ok(Value::Null));
    let transport = fast_transport(http.clone());

    transport
        .perform_request(
            &RequestDescriptor::post("/v1/chat/completions", json!({}))
                .with_header("Content-Type", "application/x-ndjson")
                .with_timeout(Duration::from_millis(120_000)),
        )
        .await
        .unwrap();

    let wire = &http.calls()[0];
    assert_eq!(wire.url, "https://gw.test/v1/chat/completions");
    assert_eq!(wire.headers["Authorization"], "Bearer sk-test-key");
    assert_eq!(wire.headers["Content-Type"], "application/x-ndjson");
    assert_eq!(wire.timeout, Duration::from_millis(120_000));
}

#[tokio::test]
async fn default_timeout_is_sixty_seconds() {
    let http = ScriptedHttp::new();
    http.push(Ok(Value::Null));
    let transport = fast_transport(http.clone());

    transport
        .perform_request(&RequestDescriptor::get("/v1/videos/generations"))
        .await
        .unwrap();
    assert_eq!(http.calls()[0].timeout, Duration::from_millis(60_000));
}

#[tokio::test]
async fn sanitized_errors_never_echo_the_api_key() {
    let http = ScriptedHttp::new();
    http.push(Err(HttpFailure {
        status: Some(418),
        http_code: None,
        message: "edge rejected bearer sk-test-key".into(),
        description: "Authorization: Bearer sk-test-key".into(),
    }));
    let transport = fast_transport(http.clone());

    let err = transport
        .perform_request(&RequestDescriptor::post("/v1/chat/completions", json!({})))
        .await
        .unwrap_err();
    match err {
        Error::Api(e) => {
            assert!(!e.message.contains("sk-test-key"));
            assert!(!e.description.contains("sk-test-key"));
            assert!(e.message.contains("sk-t****"));
        }
        other => panic!("expected sanitized API error, got {other:?}"),
    }
}

#[tokio::test]
async fn claude_chat_request_hits_the_messages_path_with_lifted_system() {
    let http = ScriptedHttp::new();
    http.push(Ok(json!({ "ok": true })));
    let transport = fast_transport(http.clone());

    let messages = vec![Message::system("Be helpful."), Message::user("Hello")];
    let built =
        build_request_for_model("claude-sonnet-4-5", &messages, &Value::Null).unwrap();
    transport
        .perform_request(&RequestDescriptor::post(built.endpoint, built.body))
        .await
        .unwrap();

    let wire = &http.calls()[0];
    assert_eq!(wire.url, "https://gw.test/v1/messages");
    let body = wire.body.as_ref().unwrap();
    assert_eq!(body["system"], "Be helpful.");
    assert_eq!(body["messages"], json!([{ "role": "user", "content": "Hello" }]));
}
