//! End-to-end tests through the real `reqwest` collaborator against a
//! mock gateway server.

use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use serde_json::json;

use deerapi_node::actions::{chat, video_download, ChatParams};
use deerapi_node::host::StaticCredentials;
use deerapi_node::resilience::CircuitBreakerConfig;
use deerapi_node::transport::{ReqwestClient, Transport, TransportConfig};
use deerapi_node::Error;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn transport_for(server: &mockito::ServerGuard) -> Transport {
    init_tracing();
    Transport::with_config(
        Arc::new(ReqwestClient::new().unwrap()),
        Arc::new(StaticCredentials::new("sk-gw-key", server.url())),
        TransportConfig {
            max_retries: 3,
            retry_delay_base: Duration::from_millis(2),
            default_timeout: Duration::from_millis(60_000),
            breaker: CircuitBreakerConfig::default(),
        },
    )
}

fn chat_body(content: &str) -> String {
    json!({
        "choices": [{
            "message": { "content": content },
            "finish_reason": "stop",
        }],
        "usage": { "prompt_tokens": 3, "completion_tokens": 2 },
    })
    .to_string()
}

#[tokio::test]
async fn chat_round_trip_sends_bearer_auth() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-gw-key")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({ "model": "gpt-4o" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_body("pong"))
        .create_async()
        .await;

    let transport = transport_for(&server);
    let output = chat(&transport, &ChatParams::new("gpt-4o", "ping"))
        .await
        .unwrap();

    assert_eq!(output.content, "pong");
    assert_eq!(output.finish_reason, "stop");
    mock.assert_async().await;
}

#[tokio::test]
async fn claude_requests_hit_the_messages_endpoint_with_lifted_system() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_body(Matcher::PartialJson(json!({
            "model": "claude-sonnet-4-5",
            "system": "Be helpful.",
            "messages": [{ "role": "user", "content": "Hello" }],
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_body("Hi!"))
        .create_async()
        .await;

    let transport = transport_for(&server);
    let mut params = ChatParams::new("claude-sonnet-4-5", "Hello");
    params.system_prompt = Some("Be helpful.".to_string());
    let output = chat(&transport, &params).await.unwrap();

    assert_eq!(output.content, "Hi!");
    mock.assert_async().await;
}

#[tokio::test]
async fn bad_request_is_not_retried_and_maps_to_the_fixed_message() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(400)
        .with_body(r#"{"error": {"message": "missing field"}}"#)
        .expect(1)
        .create_async()
        .await;

    let transport = transport_for(&server);
    let err = chat(&transport, &ChatParams::new("gpt-4o", "ping"))
        .await
        .unwrap_err();

    match err {
        Error::Api(user_facing) => {
            assert_eq!(
                user_facing.message,
                "Bad Request: Please check your input parameters"
            );
            assert_eq!(user_facing.code, "400");
        }
        other => panic!("expected API error, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn server_errors_are_retried_until_the_budget_is_spent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("boom")
        .expect(4)
        .create_async()
        .await;

    let transport = transport_for(&server);
    let err = chat(&transport, &ChatParams::new("gpt-4o", "ping"))
        .await
        .unwrap_err();

    match err {
        Error::Api(user_facing) => {
            assert_eq!(user_facing.message, "Internal Server Error: DeerAPI service error");
            assert_eq!(user_facing.code, "500");
        }
        other => panic!("expected API error, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn video_download_fetches_the_result_binary() {
    let mut server = mockito::Server::new_async().await;
    let retrieve = server
        .mock("GET", "/v1/videos/generations/task-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "completed",
                "video_url": format!("{}/files/task-1.mp4", server.url()),
            })
            .to_string(),
        )
        .create_async()
        .await;
    let file = server
        .mock("GET", "/files/task-1.mp4")
        .with_status(200)
        .with_body("mp4bytes")
        .create_async()
        .await;

    let transport = transport_for(&server);
    let output = video_download(&transport, "task-1").await.unwrap();

    assert_eq!(&output.binary[..], b"mp4bytes");
    retrieve.assert_async().await;
    file.assert_async().await;
}

#[tokio::test]
async fn stalled_download_fails_at_the_timeout() {
    init_tracing();
    // A bound listener that never responds: the connection lands in the
    // accept backlog and the request then stalls until the timeout fires.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/result.mp4", listener.local_addr().unwrap());

    let client = ReqwestClient::new()
        .unwrap()
        .with_download_timeout(Duration::from_millis(50));
    let transport = Transport::new(
        Arc::new(client),
        Arc::new(StaticCredentials::new("sk-gw-key", "http://unused.test")),
    );

    let err = transport.download(&url).await.unwrap_err();
    match err {
        Error::Api(user_facing) => assert_eq!(user_facing.code, "0"),
        other => panic!("expected API error, got {other:?}"),
    }
}
