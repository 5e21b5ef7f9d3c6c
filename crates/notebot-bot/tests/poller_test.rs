//! Polling loop against a mock Bot API.

use std::sync::Arc;
use std::time::Duration;

use notebot_bot::{App, MemorySessionStore, Poller, SessionStore, Status};
use notebot_db::MemoryNoteStore;
use notebot_telegram::{TelegramClient, TelegramConfig};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123:test-token";

fn client_for(server: &MockServer) -> TelegramClient {
    let config = TelegramConfig {
        api_url: server.uri(),
        token: TOKEN.to_string(),
        poll_timeout_secs: 0,
        skip_tls_verify: false,
    };
    TelegramClient::new(config).expect("Failed to create client")
}

fn method_path(name: &str) -> String {
    format!("/bot{}/{}", TOKEN, name)
}

#[tokio::test]
async fn test_poller_dispatches_updates_and_stops_on_shutdown() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(method_path("getUpdates")))
        .and(body_partial_json(json!({"offset": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [{
                "update_id": 10,
                "message": {
                    "message_id": 1,
                    "from": {"id": 7, "is_bot": false, "first_name": "Ann"},
                    "chat": {"id": 70},
                    "text": "/new"
                }
            }]
        })))
        .mount(&server)
        .await;

    // Later polls must advance the offset past the consumed update.
    Mock::given(method("POST"))
        .and(path(method_path("getUpdates")))
        .and(body_partial_json(json!({"offset": 11})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true, "result": []}))
                .set_delay(Duration::from_millis(20)),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(method_path("sendMessage")))
        .and(body_partial_json(json!({"chat_id": 70})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"message_id": 2, "chat": {"id": 70}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sessions = Arc::new(MemorySessionStore::new());
    let app = App::new(
        Arc::new(MemoryNoteStore::new()),
        Arc::new(client.clone()),
        sessions.clone(),
    );
    let poller = Poller::new(client, app).with_error_backoff(Duration::from_millis(10));

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel(1);
    let runner = tokio::spawn(async move { poller.run(&mut shutdown_rx).await });

    let mut waited = 0;
    while sessions.get(7).status != Status::New && waited < 100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += 1;
    }
    assert_eq!(sessions.get(7).status, Status::New);

    shutdown_tx.send(()).await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("poller should stop")
        .expect("poller task should not panic");
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_poller_stops_on_rejected_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(method_path("getUpdates")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let app = App::new(
        Arc::new(MemoryNoteStore::new()),
        Arc::new(client.clone()),
        Arc::new(MemorySessionStore::new()),
    );
    let poller = Poller::new(client, app);

    let (_shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    let result = tokio::time::timeout(Duration::from_secs(5), poller.run(&mut shutdown_rx))
        .await
        .expect("poller should stop by itself");

    assert!(matches!(result, Err(notebot_core::Error::Config(_))));
}
