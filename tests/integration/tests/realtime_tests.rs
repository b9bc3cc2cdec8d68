//! WebSocket session tests against a live tungstenite peer
//!
//! Run with: cargo test -p integration-tests --test realtime_tests

use chat_common::{InMemoryTokenStore, TokenProvider};
use chat_protocol::AuthErrorKind;
use chat_realtime::{
    BackoffPolicy, ConnectionError, ConnectionState, Endpoint, Session, SessionEvent,
    TungsteniteConnector, AUTH_ERROR, NET_ERROR,
};
use integration_tests::{init_test_tracing, MockWsServer};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn fast_policy() -> BackoffPolicy {
    BackoffPolicy::new(Duration::from_millis(50), Duration::from_millis(200))
}

fn session_for(server: &MockWsServer, tokens: Arc<InMemoryTokenStore>) -> Session {
    Session::new(
        Endpoint::with_tokens(server.url(), tokens),
        Arc::new(TungsteniteConnector::new()),
        fast_policy(),
    )
}

fn record(session: &Session, name: &str) -> Arc<Mutex<Vec<SessionEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session.on(name, move |event| sink.lock().push(event.clone()));
    seen
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

// ============================================================================
// Framing and dispatch
// ============================================================================

#[tokio::test]
async fn test_connect_presents_token_and_exchanges_frames() {
    init_test_tracing();
    let mut server = MockWsServer::start().await.unwrap();
    let session = session_for(&server, Arc::new(InMemoryTokenStore::with_token("abc/123")));
    let events = record(&session, "new_message");

    session.connect().await.unwrap();
    assert_eq!(session.state(), ConnectionState::Open);

    let mut peer = server.next_connection(WAIT).await.unwrap();
    assert_eq!(peer.token().as_deref(), Some("abc/123"));

    assert!(session
        .send("send_message", &json!({"content": "hi"}), "req-1")
        .unwrap());
    let request = peer.recv_json(WAIT).await.unwrap();
    assert_eq!(request["type"], "request");
    assert_eq!(request["action"], "send_message");
    assert_eq!(request["request_id"], "req-1");
    assert_eq!(request["data"], json!({"content": "hi"}));

    peer.send_json(&json!({
        "type": "event",
        "version": "1",
        "event": "new_message",
        "request_id": "",
        "status_code": 0,
        "message": "",
        "data": {"content": "hello"}
    }))
    .await
    .unwrap();

    assert!(wait_until(|| events.lock().len() == 1).await);
    let event = events.lock()[0].clone();
    assert_eq!(event.event().unwrap().data, Some(json!({"content": "hello"})));

    session.close();
}

#[tokio::test]
async fn test_malformed_frames_do_not_break_dispatch() {
    let mut server = MockWsServer::start().await.unwrap();
    let session = session_for(&server, Arc::new(InMemoryTokenStore::with_token("t")));
    let fallback = record(&session, "message");

    session.connect().await.unwrap();
    let mut peer = server.next_connection(WAIT).await.unwrap();

    peer.send_json(&json!("just a string")).await.unwrap();
    peer.send_json(&json!({"type": "unknown"})).await.unwrap();
    peer.send_json(&json!({"type": "event", "data": {"n": 1}}))
        .await
        .unwrap();

    assert!(wait_until(|| fallback.lock().len() == 1).await);
    assert_eq!(session.state(), ConnectionState::Open);
    session.close();
}

#[tokio::test]
async fn test_request_helper_correlates_response() {
    let mut server = MockWsServer::start().await.unwrap();
    let session = Arc::new(session_for(&server, Arc::new(InMemoryTokenStore::with_token("t"))));
    session.connect().await.unwrap();
    let mut peer = server.next_connection(WAIT).await.unwrap();

    let pending = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            session
                .request("get_messages", &json!({"count": 20}), WAIT)
                .await
        })
    };

    let request = peer.recv_json(WAIT).await.unwrap();
    let request_id = request["request_id"].as_str().unwrap().to_string();
    assert!(!request_id.is_empty());

    peer.send_json(&json!({
        "type": "response",
        "action": "get_messages",
        "request_id": request_id,
        "status_code": 0,
        "message": "ok",
        "data": {"messages": []}
    }))
    .await
    .unwrap();

    let response = pending.await.unwrap().unwrap();
    assert!(response.is_success());
    assert_eq!(response.data, Some(json!({"messages": []})));
    session.close();
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_auth_close_emits_auth_error_and_stops() {
    let mut server = MockWsServer::start().await.unwrap();
    let session = session_for(&server, Arc::new(InMemoryTokenStore::with_token("stale")));
    let auth_errors = record(&session, AUTH_ERROR);

    session.connect().await.unwrap();
    let peer = server.next_connection(WAIT).await.unwrap();
    peer.close_with_reason("token_expired").await.unwrap();

    assert!(wait_until(|| auth_errors.lock().len() == 1).await);
    // give a reconnect (50ms backoff) ample time to show up if it were scheduled
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(
        auth_errors.lock()[0].auth_error(),
        Some(AuthErrorKind::TokenExpired)
    );
    assert_eq!(auth_errors.lock().len(), 1);
    assert_eq!(server.accepted(), 1);
    assert_eq!(session.state(), ConnectionState::Idle);
}

#[tokio::test]
async fn test_transient_drop_reconnects_with_current_token() {
    let mut server = MockWsServer::start().await.unwrap();
    let store = Arc::new(InMemoryTokenStore::with_token("first"));
    let session = session_for(&server, store.clone());

    session.connect().await.unwrap();
    let peer = server.next_connection(WAIT).await.unwrap();
    assert_eq!(peer.token().as_deref(), Some("first"));

    store.set("second");
    peer.close_with_reason("server restart").await.unwrap();

    let peer = server.next_connection(WAIT).await.unwrap();
    assert_eq!(peer.token().as_deref(), Some("second"));
    assert!(wait_until(|| session.state() == ConnectionState::Open).await);

    peer.drop_connection();
    let _third = server.next_connection(WAIT).await.unwrap();
    assert!(wait_until(|| session.state() == ConnectionState::Open).await);

    session.close();
}

#[tokio::test]
async fn test_close_sends_close_and_never_reconnects() {
    let mut server = MockWsServer::start().await.unwrap();
    let session = session_for(&server, Arc::new(InMemoryTokenStore::with_token("t")));

    session.connect().await.unwrap();
    let mut peer = server.next_connection(WAIT).await.unwrap();

    session.close();
    peer.expect_close(WAIT).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(server.accepted(), 1);
    assert_eq!(session.state(), ConnectionState::Idle);
    assert!(!session.send("get_messages", &json!({}), "late").unwrap());
}

#[tokio::test]
async fn test_initial_connect_failure_reports_net_error() {
    // reserve a port, then free it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let session = Session::new(
        Endpoint::new(format!("ws://{addr}/ws")),
        Arc::new(TungsteniteConnector::new()),
        fast_policy(),
    );
    let net_errors = record(&session, NET_ERROR);

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, ConnectionError::Transport(_)));
    tokio::time::sleep(Duration::from_millis(300)).await;

    let net_errors = net_errors.lock();
    assert_eq!(net_errors.len(), 1);
    assert_eq!(net_errors[0].to_value()["error"], "ws_error");
    assert_eq!(session.state(), ConnectionState::Idle);
}
