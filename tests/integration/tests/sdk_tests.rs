//! SDK facade wiring tests
//!
//! Run with: cargo test -p integration-tests --test sdk_tests

use chat_sdk::{ClientConfig, InMemoryTokenStore, Sdk, TokenProvider, TokenRefresher};
use integration_tests::{MockBackend, MockWsServer, Reply};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_refreshed_token_is_shared_with_sessions() {
    let backend = MockBackend::start(vec![
        Reply::failure(401, 4002, "expired", None),
        Reply::ok(json!({"id": 1})),
    ])
    .await
    .unwrap();
    let mut server = MockWsServer::start().await.unwrap();

    let tokens = Arc::new(InMemoryTokenStore::with_token("old"));
    let refresher: Arc<dyn TokenRefresher> = Arc::new(|| async { Some("fresh".to_string()) });
    let sdk = Sdk::with_refresher(
        ClientConfig::new(backend.base_url(), server.url()),
        tokens.clone(),
        refresher,
    )
    .unwrap();

    let me: Value = sdk.api().get("/v1/me").await.unwrap();
    assert_eq!(me, json!({"id": 1}));
    assert_eq!(tokens.get().as_deref(), Some("fresh"));

    let session = sdk.session();
    session.connect().await.unwrap();
    let peer = server
        .next_connection(Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(peer.token().as_deref(), Some("fresh"));
    session.close();
}
