//! Scripted HTTP backend
//!
//! Replies are served in order; once the script runs out every request gets
//! an empty success envelope. Every request is recorded.

use anyhow::Result;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One request as the backend saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// One scripted response
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub www_authenticate: Option<String>,
    pub body: String,
}

impl Reply {
    /// HTTP 200 with a success envelope around `data`
    pub fn ok(data: Value) -> Self {
        Self::json(
            200,
            &json!({"version": "1", "status_code": 0, "message": "ok", "data": data}),
        )
    }

    /// HTTP 200 with a success envelope and no `data`
    pub fn ok_empty() -> Self {
        Self::json(200, &json!({"version": "1", "status_code": 0, "message": "ok"}))
    }

    /// Failure envelope
    pub fn failure(status: u16, status_code: i64, message: &str, data: Option<Value>) -> Self {
        let mut envelope = json!({"version": "1", "status_code": status_code, "message": message});
        if let Some(data) = data {
            envelope["data"] = data;
        }
        Self::json(status, &envelope)
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            www_authenticate: None,
            body: body.to_string(),
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            www_authenticate: None,
            body: body.to_string(),
        }
    }

    /// Attach a `WWW-Authenticate` header
    pub fn with_challenge(mut self, challenge: &str) -> Self {
        self.www_authenticate = Some(challenge.to_string());
        self
    }
}

#[derive(Default)]
struct BackendState {
    requests: Mutex<Vec<RecordedRequest>>,
    replies: Mutex<VecDeque<Reply>>,
}

/// In-process HTTP server
pub struct MockBackend {
    pub addr: SocketAddr,
    state: Arc<BackendState>,
    _handle: JoinHandle<()>,
}

impl MockBackend {
    /// Start on an ephemeral port
    pub async fn start(replies: Vec<Reply>) -> Result<Self> {
        let state = Arc::new(BackendState::default());
        state.replies.lock().extend(replies);

        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }
}

async fn handle(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string);
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.requests.lock().push(RecordedRequest {
        method: method.to_string(),
        path,
        authorization,
        body,
    });

    let reply = state
        .replies
        .lock()
        .pop_front()
        .unwrap_or_else(Reply::ok_empty);

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Body::from(reply.body)).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    if let Some(challenge) = reply.www_authenticate {
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }
    }
    response
}
