//! WebSocket frame format
//!
//! Every frame is a JSON text message tagged by its `type` field. Requests go
//! out, responses and events come back; responses echo the request's action
//! and correlation id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version stamped on outgoing requests
pub const PROTOCOL_VERSION: &str = "1";

/// Dispatch name used when a frame carries neither an event nor an action name
pub const FALLBACK_DISPATCH_KEY: &str = "message";

/// Outgoing request frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsRequest {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub data: Value,
}

/// Response to a request, routed by action name unless it names an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsResponse {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,
    #[serde(default)]
    pub request_id: String,
    /// Application status code (0 = success)
    #[serde(default)]
    pub status_code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl WsResponse {
    /// Check if the response reports success
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code == 0
    }
}

/// Server-initiated event, routed by event name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsEvent {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub event: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub status_code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A single WebSocket frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    Request(WsRequest),
    Response(WsResponse),
    Event(WsEvent),
}

impl Frame {
    /// Build a request frame for `action`
    #[must_use]
    pub fn request(action: impl Into<String>, request_id: impl Into<String>, data: Value) -> Self {
        Self::Request(WsRequest {
            version: PROTOCOL_VERSION.to_string(),
            action: action.into(),
            event: String::new(),
            request_id: request_id.into(),
            data,
        })
    }

    /// Name subscribers are looked up under
    ///
    /// A non-empty `event` field wins over `action` whatever the frame type;
    /// with neither the frame falls back to [`FALLBACK_DISPATCH_KEY`].
    #[must_use]
    pub fn dispatch_key(&self) -> &str {
        let (event, action) = match self {
            Self::Event(e) => (&e.event, &e.action),
            Self::Response(r) => (&r.event, &r.action),
            Self::Request(r) => (&r.event, &r.action),
        };
        [event, action]
            .into_iter()
            .find(|name| !name.is_empty())
            .map_or(FALLBACK_DISPATCH_KEY, String::as_str)
    }

    /// Correlation id carried by the frame
    #[must_use]
    pub fn request_id(&self) -> &str {
        match self {
            Self::Request(request) => &request.request_id,
            Self::Response(response) => &response.request_id,
            Self::Event(event) => &event.request_id,
        }
    }

    /// Payload carried by the frame
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Request(request) => Some(&request.data),
            Self::Response(response) => response.data.as_ref(),
            Self::Event(event) => event.data.as_ref(),
        }
    }

    #[must_use]
    pub fn as_response(&self) -> Option<&WsResponse> {
        match self {
            Self::Response(response) => Some(response),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_event(&self) -> Option<&WsEvent> {
        match self {
            Self::Event(event) => Some(event),
            _ => None,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(r) => write!(f, "Request(action={}, request_id={})", r.action, r.request_id),
            Self::Response(r) => write!(
                f,
                "Response(action={}, request_id={}, status_code={})",
                r.action, r.request_id, r.status_code
            ),
            Self::Event(e) => write!(f, "Event(event={}, status_code={})", e.event, e.status_code),
        }
    }
}
