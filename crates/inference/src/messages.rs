//! Real-time stream frame types.
//!
//! Frames are JSON text messages shaped `{"type": "<kind>", ...}`. The
//! gateway forwards them untouched; it only inspects the optional
//! `requestId` correlation key so it can report requests that never got an
//! answer.

use serde::{Deserialize, Serialize};

/// Frames sent by a client towards the inference stream.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// One image to analyse, usually a base64 data URL.
    Frame {
        image: String,
        #[serde(default)]
        meta: Option<FrameMeta>,
    },
    Ping,
}

/// Client-supplied metadata echoed back by the service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FrameMeta {
    #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Frames sent towards a client, either by the service or by the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamFrame {
    Detections {
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        #[serde(flatten)]
        payload: serde_json::Map<String, serde_json::Value>,
    },
    Error {
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        message: String,
    },
    Pong,
}

impl StreamFrame {
    /// Error frame emitted when a tracked request outlives its TTL.
    pub fn expired(request_id: impl Into<String>) -> Self {
        StreamFrame::Error {
            request_id: Some(request_id.into()),
            message: "Request timed out".into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error","message":"encode"}"#.into())
    }
}

/// Correlation key of a frame in either direction, if any.
///
/// Looks at `meta.requestId` first, then a top-level `requestId`. Text that
/// is not a JSON object yields `None`.
pub fn request_id_of(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value
        .get("meta")
        .and_then(|m| m.get("requestId"))
        .or_else(|| value.get("requestId"))
        .and_then(|v| v.as_str())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_client_frame_with_meta() {
        let text = r#"{"type":"frame","image":"data:image/jpeg;base64,AAAA","meta":{"requestId":"r1","w":640}}"#;
        let frame: ClientFrame = serde_json::from_str(text).unwrap();
        assert_matches!(frame, ClientFrame::Frame { meta: Some(meta), .. } => {
            assert_eq!(meta.request_id.as_deref(), Some("r1"));
            assert_eq!(meta.extra.get("w"), Some(&serde_json::json!(640)));
        });
        assert_eq!(request_id_of(text).as_deref(), Some("r1"));
    }

    #[test]
    fn ping_has_no_request_id() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_matches!(frame, ClientFrame::Ping);
        assert_eq!(request_id_of(r#"{"type":"ping"}"#), None);
        assert_eq!(request_id_of("not json"), None);
    }

    #[test]
    fn reply_id_may_be_top_level() {
        let text = r#"{"type":"detections","requestId":"r9","predictions":[]}"#;
        assert_eq!(request_id_of(text).as_deref(), Some("r9"));
        let frame: StreamFrame = serde_json::from_str(text).unwrap();
        assert_matches!(frame, StreamFrame::Detections { request_id: Some(id), payload } => {
            assert_eq!(id, "r9");
            assert!(payload.contains_key("predictions"));
        });
    }

    #[test]
    fn expired_frame_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&StreamFrame::expired("r2").to_json()).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["requestId"], "r2");
        assert!(json["message"].as_str().unwrap().contains("timed out"));
    }
}
