//! Control protocol: inbound JSON messages and error replies.
//!
//! Every text frame carries one JSON object with at least a `type` field:
//!
//! ```text
//! Request:  { "type": string, ...operation-specific fields }
//! Errors:   { "error": "Invalid data received!" }
//!           { "error": <parse or handler error> }
//!           { "error": "Invalid operation \"<type>\"!" }
//! ```
//!
//! Success replies are adapter-defined and sent by the adapter's handler.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use wog_types::Frame;

use crate::AdapterError;

/// Reply text for frames that are not a JSON object with a `type`.
pub const INVALID_DATA: &str = "Invalid data received!";

/// A decoded control message.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlMessage {
    kind: String,
    body: Map<String, Value>,
}

impl ControlMessage {
    /// Build a message directly (tests, in-process callers).
    pub fn new(kind: impl Into<String>, body: Value) -> Self {
        let kind = kind.into();
        let mut body = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        body.insert("type".to_string(), Value::String(kind.clone()));
        Self { kind, body }
    }

    /// The requested operation.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The full message object, `type` included.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Deserialize a required field.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<T, AdapterError> {
        let value = self
            .body
            .get(name)
            .ok_or_else(|| AdapterError::Protocol(format!("missing field \"{name}\"")))?;
        serde_json::from_value(value.clone())
            .map_err(|e| AdapterError::Protocol(format!("invalid field \"{name}\": {e}")))
    }

    /// Deserialize an optional field; `null` counts as absent.
    pub fn optional_field<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AdapterError> {
        match self.body.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.field(name).map(Some),
        }
    }

    /// Deserialize the whole message into a typed request.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, AdapterError> {
        serde_json::from_value(Value::Object(self.body.clone()))
            .map_err(|e| AdapterError::Protocol(format!("invalid \"{}\" message: {e}", self.kind)))
    }
}

/// Why an inbound frame could not be turned into a [`ControlMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Binary frame, non-object JSON, or an object without a string `type`.
    #[error("Invalid data received!")]
    InvalidData,

    /// The text was not valid JSON.
    #[error("{0}")]
    Parse(String),
}

/// Decode one inbound data frame. Close frames are not data.
pub fn decode(frame: &Frame) -> Result<ControlMessage, DecodeError> {
    let text = match frame {
        Frame::Text(text) => text,
        Frame::Binary(_) | Frame::Close => return Err(DecodeError::InvalidData),
    };
    let value: Value = serde_json::from_str(text).map_err(|e| DecodeError::Parse(e.to_string()))?;
    let Value::Object(body) = value else {
        return Err(DecodeError::InvalidData);
    };
    let kind = match body.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        _ => return Err(DecodeError::InvalidData),
    };
    Ok(ControlMessage { kind, body })
}

/// `{ "error": <message> }`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorReply {
    pub error: String,
}

impl ErrorReply {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    pub fn invalid_data() -> Self {
        Self::new(INVALID_DATA)
    }

    pub fn invalid_operation(kind: &str) -> Self {
        Self::new(format!("Invalid operation \"{kind}\"!"))
    }

    pub fn to_json(&self) -> String {
        serde_json::json!({ "error": self.error }).to_string()
    }
}

impl From<DecodeError> for ErrorReply {
    fn from(e: DecodeError) -> Self {
        Self::new(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn text(s: &str) -> Frame {
        Frame::Text(s.to_string())
    }

    #[test]
    fn decodes_object_with_type() {
        let message = decode(&text(r#"{ "type": "watch", "id": "log-1" }"#)).unwrap();
        assert_eq!(message.kind(), "watch");
        assert_eq!(message.field::<String>("id").unwrap(), "log-1");
    }

    #[test]
    fn binary_frames_are_invalid_data() {
        assert_eq!(decode(&Frame::Binary(vec![1, 2, 3])), Err(DecodeError::InvalidData));
    }

    #[test]
    fn non_objects_are_invalid_data() {
        for payload in ["42", "\"watch\"", "[1,2]", "null", r#"{ "id": 1 }"#, r#"{ "type": 7 }"#] {
            assert_eq!(decode(&text(payload)), Err(DecodeError::InvalidData), "{payload}");
        }
    }

    #[test]
    fn malformed_json_reports_the_parser_error() {
        match decode(&text("{ not json")) {
            Err(DecodeError::Parse(cause)) => assert!(!cause.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_reply_shapes() {
        assert_eq!(ErrorReply::invalid_data().to_json(), r#"{"error":"Invalid data received!"}"#);
        assert_eq!(
            ErrorReply::invalid_operation("frobnicate").to_json(),
            r#"{"error":"Invalid operation \"frobnicate\"!"}"#
        );
        assert_eq!(ErrorReply::from(DecodeError::InvalidData), ErrorReply::invalid_data());
    }

    #[test]
    fn field_errors_are_protocol_errors() {
        let message = ControlMessage::new("contents", serde_json::json!({ "page": "x" }));
        assert!(matches!(message.field::<String>("id"), Err(AdapterError::Protocol(_))));
        assert!(matches!(message.field::<i64>("page"), Err(AdapterError::Protocol(_))));
        assert_eq!(message.optional_field::<i64>("missing").unwrap(), None);
    }

    #[test]
    fn parse_into_typed_request() {
        #[derive(Deserialize)]
        struct Contents {
            id: String,
            #[serde(default)]
            page: Option<i64>,
        }
        let message = ControlMessage::new("contents", serde_json::json!({ "id": "log-1" }));
        let request: Contents = message.parse().unwrap();
        assert_eq!(request.id, "log-1");
        assert_eq!(request.page, None);
        assert_eq!(message.body()["type"], "contents");
    }
}
