use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ConvertError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol revision answered when the client does not ask for one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const UNKNOWN_TEMPLATE: i64 = -32001;
pub const ENCODING_FAILURE: i64 = -32002;
pub const MALFORMED_MARKUP: i64 = -32003;
pub const OUTPUT_FAILURE: i64 = -32004;

/// An incoming message. Without an `id` it is a notification.
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error object. `data.kind` names the failure for clients that
/// branch on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, kind: &str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(json!({ "kind": kind })),
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, "ParseError", message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, "InvalidRequest", message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            METHOD_NOT_FOUND,
            "MethodNotFound",
            format!("method not found: {method}"),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, "InvalidParams", message)
    }

    pub fn output_failure(message: impl Into<String>) -> Self {
        Self::new(OUTPUT_FAILURE, "OutputFailure", message)
    }

    /// Attach extra fields next to `kind` in `data`.
    pub fn with_data(mut self, key: &str, value: Value) -> Self {
        if let Some(Value::Object(data)) = self.data.as_mut() {
            data.insert(key.to_string(), value);
        }
        self
    }

    pub fn kind(&self) -> Option<&str> {
        self.data.as_ref()?.get("kind")?.as_str()
    }
}

impl From<&ConvertError> for RpcError {
    fn from(err: &ConvertError) -> Self {
        let code = match err {
            ConvertError::UnknownTemplate { .. } => UNKNOWN_TEMPLATE,
            ConvertError::EncodingFailure { .. } => ENCODING_FAILURE,
            ConvertError::MalformedMarkup { .. } => MALFORMED_MARKUP,
        };
        let error = RpcError::new(code, err.kind(), err.to_string());
        match err {
            ConvertError::UnknownTemplate { available, .. } => {
                error.with_data("available", json!(available))
            }
            ConvertError::EncodingFailure { character, block } => error
                .with_data("codepoint", json!(*character as u32))
                .with_data("block", json!(block)),
            ConvertError::MalformedMarkup { line, .. } => error.with_data("line", json!(line)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_omits_error() {
        let response = Response::success(json!(1), json!({}));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "jsonrpc": "2.0", "id": 1, "result": {} })
        );
    }

    #[test]
    fn failure_carries_kind() {
        let response = Response::failure(Value::Null, RpcError::parse_error("bad json"));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": { "code": -32700, "message": "bad json", "data": { "kind": "ParseError" } }
            })
        );
    }

    #[test]
    fn request_without_id_is_notification() {
        let request: Request =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(request.is_notification());
        assert!(request.params.is_none());
    }

    #[test]
    fn convert_errors_map_to_distinct_codes() {
        let unknown = RpcError::from(&ConvertError::UnknownTemplate {
            name: "x".to_string(),
            available: vec!["custom".to_string()],
        });
        assert_eq!(unknown.code, UNKNOWN_TEMPLATE);
        assert_eq!(unknown.kind(), Some("UnknownTemplate"));
        assert_eq!(unknown.data.as_ref().unwrap()["available"], json!(["custom"]));

        let encoding = RpcError::from(&ConvertError::EncodingFailure {
            character: '\u{1b}',
            block: 3,
        });
        assert_eq!(encoding.code, ENCODING_FAILURE);
        assert_eq!(encoding.data.as_ref().unwrap()["codepoint"], json!(27));

        let malformed = RpcError::from(&ConvertError::MalformedMarkup {
            line: 1,
            reason: "r".to_string(),
        });
        assert_eq!(malformed.code, MALFORMED_MARKUP);
    }
}
