use std::io::{self, BufRead, Write};

use serde_json::{Value, json};

use super::protocol::{DEFAULT_PROTOCOL_VERSION, JSONRPC_VERSION, Request, Response, RpcError};
use super::tools::{CreateOutcome, Tools};

/// Serves requests one line at a time until the input closes.
#[derive(Debug, Clone)]
pub struct Server {
    name: String,
    tools: Tools,
}

impl Server {
    pub fn new(name: impl Into<String>, tools: Tools) -> Self {
        Self {
            name: name.into(),
            tools,
        }
    }

    /// Read requests from `input` and write one response line per request to
    /// `output`. Returns when `input` reaches end of file.
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> io::Result<()> {
        log::info!("{} listening on stdio", self.name);

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line),
                Err(e) => {
                    log::warn!("discarding message that is not UTF-8: {e}");
                    Some(Response::failure(
                        Value::Null,
                        RpcError::parse_error(format!("parse error: {e}")),
                    ))
                }
            };

            if let Some(response) = response {
                let encoded = serde_json::to_string(&response).map_err(io::Error::other)?;
                writeln!(output, "{encoded}")?;
                output.flush()?;
            }
        }

        log::info!("input closed, shutting down");
        Ok(())
    }

    /// Handle one raw message. Notifications produce no response.
    pub fn handle_line(&self, line: &str) -> Option<Response> {
        let message: Value = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("discarding unparseable message: {e}");
                return Some(Response::failure(
                    Value::Null,
                    RpcError::parse_error(format!("parse error: {e}")),
                ));
            }
        };

        if !message.is_object() {
            log::warn!("discarding non-object message");
            return Some(Response::failure(
                Value::Null,
                RpcError::invalid_request("request must be a JSON object"),
            ));
        }

        let id = message.get("id").cloned();
        let request: Request = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("invalid request: {e}");
                return Some(Response::failure(
                    id.unwrap_or(Value::Null),
                    RpcError::invalid_request(format!("invalid request: {e}")),
                ));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            log::warn!("unsupported jsonrpc version {:?}", request.jsonrpc);
            return Some(Response::failure(
                request.id.unwrap_or(Value::Null),
                RpcError::invalid_request(format!(
                    "unsupported jsonrpc version {:?}, expected \"{JSONRPC_VERSION}\"",
                    request.jsonrpc
                )),
            ));
        }

        if request.is_notification() {
            log::debug!("notification {}", request.method);
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        log::debug!("request {} (id {id})", request.method);
        match self.dispatch(&request) {
            Ok(result) => Some(Response::success(id, result)),
            Err(error) => Some(Response::failure(id, error)),
        }
    }

    fn dispatch(&self, request: &Request) -> Result<Value, RpcError> {
        let params = request.params.clone().unwrap_or_else(|| json!({}));
        match request.method.as_str() {
            "initialize" => Ok(self.initialize(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tools.definitions() })),
            "tools/call" => {
                let outcome = self.call_tool(&params)?;
                let text = format!(
                    "{} at {} ({} bytes, template '{}')",
                    outcome.message, outcome.path, outcome.bytes, outcome.template
                );
                Ok(json!({
                    "content": [{ "type": "text", "text": text }],
                    "isError": false,
                    "structuredContent": outcome,
                }))
            }
            "tools/execute" => {
                let outcome = self.call_tool(&params)?;
                serde_json::to_value(outcome)
                    .map_err(|e| RpcError::invalid_params(e.to_string()))
            }
            other => {
                log::warn!("unknown method {other}");
                Err(RpcError::method_not_found(other))
            }
        }
    }

    fn initialize(&self, params: &Value) -> Value {
        let version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);
        json!({
            "protocolVersion": version,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": self.name,
                "version": env!("CARGO_PKG_VERSION"),
            }
        })
    }

    fn call_tool(&self, params: &Value) -> Result<CreateOutcome, RpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("missing tool name"))?;
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        match self.tools.call(name, arguments) {
            Ok(outcome) => {
                log::info!(
                    "created {} ({} bytes, template {})",
                    outcome.path,
                    outcome.bytes,
                    outcome.template
                );
                Ok(outcome)
            }
            Err(e) => {
                log::warn!("{name} failed: {e}");
                Err(RpcError::from(&e))
            }
        }
    }
}
