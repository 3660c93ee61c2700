//! MCP client plumbing
//! JSON-RPC 2.0 message types, tool descriptors and results exchanged with the
//! Sentry MCP server over stdio.

pub mod connector;
pub mod launch;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use connector::{CancelToken, Connector, ConnectorState, Timeouts};
pub use launch::ServerSpec;

/// MCP protocol revision announced during `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Client name announced during `initialize`
pub const CLIENT_NAME: &str = "sentry-cli";

/// JSON-RPC request structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(Value::from(id)),
            method: method.to_string(),
            params,
        }
    }

    /// A request without an id; the server sends no response
    pub fn notification(method: &str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i64, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.to_string(),
                data: None,
            }),
        }
    }
}

/// JSON-RPC error structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Tool metadata as advertised by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default = "empty_schema")]
    pub input_schema: Value,
}

fn empty_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl ToolDescriptor {
    /// First non-empty line of the description
    pub fn summary(&self) -> &str {
        self.description
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
    }
}

/// A single `tools/call` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            arguments: Map::new(),
        }
    }

    /// Set a parameter
    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }

    /// Set a parameter only when a value is present
    pub fn opt_arg<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.arguments.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn to_params(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "arguments": Value::Object(self.arguments.clone()),
        })
    }
}

/// Result of a `tools/call`, as reported by the server
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub success: bool,
    /// Structured payload, or the text content when the server sent plain text
    pub payload: Value,
    /// Text content blocks in server order
    pub text: Vec<String>,
    pub error: Option<String>,
}

impl ToolOutcome {
    /// Interpret an MCP `CallToolResult`
    ///
    /// `structuredContent` wins; otherwise a single text block holding JSON is
    /// decoded, and anything else is kept as text.
    pub fn from_result(result: &Value) -> Self {
        let is_error = result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let text: Vec<String> = result
            .get("content")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|b| b.get("text").and_then(Value::as_str))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let payload = if let Some(structured) = result.get("structuredContent") {
            structured.clone()
        } else if let [only] = text.as_slice() {
            serde_json::from_str::<Value>(only.trim())
                .ok()
                .filter(|v| v.is_object() || v.is_array())
                .unwrap_or_else(|| Value::String(only.clone()))
        } else if text.is_empty() {
            result.get("content").cloned().unwrap_or(Value::Null)
        } else {
            Value::String(text.join("\n"))
        };

        let error = if is_error {
            Some(if text.is_empty() {
                "tool execution failed".to_string()
            } else {
                text.join("\n")
            })
        } else {
            None
        };

        Self {
            success: !is_error,
            payload,
            text,
            error,
        }
    }
}

/// Extract the tool list (and pagination cursor) from a `tools/list` result
pub fn parse_tool_list(
    result: &Value,
) -> Result<(Vec<ToolDescriptor>, Option<String>), serde_json::Error> {
    let tools = match result.get("tools") {
        Some(tools) => serde_json::from_value(tools.clone())?,
        None => Vec::new(),
    };
    let cursor = result
        .get("nextCursor")
        .and_then(Value::as_str)
        .map(String::from);
    Ok((tools, cursor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_on_one_line() {
        let call = ToolCall::new("find_projects").arg("organizationSlug", "acme");
        let request = JsonRpcRequest::new(7, "tools/call", call.to_params());
        let line = serde_json::to_string(&request).unwrap();

        assert!(!line.contains('\n'));
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["id"], 7);
        assert_eq!(parsed["params"]["name"], "find_projects");
        assert_eq!(parsed["params"]["arguments"]["organizationSlug"], "acme");
    }

    #[test]
    fn test_notification_has_no_id() {
        let n = JsonRpcRequest::notification("notifications/initialized", Value::Null);
        let parsed: Value = serde_json::to_value(&n).unwrap();
        assert!(parsed.get("id").is_none());
        assert!(parsed.get("params").is_none());
    }

    #[test]
    fn test_outcome_decodes_json_text_block() {
        let outcome = ToolOutcome::from_result(&json!({
            "content": [{ "type": "text", "text": "{\"id\":\"PROJ-123\",\"title\":\"X\"}" }]
        }));
        assert!(outcome.success);
        assert_eq!(outcome.payload, json!({ "id": "PROJ-123", "title": "X" }));
    }

    #[test]
    fn test_outcome_keeps_markdown_as_text() {
        let outcome = ToolOutcome::from_result(&json!({
            "content": [{ "type": "text", "text": "# Issue PROJ-1\nSomething broke" }]
        }));
        assert_eq!(outcome.payload, json!("# Issue PROJ-1\nSomething broke"));
        assert_eq!(outcome.text.len(), 1);
    }

    #[test]
    fn test_outcome_prefers_structured_content() {
        let outcome = ToolOutcome::from_result(&json!({
            "content": [{ "type": "text", "text": "ignored" }],
            "structuredContent": { "count": 2 }
        }));
        assert_eq!(outcome.payload, json!({ "count": 2 }));
    }

    #[test]
    fn test_outcome_error_keeps_server_message() {
        let outcome = ToolOutcome::from_result(&json!({
            "isError": true,
            "content": [{ "type": "text", "text": "Organization not found" }]
        }));
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Organization not found"));
    }

    #[test]
    fn test_summary_uses_first_line() {
        let tool = ToolDescriptor {
            name: "whoami".into(),
            description: "\nIdentify the authenticated user.\n\nUse this first.".into(),
            input_schema: empty_schema(),
        };
        assert_eq!(tool.summary(), "Identify the authenticated user.");
    }

    #[test]
    fn test_parse_tool_list_with_cursor() {
        let (tools, cursor) = parse_tool_list(&json!({
            "tools": [{ "name": "whoami", "description": "Who am I" }],
            "nextCursor": "page-2"
        }))
        .unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].input_schema["type"], "object");
        assert_eq!(cursor.as_deref(), Some("page-2"));
    }
}
