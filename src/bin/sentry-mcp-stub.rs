//! Sentry MCP stub server
//! A stand-in for `@sentry/mcp-server` that answers over stdio without
//! touching Sentry. Used for offline runs and the integration tests.
//!
//! ## Usage
//!
//! ```bash
//! SENTRY_MCP_COMMAND=sentry-mcp-stub sentry list-tools
//! ```
//!
//! ## Behavior (environment variables)
//!
//! - `STUB_MODE` - `normal` (default), `mismatch` (wrong response ids),
//!   `silent` (never answers after `initialize`), `stubborn` (like `silent`,
//!   and ignores stdin EOF), `exit` (exits before reading anything),
//!   `garbage` (answers with invalid JSON after `initialize`), `mute` (never
//!   answers, not even `initialize`), `reject` (answers `initialize` with an
//!   error), `bare` (answers `initialize` with a non-object result)
//! - `STUB_TOOLS` - JSON file holding the `tools` array for `tools/list`
//! - `STUB_RESULT` - text returned by every `tools/call` (default: echo of the call)
//! - `STUB_TOOL_ERROR` - return this message with `isError: true`
//! - `STUB_RPC_ERROR` - answer `tools/call` with a JSON-RPC error
//! - `STUB_NOISE` - emit a log line and a notification before each response
//! - `STUB_SERVER_REQUEST` - before answering `tools/call`, send this method as
//!   a request of our own and return the client's reply as the call result
//! - `STUB_MARKER` - file created at startup
//! - `STUB_EXIT_MARKER` - file created on a clean shutdown

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

use sentry_cli::mcp::{JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
use sentry_cli::tools::CATALOG;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Mismatch,
    Silent,
    Stubborn,
    Exit,
    Garbage,
    Mute,
    Reject,
    Bare,
}

impl Mode {
    fn from_env() -> Self {
        match std::env::var("STUB_MODE").unwrap_or_default().as_str() {
            "mismatch" => Mode::Mismatch,
            "silent" => Mode::Silent,
            "stubborn" => Mode::Stubborn,
            "exit" => Mode::Exit,
            "garbage" => Mode::Garbage,
            "mute" => Mode::Mute,
            "reject" => Mode::Reject,
            "bare" => Mode::Bare,
            _ => Mode::Normal,
        }
    }
}

struct StubServer {
    mode: Mode,
    tools: Value,
    noise: bool,
}

impl StubServer {
    fn from_env() -> Result<Self> {
        let tools = match std::env::var("STUB_TOOLS") {
            Ok(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read STUB_TOOLS file: {}", path))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse STUB_TOOLS file: {}", path))?
            }
            Err(_) => default_tools(),
        };

        Ok(Self {
            mode: Mode::from_env(),
            tools,
            noise: std::env::var("STUB_NOISE").is_ok(),
        })
    }

    fn run(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let mut lines = BufReader::new(stdin.lock()).lines();

        while let Some(line) = lines.next() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(e) => {
                    let response =
                        JsonRpcResponse::error(None, -32700, &format!("Parse error: {}", e));
                    writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
                    stdout.flush()?;
                    continue;
                }
            };

            // notifications get no response
            let Some(id) = request.id.clone() else {
                continue;
            };

            if self.mode == Mode::Mute {
                continue;
            }

            if request.method != "initialize" {
                match self.mode {
                    Mode::Silent | Mode::Stubborn => continue,
                    Mode::Garbage => {
                        writeln!(stdout, "{{\"jsonrpc\": \"2.0\", \"id\": ")?;
                        stdout.flush()?;
                        continue;
                    }
                    _ => {}
                }
            }

            if self.noise {
                writeln!(stdout, "stub: handling {}", request.method)?;
                writeln!(
                    stdout,
                    "{}",
                    json!({
                        "jsonrpc": "2.0",
                        "method": "notifications/message",
                        "params": { "level": "info", "data": request.method }
                    })
                )?;
            }

            let id = if self.mode == Mode::Mismatch && request.method != "initialize" {
                json!(id.as_u64().unwrap_or(0) + 1000)
            } else {
                id
            };

            let response = match std::env::var("STUB_SERVER_REQUEST") {
                Ok(method) if request.method == "tools/call" => {
                    writeln!(
                        stdout,
                        "{}",
                        json!({ "jsonrpc": "2.0", "id": "stub-1", "method": method })
                    )?;
                    stdout.flush()?;
                    let reply = lines.next().transpose()?.unwrap_or_default();
                    JsonRpcResponse::success(
                        Some(id),
                        json!({ "content": [{ "type": "text", "text": reply.trim() }] }),
                    )
                }
                _ => self.handle_request(id, &request),
            };
            writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
            stdout.flush()?;
        }

        if self.mode == Mode::Stubborn {
            loop {
                std::thread::sleep(Duration::from_secs(60));
            }
        }

        if let Ok(path) = std::env::var("STUB_EXIT_MARKER") {
            std::fs::write(path, "exited")?;
        }
        Ok(())
    }

    fn handle_request(&self, id: Value, request: &JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" if self.mode == Mode::Reject => {
                JsonRpcResponse::error(Some(id), -32603, "server refused to initialize")
            }
            "initialize" if self.mode == Mode::Bare => {
                JsonRpcResponse::success(Some(id), json!("ready"))
            }
            "initialize" => JsonRpcResponse::success(
                Some(id),
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "serverInfo": {
                        "name": "sentry-mcp-stub",
                        "version": env!("CARGO_PKG_VERSION")
                    },
                    "capabilities": {
                        "tools": {}
                    }
                }),
            ),
            "tools/list" => JsonRpcResponse::success(Some(id), json!({ "tools": self.tools })),
            "tools/call" => self.handle_call_tool(id, &request.params),
            _ => JsonRpcResponse::error(
                Some(id),
                -32601,
                &format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_call_tool(&self, id: Value, params: &Value) -> JsonRpcResponse {
        if let Ok(message) = std::env::var("STUB_RPC_ERROR") {
            return JsonRpcResponse::error(Some(id), -32602, &message);
        }

        if let Ok(message) = std::env::var("STUB_TOOL_ERROR") {
            return JsonRpcResponse::success(
                Some(id),
                json!({
                    "content": [{ "type": "text", "text": message }],
                    "isError": true
                }),
            );
        }

        let text = std::env::var("STUB_RESULT").unwrap_or_else(|_| {
            json!({
                "tool": params.get("name").cloned().unwrap_or(Value::Null),
                "arguments": params.get("arguments").cloned().unwrap_or_else(|| json!({}))
            })
            .to_string()
        });

        JsonRpcResponse::success(
            Some(id),
            json!({
                "content": [{ "type": "text", "text": text }]
            }),
        )
    }
}

fn default_tools() -> Value {
    Value::Array(
        CATALOG
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.summary,
                    "inputSchema": { "type": "object", "properties": {} }
                })
            })
            .collect(),
    )
}

const USAGE: &str = "\
sentry-mcp-stub: offline test double for @sentry/mcp-server

This is not a real Sentry server. It answers MCP requests over stdio with
canned data so `sentry` can be exercised without npm or network access.

Usage: SENTRY_MCP_COMMAND=sentry-mcp-stub sentry <command>

Behavior is controlled with STUB_MODE, STUB_TOOLS, STUB_RESULT,
STUB_TOOL_ERROR, STUB_RPC_ERROR, STUB_NOISE, STUB_SERVER_REQUEST,
STUB_MARKER and STUB_EXIT_MARKER.";

fn main() {
    if std::env::args().skip(1).any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return;
    }

    if let Ok(path) = std::env::var("STUB_MARKER") {
        let _ = std::fs::write(path, "started");
    }

    if Mode::from_env() == Mode::Exit {
        std::process::exit(3);
    }

    let server = match StubServer::from_env() {
        Ok(server) => server,
        Err(e) => {
            eprintln!("MCP stub error: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        eprintln!("MCP stub error: {:#}", e);
        std::process::exit(1);
    }
}
