//! Stdio connector for the Sentry MCP server
//!
//! Owns the server child process and correlates each outgoing JSON-RPC request
//! with exactly one response line. Lifecycle:
//!
//! `Unstarted -> Spawning -> Handshaking -> Ready -> (Calling <-> Ready)* -> Closing -> Closed`
//!
//! `Closed` is terminal. Any failure that leaves the stream in an unknown
//! state (timeout, protocol violation, interrupt) closes the connector, and the
//! child is always reaped: gracefully when it exits after stdin is closed,
//! killed when it does not.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use wait_timeout::ChildExt;

use super::launch::ServerSpec;
use super::{
    parse_tool_list, JsonRpcRequest, JsonRpcResponse, ToolCall, ToolDescriptor, ToolOutcome,
    CLIENT_NAME, PROTOCOL_VERSION,
};
use crate::config::Settings;
use crate::error::{CliError, Result};

/// Default time allowed for the server to start and answer `initialize`
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(60);

/// Time the child gets to exit after stdin is closed before it is killed
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// How often a pending wait re-checks the cancel token
const POLL_SLICE: Duration = Duration::from_millis(100);

/// How long a failed handshake waits to tell a crashed server from a broken one
const STARTUP_EXIT_WAIT: Duration = Duration::from_millis(500);

/// Upper bound on `tools/list` pages followed
const MAX_LIST_PAGES: usize = 32;

/// JSON-RPC "method not found"
const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorState {
    Unstarted,
    Spawning,
    Handshaking,
    Ready,
    Calling,
    Closing,
    Closed,
}

/// Bounded waits used by the connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub handshake: Duration,
    pub request: Duration,
    pub grace: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            handshake: DEFAULT_HANDSHAKE_TIMEOUT,
            request: crate::config::DEFAULT_REQUEST_TIMEOUT,
            grace: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl Timeouts {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            handshake: settings.request_timeout.max(DEFAULT_HANDSHAKE_TIMEOUT),
            request: settings.request_timeout,
            grace: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Shared flag set when the user interrupts the invocation
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Message from the stdout reader thread
enum Incoming {
    Line(String),
    Eof,
    Failed(std::io::Error),
}

pub struct Connector {
    spec: ServerSpec,
    timeouts: Timeouts,
    cancel: CancelToken,
    inherit_stderr: bool,
    state: ConnectorState,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    incoming: Option<Receiver<Incoming>>,
    next_id: u64,
}

impl Connector {
    pub fn new(spec: ServerSpec, timeouts: Timeouts) -> Self {
        Self {
            spec,
            timeouts,
            cancel: CancelToken::new(),
            inherit_stderr: false,
            state: ConnectorState::Unstarted,
            child: None,
            stdin: None,
            incoming: None,
            next_id: 0,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Pass the server's stderr through instead of discarding it
    pub fn inherit_stderr(mut self, inherit: bool) -> Self {
        self.inherit_stderr = inherit;
        self
    }

    pub fn state(&self) -> ConnectorState {
        self.state
    }

    /// Spawn the server and complete the MCP handshake
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            ConnectorState::Unstarted => {}
            ConnectorState::Ready => return Ok(()),
            ConnectorState::Closing | ConnectorState::Closed => {
                return Err(CliError::ConnectorClosed)
            }
            other => {
                return Err(CliError::Protocol(format!(
                    "cannot start connector in state {:?}",
                    other
                )))
            }
        }

        self.state = ConnectorState::Spawning;
        if let Err(e) = self.spawn() {
            self.shutdown();
            return Err(e);
        }

        self.state = ConnectorState::Handshaking;
        if let Err(e) = self.handshake() {
            let e = self.classify_handshake_failure(e);
            self.shutdown();
            return Err(e);
        }

        self.state = ConnectorState::Ready;
        tracing::debug!("MCP session ready");
        Ok(())
    }

    fn spawn(&mut self) -> Result<()> {
        let program = self.spec.resolve_program()?;
        tracing::debug!(command = %self.spec.display(), "starting MCP server");

        let stderr = if self.inherit_stderr {
            Stdio::inherit()
        } else {
            Stdio::null()
        };

        let mut child = Command::new(&program)
            .args(&self.spec.args)
            .envs(self.spec.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(stderr)
            .spawn()
            .map_err(|e| CliError::ServerLaunch {
                program: self.spec.program.clone(),
                reason: e.to_string(),
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        self.child = Some(child);

        let (stdin, stdout) = match (stdin, stdout) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                return Err(CliError::ServerLaunch {
                    program: self.spec.program.clone(),
                    reason: "stdio pipes were not created".to_string(),
                })
            }
        };

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("mcp-stdout".to_string())
            .spawn(move || {
                let mut reader = BufReader::new(stdout);
                loop {
                    let mut line = String::new();
                    let msg = match reader.read_line(&mut line) {
                        Ok(0) => Incoming::Eof,
                        Ok(_) => Incoming::Line(line),
                        Err(e) => Incoming::Failed(e),
                    };
                    let done = !matches!(msg, Incoming::Line(_));
                    if tx.send(msg).is_err() || done {
                        break;
                    }
                }
            })?;

        self.stdin = Some(stdin);
        self.incoming = Some(rx);

        if let Some(status) = self.child_exit_status() {
            return Err(CliError::ServerLaunch {
                program: self.spec.program.clone(),
                reason: format!("exited immediately with {}", status),
            });
        }

        Ok(())
    }

    fn handshake(&mut self) -> Result<()> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        });

        let result = self.exchange("initialize", params, self.timeouts.handshake)?;
        if !result.is_object() {
            return Err(CliError::Handshake(
                "initialize returned a non-object result".to_string(),
            ));
        }
        let server = result
            .pointer("/serverInfo/name")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        let protocol = result
            .get("protocolVersion")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        tracing::debug!(server, protocol, "initialized");

        self.send(&JsonRpcRequest::notification(
            "notifications/initialized",
            Value::Null,
        ))
    }

    fn classify_handshake_failure(&mut self, err: CliError) -> CliError {
        match err {
            CliError::Interrupted | CliError::Handshake(_) | CliError::ServerLaunch { .. } => err,
            other => {
                if let Some(status) = self.child_exit_status_within(STARTUP_EXIT_WAIT) {
                    CliError::ServerLaunch {
                        program: self.spec.program.clone(),
                        reason: format!("exited during startup with {}", status),
                    }
                } else {
                    CliError::Handshake(other.to_string())
                }
            }
        }
    }

    /// List every tool the server exposes, following pagination
    pub fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let params = match cursor {
                Some(ref c) => json!({ "cursor": c }),
                None => json!({}),
            };
            let result = self.request("tools/list", params)?;
            let (page, next) = parse_tool_list(&result)
                .map_err(|e| CliError::Protocol(format!("malformed tools/list result: {}", e)))?;
            tools.extend(page);
            match next {
                Some(next) => cursor = Some(next),
                None => return Ok(tools),
            }
        }

        Err(CliError::Protocol(format!(
            "tools/list did not finish after {} pages",
            MAX_LIST_PAGES
        )))
    }

    /// Invoke one tool
    pub fn call_tool(&mut self, call: &ToolCall) -> Result<ToolOutcome> {
        tracing::debug!(tool = %call.name, "calling tool");
        let result = self.request("tools/call", call.to_params())?;
        Ok(ToolOutcome::from_result(&result))
    }

    /// One request/response exchange with the request timeout
    pub fn request(&mut self, method: &str, params: Value) -> Result<Value> {
        match self.state {
            ConnectorState::Closing | ConnectorState::Closed => {
                return Err(CliError::ConnectorClosed)
            }
            ConnectorState::Unstarted => self.start()?,
            _ => {}
        }

        self.state = ConnectorState::Calling;
        match self.exchange(method, params, self.timeouts.request) {
            Ok(result) => {
                self.state = ConnectorState::Ready;
                Ok(result)
            }
            // the exchange itself completed; the stream is still in sync
            Err(e @ CliError::Server { .. }) => {
                self.state = ConnectorState::Ready;
                Err(e)
            }
            Err(e) => {
                self.shutdown();
                Err(e)
            }
        }
    }

    fn exchange(&mut self, method: &str, params: Value, timeout: Duration) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;
        self.send(&JsonRpcRequest::new(id, method, params))?;

        let response = self.await_response(id, method, timeout)?;
        if let Some(err) = response.error {
            return Err(CliError::Server {
                code: err.code,
                message: err.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    fn send(&mut self, request: &JsonRpcRequest) -> Result<()> {
        let line = serde_json::to_string(request)?;
        write_line(&mut self.stdin, &request.method, &line)
    }

    fn await_response(
        &mut self,
        id: u64,
        method: &str,
        timeout: Duration,
    ) -> Result<JsonRpcResponse> {
        let deadline = Instant::now() + timeout;
        let incoming = self.incoming.as_ref().ok_or(CliError::ConnectorClosed)?;

        loop {
            if self.cancel.is_cancelled() {
                return Err(CliError::Interrupted);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(CliError::Timeout {
                    method: method.to_string(),
                    after: timeout,
                });
            }

            let line = match incoming.recv_timeout(remaining.min(POLL_SLICE)) {
                Ok(Incoming::Line(line)) => line,
                Ok(Incoming::Failed(e)) => {
                    return Err(CliError::Protocol(format!("failed to read server output: {}", e)))
                }
                Ok(Incoming::Eof) | Err(RecvTimeoutError::Disconnected) => {
                    return Err(CliError::Protocol(format!(
                        "server closed its output before answering `{}`",
                        method
                    )))
                }
                Err(RecvTimeoutError::Timeout) => continue,
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if !line.starts_with('{') {
                tracing::debug!(line, "ignoring non-JSON server output");
                continue;
            }

            let message: Value = serde_json::from_str(line)
                .map_err(|e| CliError::Protocol(format!("invalid JSON from server: {}", e)))?;

            let is_response = message.get("result").is_some() || message.get("error").is_some();
            if !is_response && message.get("method").is_some() {
                let server_method = message
                    .get("method")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                match message.get("id").filter(|v| !v.is_null()) {
                    Some(request_id) => {
                        tracing::debug!(method = server_method, "answering server request");
                        let reply = reply_to_server(request_id.clone(), server_method);
                        let line = serde_json::to_string(&reply)?;
                        write_line(&mut self.stdin, server_method, &line)?;
                    }
                    None => {
                        tracing::debug!(method = server_method, "ignoring server notification")
                    }
                }
                continue;
            }

            let got = message.get("id").cloned();
            return match got {
                Some(ref got) if got.as_u64() == Some(id) => serde_json::from_value(message)
                    .map_err(|e| CliError::Protocol(format!("malformed response: {}", e))),
                Some(ref got) if !got.is_null() => Err(CliError::Protocol(format!(
                    "response id {} does not match request id {}",
                    got, id
                ))),
                _ => Err(CliError::Protocol(format!(
                    "response to `{}` has no id",
                    method
                ))),
            };
        }
    }

    fn child_exit_status(&mut self) -> Option<ExitStatus> {
        self.child.as_mut().and_then(|c| c.try_wait().ok().flatten())
    }

    fn child_exit_status_within(&mut self, wait: Duration) -> Option<ExitStatus> {
        self.child
            .as_mut()
            .and_then(|c| c.wait_timeout(wait).ok().flatten())
    }

    /// Close the session and reap the server
    ///
    /// Returns the server's exit status, or `None` when no process was running
    /// or it had to be killed.
    pub fn close(&mut self) -> Result<Option<ExitStatus>> {
        Ok(self.shutdown())
    }

    fn shutdown(&mut self) -> Option<ExitStatus> {
        if self.state == ConnectorState::Closed {
            return None;
        }
        self.state = ConnectorState::Closing;

        // EOF on stdin is the MCP stdio shutdown signal
        drop(self.stdin.take());
        self.incoming = None;

        let status = self.child.take().and_then(|mut child| {
            match child.wait_timeout(self.timeouts.grace) {
                Ok(Some(status)) => {
                    tracing::debug!(%status, "MCP server exited");
                    Some(status)
                }
                Ok(None) | Err(_) => {
                    tracing::warn!(
                        "MCP server did not exit within {:?}; killing it",
                        self.timeouts.grace
                    );
                    let _ = child.kill();
                    let _ = child.wait();
                    None
                }
            }
        });

        self.state = ConnectorState::Closed;
        status
    }
}

/// Reply to a request the server sent us
///
/// Only `ping` is supported; anything else gets "method not found" so the
/// server does not wait on us.
fn reply_to_server(id: Value, method: &str) -> JsonRpcResponse {
    if method == "ping" {
        JsonRpcResponse::success(Some(id), json!({}))
    } else {
        JsonRpcResponse::error(
            Some(id),
            METHOD_NOT_FOUND,
            &format!("Method not found: {}", method),
        )
    }
}

fn write_line(stdin: &mut Option<ChildStdin>, method: &str, line: &str) -> Result<()> {
    let stdin = stdin.as_mut().ok_or(CliError::ConnectorClosed)?;
    writeln!(stdin, "{}", line)
        .and_then(|_| stdin.flush())
        .map_err(|e| CliError::Protocol(format!("failed to write `{}`: {}", method, e)))
}

impl Drop for Connector {
    fn drop(&mut self) {
        self.shutdown();
    }
}
