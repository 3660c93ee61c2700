//! Error taxonomy for the Sentry CLI
//! Every failure a command can surface maps to one variant here, with a stable
//! kind name, an exit code and remediation text.

use std::time::Duration;
use thiserror::Error;

/// Exit code for failed tool calls and connector failures
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for invalid command-line arguments
pub const EXIT_USAGE: i32 = 2;

/// Exit code for missing or invalid configuration
pub const EXIT_CONFIG: i32 = 3;

/// Exit code after a user interrupt (128 + SIGINT)
pub const EXIT_INTERRUPTED: i32 = 130;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// A required setting is missing or invalid
    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        key: Option<String>,
    },

    /// The MCP server could not be started
    #[error("failed to launch MCP server `{program}`: {reason}")]
    ServerLaunch { program: String, reason: String },

    /// The MCP session setup failed
    #[error("MCP handshake failed: {0}")]
    Handshake(String),

    /// The server answered with something we cannot correlate or parse
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No response arrived within the bounded wait
    #[error("timed out after {}s waiting for `{method}`", .after.as_secs_f32())]
    Timeout { method: String, after: Duration },

    /// A call was attempted on a connector that has already shut down
    #[error("connector is closed; start a new session")]
    ConnectorClosed,

    /// An AI-backed tool was invoked without its API key
    #[error("{tool} requires {key}")]
    MissingCredential { tool: String, key: String },

    /// A required command-line argument is missing or malformed
    #[error("{0}")]
    InvalidArgument(String),

    /// JSON-RPC error object returned by the server, passed through verbatim
    #[error("{message}")]
    Server { code: i64, message: String },

    /// The invocation was cancelled by the user
    #[error("interrupted")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn config(message: impl Into<String>) -> Self {
        CliError::Configuration {
            message: message.into(),
            key: None,
        }
    }

    pub fn missing_key(key: &str) -> Self {
        CliError::Configuration {
            message: format!("{} is not set", key),
            key: Some(key.to_string()),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        CliError::InvalidArgument(message.into())
    }

    /// Stable snake_case name used in JSON error output
    pub fn kind(&self) -> &'static str {
        match self {
            CliError::Configuration { .. } => "configuration_error",
            CliError::ServerLaunch { .. } => "server_launch_error",
            CliError::Handshake(_) => "handshake_error",
            CliError::Protocol(_) => "protocol_error",
            CliError::Timeout { .. } => "timeout_error",
            CliError::ConnectorClosed => "connector_closed_error",
            CliError::MissingCredential { .. } => "missing_credential_error",
            CliError::InvalidArgument(_) => "invalid_argument",
            CliError::Server { .. } => "server_error",
            CliError::Interrupted => "interrupted",
            CliError::Io(_) => "io_error",
            CliError::Json(_) => "json_error",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Configuration { .. } | CliError::MissingCredential { .. } => EXIT_CONFIG,
            CliError::InvalidArgument(_) => EXIT_USAGE,
            CliError::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        }
    }

    /// Remediation text shown under the error message
    pub fn hint(&self) -> Option<String> {
        match self {
            CliError::Configuration { key: Some(key), .. } => Some(format!(
                "Add {}=<value> to ~/.claude/.env or ./.env, or export it in your shell.",
                key
            )),
            CliError::Configuration { key: None, .. } => {
                Some("Check ~/.claude/.env and ./.env for typos.".to_string())
            }
            CliError::ServerLaunch { .. } => Some(concat!(
                "Install Node.js (npx must be on PATH) ",
                "or point SENTRY_MCP_COMMAND at a server binary."
            )
            .to_string()),
            CliError::Handshake(_) => Some(concat!(
                "Run with --verbose to see the server's stderr; ",
                "check SENTRY_ACCESS_TOKEN and SENTRY_HOST."
            )
            .to_string()),
            CliError::Timeout { .. } => Some(
                "Raise SENTRY_MCP_TIMEOUT (seconds) if the Sentry instance is slow.".to_string(),
            ),
            CliError::MissingCredential { key, .. } => Some(format!(
                "1. Create an API key at https://platform.openai.com/api-keys\n\
                 2. Add {}=<key> to ~/.claude/.env or ./.env\n\
                 3. Re-run the command",
                key
            )),
            CliError::InvalidArgument(_) => Some("Run with --help for usage.".to_string()),
            _ => None,
        }
    }
}
