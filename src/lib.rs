//! Sentry MCP CLI
//! A thin command-line front-end for `@sentry/mcp-server`. Commands are relayed
//! as MCP tool calls over the server's stdio, and results are printed either
//! compactly or as JSON for AI assistants.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod mcp;
pub mod output;
pub mod tools;

// Re-export main types for convenience
pub use cli::{Cli, Command, GlobalArgs};
pub use commands::{CommandContext, CommandStatus, Launch, StdioLauncher, ToolClient};
pub use config::Settings;
pub use error::{CliError, Result};
pub use mcp::{
    CancelToken, Connector, ConnectorState, ServerSpec, Timeouts, ToolCall, ToolDescriptor,
    ToolOutcome,
};
pub use output::{OutputFormat, OutputOptions};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
