//! Command line for the Sentry MCP server process

use std::path::PathBuf;

use crate::config::Settings;
use crate::error::{CliError, Result};

/// Package runner used when no override is configured
pub const DEFAULT_RUNNER: &str = "npx";

/// npm package providing the server
pub const SERVER_PACKAGE: &str = "@sentry/mcp-server@latest";

/// How to start the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl ServerSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Server command for these settings
    ///
    /// `SENTRY_MCP_COMMAND` replaces program and leading args; credentials are
    /// always appended so custom launchers receive them too.
    pub fn from_settings(settings: &Settings) -> Self {
        let command = settings.server_command.as_deref().and_then(<[String]>::split_first);
        let (program, mut args) = match command {
            Some((program, rest)) => (program.clone(), rest.to_vec()),
            None => (
                DEFAULT_RUNNER.to_string(),
                vec!["-y".to_string(), SERVER_PACKAGE.to_string()],
            ),
        };

        args.push("--access-token".to_string());
        args.push(settings.access_token.clone());
        if settings.is_self_hosted() {
            args.push("--host".to_string());
            args.push(settings.host.clone());
        }

        let mut env = vec![("SENTRY_HOST".to_string(), settings.host.clone())];
        if let Some(ref key) = settings.openai_api_key {
            env.push(("OPENAI_API_KEY".to_string(), key.clone()));
        }

        Self { program, args, env }
    }

    /// Locate the executable on PATH
    pub fn resolve_program(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|e| CliError::ServerLaunch {
            program: self.program.clone(),
            reason: e.to_string(),
        })
    }

    /// Command line with the access token masked, for logs
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        let mut mask_next = false;
        for arg in &self.args {
            if mask_next {
                parts.push("***".to_string());
                mask_next = false;
            } else {
                mask_next = arg == "--access-token";
                parts.push(arg.clone());
            }
        }
        parts.join(" ")
    }
}
