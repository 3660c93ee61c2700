//! Configuration module for the Sentry CLI
//! Loads settings from `~/.claude/.env`, `./.env` and the process environment.
//!
//! Lookup order for every key (first hit wins):
//! 1. `./.env` (project-level)
//! 2. `~/.claude/.env` (user-level, shared by AI assistants)
//! 3. process environment
//!
//! An empty value (`KEY=`) is the same as no entry at all, so it never hides
//! a lower layer.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CliError, Result};
use crate::output::OutputFormat;

pub const ACCESS_TOKEN_KEY: &str = "SENTRY_ACCESS_TOKEN";
pub const HOST_KEY: &str = "SENTRY_HOST";
pub const DEFAULT_ORG_KEY: &str = "SENTRY_DEFAULT_ORG";
pub const DEFAULT_PROJECT_KEY: &str = "SENTRY_DEFAULT_PROJECT";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const SERVER_COMMAND_KEY: &str = "SENTRY_MCP_COMMAND";
pub const TIMEOUT_KEY: &str = "SENTRY_MCP_TIMEOUT";
pub const OUTPUT_FORMAT_KEY: &str = "OUTPUT_FORMAT";
pub const OUTPUT_COLOR_KEY: &str = "OUTPUT_COLOR";

/// Sentry SaaS host
pub const DEFAULT_HOST: &str = "sentry.io";

/// Default bound on a single request/response exchange
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// User-level env file, relative to the home directory
pub const USER_ENV_FILE: &str = ".claude/.env";

/// Project-level env file, relative to the working directory
pub const PROJECT_ENV_FILE: &str = ".env";

/// Settings for one CLI invocation
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub access_token: String,
    pub host: String,
    pub default_org: Option<String>,
    pub default_project: Option<String>,
    pub openai_api_key: Option<String>,
    /// Replaces the npx launcher when set (program followed by its args)
    pub server_command: Option<Vec<String>>,
    pub request_timeout: Duration,
    /// Format used when `--json` is not given
    pub output_format: OutputFormat,
    /// Forces colors on or off; `None` follows the terminal
    pub output_color: Option<bool>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("access_token", &"<redacted>")
            .field("host", &self.host)
            .field("default_org", &self.default_org)
            .field("default_project", &self.default_project)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("server_command", &self.server_command)
            .field("request_timeout", &self.request_timeout)
            .field("output_format", &self.output_format)
            .field("output_color", &self.output_color)
            .finish()
    }
}

impl Settings {
    /// Load settings from the real home directory, working directory and environment
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let home = dirs::home_dir();
        Self::load_from(home.as_deref(), &cwd, |key| std::env::var(key).ok())
    }

    /// Load settings from explicit locations
    ///
    /// `process_env` is consulted only for keys neither env file defines.
    pub fn load_from<F>(home: Option<&Path>, cwd: &Path, process_env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let files = merge_env_files(home, cwd)?;
        let lookup = |key: &str| -> Option<String> {
            files.get(key).cloned().or_else(|| {
                process_env(key)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
        };

        let access_token =
            lookup(ACCESS_TOKEN_KEY).ok_or_else(|| CliError::missing_key(ACCESS_TOKEN_KEY))?;

        let request_timeout = match lookup(TIMEOUT_KEY) {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| CliError::Configuration {
                    message: format!(
                        "{} must be a whole number of seconds, got '{}'",
                        TIMEOUT_KEY, raw
                    ),
                    key: Some(TIMEOUT_KEY.to_string()),
                })?;
                if secs == 0 {
                    return Err(CliError::Configuration {
                        message: format!("{} must be greater than zero", TIMEOUT_KEY),
                        key: Some(TIMEOUT_KEY.to_string()),
                    });
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let server_command = lookup(SERVER_COMMAND_KEY)
            .map(|raw| raw.split_whitespace().map(String::from).collect::<Vec<_>>())
            .filter(|parts| !parts.is_empty());

        let output_format = match lookup(OUTPUT_FORMAT_KEY) {
            Some(raw) => parse_output_format(&raw)?,
            None => OutputFormat::Text,
        };
        let output_color = lookup(OUTPUT_COLOR_KEY)
            .map(|raw| parse_switch(OUTPUT_COLOR_KEY, &raw))
            .transpose()?;

        Ok(Self {
            access_token,
            host: lookup(HOST_KEY).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            default_org: lookup(DEFAULT_ORG_KEY),
            default_project: lookup(DEFAULT_PROJECT_KEY),
            openai_api_key: lookup(OPENAI_API_KEY),
            server_command,
            request_timeout,
            output_format,
            output_color,
        })
    }

    /// Copy of these settings with the default organization replaced
    pub fn with_org(self, org: Option<String>) -> Self {
        match org {
            Some(org) => Self {
                default_org: Some(org),
                ..self
            },
            None => self,
        }
    }

    pub fn is_self_hosted(&self) -> bool {
        self.host != DEFAULT_HOST
    }

    pub fn has_ai_key(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

/// Env file locations in increasing precedence
pub fn env_file_paths(home: Option<&Path>, cwd: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(2);
    if let Some(home) = home {
        paths.push(home.join(USER_ENV_FILE));
    }
    paths.push(cwd.join(PROJECT_ENV_FILE));
    paths
}

/// Read both env files; later files override earlier ones
///
/// Values are trimmed and empty ones dropped.
pub fn merge_env_files(home: Option<&Path>, cwd: &Path) -> Result<HashMap<String, String>> {
    let mut merged = HashMap::new();
    for path in env_file_paths(home, cwd) {
        for (key, value) in read_env_file(&path)? {
            let value = value.trim();
            if !value.is_empty() {
                merged.insert(key, value.to_string());
            }
        }
    }
    Ok(merged)
}

fn parse_output_format(raw: &str) -> Result<OutputFormat> {
    match raw.to_ascii_lowercase().as_str() {
        "json" => Ok(OutputFormat::Json),
        "text" | "compact" | "table" => Ok(OutputFormat::Text),
        _ => Err(CliError::Configuration {
            message: format!("{} must be 'json' or 'text', got '{}'", OUTPUT_FORMAT_KEY, raw),
            key: Some(OUTPUT_FORMAT_KEY.to_string()),
        }),
    }
}

fn parse_switch(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CliError::Configuration {
            message: format!("{} must be true or false, got '{}'", key, raw),
            key: Some(key.to_string()),
        }),
    }
}

/// Parse a dotenv file; a missing file yields no entries
pub fn read_env_file(path: &Path) -> Result<Vec<(String, String)>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let iter = dotenvy::from_path_iter(path)
        .map_err(|e| CliError::config(format!("failed to read {}: {}", path.display(), e)))?;

    let mut entries = Vec::new();
    for item in iter {
        let (key, value) = item
            .map_err(|e| CliError::config(format!("failed to parse {}: {}", path.display(), e)))?;
        entries.push((key.to_ascii_uppercase(), value));
    }

    tracing::debug!(path = %path.display(), keys = entries.len(), "loaded env file");
    Ok(entries)
}
