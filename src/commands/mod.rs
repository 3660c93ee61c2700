//! Command handlers
//!
//! Each tool subcommand validates its arguments, builds the parameter map for
//! its MCP tool and issues exactly one call. Settings arrive through
//! [`CommandContext`]; nothing here reads process-wide state.

pub mod issues;
pub mod organizations;
pub mod search;
pub mod tools;

use colored::Colorize;
use std::io::{self, IsTerminal, Write};

use crate::cli::Command;
use crate::config::{Settings, OPENAI_API_KEY};
use crate::error::{CliError, Result};
use crate::mcp::{
    CancelToken, Connector, ServerSpec, Timeouts, ToolCall, ToolDescriptor, ToolOutcome,
};
use crate::output::{self, OutputOptions};
use crate::tools::{self as catalog, ToolInfo};

/// Everything a handler needs from the invocation
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub settings: Settings,
    pub output: OutputOptions,
    /// Prompts allowed (no --no-interactive, no --json, stdin is a terminal)
    pub interactive: bool,
    pub cancel: CancelToken,
}

impl CommandContext {
    pub fn new(settings: Settings, output: OutputOptions) -> Self {
        Self {
            settings,
            output,
            interactive: false,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// A live session with the MCP server
pub trait ToolClient {
    fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>>;
    fn call_tool(&mut self, call: &ToolCall) -> Result<ToolOutcome>;
    fn close(&mut self) -> Result<()>;
}

impl ToolClient for Connector {
    fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        Connector::list_tools(self)
    }

    fn call_tool(&mut self, call: &ToolCall) -> Result<ToolOutcome> {
        Connector::call_tool(self, call)
    }

    fn close(&mut self) -> Result<()> {
        Connector::close(self).map(|_| ())
    }
}

/// Starts MCP sessions
pub trait Launch {
    fn launch(&self, ctx: &CommandContext) -> Result<Box<dyn ToolClient>>;
}

/// Launches the real server over stdio
#[derive(Debug, Clone, Copy, Default)]
pub struct StdioLauncher;

impl Launch for StdioLauncher {
    fn launch(&self, ctx: &CommandContext) -> Result<Box<dyn ToolClient>> {
        let mut connector = Connector::new(
            ServerSpec::from_settings(&ctx.settings),
            Timeouts::from_settings(&ctx.settings),
        )
        .with_cancel(ctx.cancel.clone())
        .inherit_stderr(ctx.output.verbose);

        connector.start()?;
        Ok(Box::new(connector))
    }
}

/// How a command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// The server reported a tool-level error
    ToolFailed,
    /// The user declined a confirmation prompt
    Aborted,
}

impl CommandStatus {
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandStatus::Success | CommandStatus::Aborted => 0,
            CommandStatus::ToolFailed => crate::error::EXIT_FAILURE,
        }
    }
}

/// A tool call ready to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCall {
    pub info: &'static ToolInfo,
    pub call: ToolCall,
}

/// Run one parsed command
pub fn run(command: Command, ctx: &CommandContext, launcher: &dyn Launch) -> Result<CommandStatus> {
    match command {
        Command::ListTools => tools::list_tools(ctx, launcher),
        Command::DescribeTool { tool } => tools::describe_tool(ctx, launcher, &tool),
        Command::ToolSchema { tool } => tools::tool_schema(ctx, launcher, &tool),
        command => {
            let confirmed = command.pre_confirmed();
            let prepared = prepare(command, &ctx.settings)?;
            invoke(ctx, launcher, prepared, confirmed)
        }
    }
}

/// Map a tool subcommand to its MCP call
///
/// AI-backed tools are checked for their key first so nothing else runs
/// without it.
pub fn prepare(command: Command, settings: &Settings) -> Result<PreparedCall> {
    let (tool, call) = match command {
        Command::ListTools | Command::DescribeTool { .. } | Command::ToolSchema { .. } => {
            return Err(CliError::invalid("not a tool command"))
        }
        Command::Whoami => ("whoami", organizations::whoami()),
        Command::FindOrganizations { query } => (
            "find_organizations",
            organizations::find_organizations(query),
        ),
        Command::FindTeams { query } => ("find_teams", organizations::find_teams(settings, query)?),
        Command::FindProjects { query } => (
            "find_projects",
            organizations::find_projects(settings, query)?,
        ),
        Command::FindReleases { project, query } => (
            "find_releases",
            organizations::find_releases(settings, project, query)?,
        ),
        Command::FindDsns { project } => {
            ("find_dsns", organizations::find_dsns(settings, project)?)
        }
        Command::GetIssueDetails { issue, event } => (
            "get_issue_details",
            issues::get_issue_details(settings, &issue, event)?,
        ),
        Command::GetTraceDetails { trace_id } => (
            "get_trace_details",
            issues::get_trace_details(settings, &trace_id)?,
        ),
        Command::GetEventAttachment {
            event_id,
            project,
            attachment,
        } => (
            "get_event_attachment",
            issues::get_event_attachment(settings, &event_id, project, attachment)?,
        ),
        Command::UpdateIssue {
            issue,
            status,
            assign_to,
            ..
        } => (
            "update_issue",
            issues::update_issue(settings, &issue, status, assign_to)?,
        ),
        Command::AnalyzeIssueWithSeer { issue, instruction } => (
            "analyze_issue_with_seer",
            issues::analyze_issue_with_seer(settings, &issue, instruction)?,
        ),
        Command::SearchEvents {
            query,
            project,
            limit,
            explain,
        } => {
            require_ai_key("search_events", settings)?;
            (
                "search_events",
                search::search_events(settings, &query, project, limit, explain)?,
            )
        }
        Command::SearchIssues {
            query,
            project,
            limit,
            explain,
        } => {
            require_ai_key("search_issues", settings)?;
            (
                "search_issues",
                search::search_issues(settings, &query, project, limit, explain)?,
            )
        }
        Command::SearchDocs {
            query,
            max_results,
            guide,
        } => ("search_docs", search::search_docs(&query, max_results, guide)?),
        Command::GetDoc { path } => ("get_doc", search::get_doc(&path)?),
        Command::CreateTeam { name, .. } => {
            ("create_team", organizations::create_team(settings, &name)?)
        }
        Command::CreateProject {
            name,
            team,
            platform,
            ..
        } => (
            "create_project",
            organizations::create_project(settings, &name, &team, platform)?,
        ),
        Command::UpdateProject {
            project,
            name,
            slug,
            platform,
            team,
            ..
        } => (
            "update_project",
            organizations::update_project(settings, project, name, slug, platform, team)?,
        ),
        Command::CreateDsn { name, project, .. } => (
            "create_dsn",
            organizations::create_dsn(settings, &name, project)?,
        ),
    };

    let info = catalog::lookup(tool)
        .ok_or_else(|| CliError::invalid(format!("unknown tool {}", tool)))?;
    Ok(PreparedCall { info, call })
}

/// Send a prepared call and print its result
pub fn invoke(
    ctx: &CommandContext,
    launcher: &dyn Launch,
    prepared: PreparedCall,
    confirmed: bool,
) -> Result<CommandStatus> {
    let PreparedCall { info, call } = prepared;

    if info.requires_ai {
        require_ai_key(info.name, &ctx.settings)?;
    }

    if info.mutating && !confirmed && ctx.interactive && !confirm(info, &call)? {
        if ctx.output.show_hints() {
            println!("{}", "Aborted".yellow());
        }
        return Ok(CommandStatus::Aborted);
    }

    let mut client = launcher.launch(ctx)?;
    let outcome = client.call_tool(&call);
    // release the server whether or not the call succeeded
    let closed = client.close();
    let outcome = outcome?;
    closed?;

    if outcome.success {
        let rendered = output::render_outcome(&outcome, ctx.output.format)?;
        if !rendered.is_empty() {
            println!("{}", rendered);
        }
        Ok(CommandStatus::Success)
    } else {
        let message = outcome.error.as_deref().unwrap_or("tool execution failed");
        eprintln!(
            "{}",
            output::render_tool_failure(info.name, message, ctx.output.format)?
        );
        Ok(CommandStatus::ToolFailed)
    }
}

/// Short-circuit AI-backed tools when no key is configured
pub fn require_ai_key(tool: &str, settings: &Settings) -> Result<()> {
    if settings.has_ai_key() {
        Ok(())
    } else {
        Err(CliError::MissingCredential {
            tool: tool.to_string(),
            key: OPENAI_API_KEY.to_string(),
        })
    }
}

fn confirm(info: &ToolInfo, call: &ToolCall) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(true);
    }

    println!("{} {}", "→".cyan(), info.summary);
    for (key, value) in &call.arguments {
        println!("  {} {}", format!("{}:", key).dimmed(), value);
    }
    print!("  Run {}? [y/N] ", info.command.cyan());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Organization slug from `--org` or SENTRY_DEFAULT_ORG
pub fn require_org(settings: &Settings) -> Result<String> {
    settings.default_org.clone().ok_or_else(|| {
        CliError::invalid("organization is required: pass --org <slug> or set SENTRY_DEFAULT_ORG")
    })
}

/// Explicit project, falling back to SENTRY_DEFAULT_PROJECT
pub fn project_or_default(settings: &Settings, project: Option<String>) -> Option<String> {
    project.or_else(|| settings.default_project.clone())
}

pub fn require_project(settings: &Settings, project: Option<String>) -> Result<String> {
    project_or_default(settings, project).ok_or_else(|| {
        CliError::invalid(
            "project is required: pass --project <slug> or set SENTRY_DEFAULT_PROJECT",
        )
    })
}

/// Reject blank positional values
pub fn non_empty(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CliError::invalid(format!("{} must not be empty", what)))
    } else {
        Ok(trimmed.to_string())
    }
}
