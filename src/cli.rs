//! Command-line definition

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::output::{OutputFormat, OutputOptions};

/// Sentry - lightweight CLI for the Sentry MCP server
/// Relays commands to `@sentry/mcp-server` with token-efficient output for AI assistants.
#[derive(Debug, Parser)]
#[command(name = "sentry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Output as JSON (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase output verbosity (shows server stderr and debug logs)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    /// Organization slug (overrides SENTRY_DEFAULT_ORG)
    #[arg(long, global = true, value_name = "SLUG")]
    pub org: Option<String>,
}

impl GlobalArgs {
    /// Output options, with `default_format` used unless `--json` is given
    pub fn output(&self, default_format: OutputFormat) -> OutputOptions {
        let format = if self.json {
            OutputFormat::Json
        } else {
            default_format
        };
        OutputOptions {
            format,
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IssueStatus {
    Resolved,
    ResolvedInNextRelease,
    Unresolved,
    Ignored,
}

impl IssueStatus {
    /// Value expected by the server
    pub fn as_api_str(&self) -> &'static str {
        match self {
            IssueStatus::Resolved => "resolved",
            IssueStatus::ResolvedInNextRelease => "resolvedInNextRelease",
            IssueStatus::Unresolved => "unresolved",
            IssueStatus::Ignored => "ignored",
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List available tools (name and one-line description)
    ListTools,

    /// Describe a tool: parameters and an example invocation
    DescribeTool {
        /// Tool name (e.g. get-issue-details or get_issue_details)
        tool: String,
    },

    /// Print a tool's complete input schema
    ToolSchema {
        /// Tool name (e.g. get-issue-details or get_issue_details)
        tool: String,
    },

    /// Identify the authenticated user
    Whoami,

    /// Find organizations you can access
    FindOrganizations {
        /// Filter by name or slug
        #[arg(long)]
        query: Option<String>,
    },

    /// Find teams in an organization
    FindTeams {
        /// Filter by name or slug
        #[arg(long)]
        query: Option<String>,
    },

    /// Find projects in an organization
    FindProjects {
        /// Filter by name or slug
        #[arg(long)]
        query: Option<String>,
    },

    /// Find releases in an organization
    FindReleases {
        /// Project slug (defaults to SENTRY_DEFAULT_PROJECT)
        #[arg(long)]
        project: Option<String>,

        /// Filter by version
        #[arg(long)]
        query: Option<String>,
    },

    /// List client keys (DSNs) of a project
    FindDsns {
        /// Project slug (defaults to SENTRY_DEFAULT_PROJECT)
        #[arg(long)]
        project: Option<String>,
    },

    /// Get details of an issue
    GetIssueDetails {
        /// Issue short id (PROJ-123), numeric id, or issue URL
        issue: String,

        /// Show this event instead of the latest one
        #[arg(long)]
        event: Option<String>,
    },

    /// Get an overview of a trace
    GetTraceDetails {
        /// Trace id (32 hex characters)
        trace_id: String,
    },

    /// Download or list attachments of an event
    GetEventAttachment {
        /// Event id
        event_id: String,

        /// Project slug (defaults to SENTRY_DEFAULT_PROJECT)
        #[arg(long)]
        project: Option<String>,

        /// Attachment id (lists attachments when omitted)
        #[arg(long)]
        attachment: Option<String>,
    },

    /// Change an issue's status or assignee
    UpdateIssue {
        /// Issue short id, numeric id, or issue URL
        issue: String,

        /// New status
        #[arg(long, value_enum)]
        status: Option<IssueStatus>,

        /// Assignee (user:<id>, team:<slug>, or an email)
        #[arg(long)]
        assign_to: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Root-cause analysis of an issue with Seer
    AnalyzeIssueWithSeer {
        /// Issue short id, numeric id, or issue URL
        issue: String,

        /// Extra instruction for the analysis
        #[arg(long)]
        instruction: Option<String>,
    },

    /// Search events with a natural-language query (needs OPENAI_API_KEY)
    SearchEvents {
        /// What to look for, in plain language
        query: String,

        /// Project slug (defaults to SENTRY_DEFAULT_PROJECT)
        #[arg(long)]
        project: Option<String>,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<u32>,

        /// Include the generated query and its explanation
        #[arg(long)]
        explain: bool,
    },

    /// Search issues with a natural-language query (needs OPENAI_API_KEY)
    SearchIssues {
        /// What to look for, in plain language
        query: String,

        /// Project slug or id (defaults to SENTRY_DEFAULT_PROJECT)
        #[arg(long)]
        project: Option<String>,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<u32>,

        /// Include the generated query and its explanation
        #[arg(long)]
        explain: bool,
    },

    /// Search Sentry documentation
    SearchDocs {
        /// Search terms
        query: String,

        /// Maximum number of results
        #[arg(long)]
        max_results: Option<u32>,

        /// Restrict to a platform guide (e.g. javascript, python/django)
        #[arg(long)]
        guide: Option<String>,
    },

    /// Fetch a Sentry documentation page
    GetDoc {
        /// Page path ending in .md (from search-docs results)
        path: String,
    },

    /// Create a team
    CreateTeam {
        /// Team name
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Create a project
    CreateProject {
        /// Project name
        name: String,

        /// Owning team slug
        #[arg(long)]
        team: String,

        /// Platform (e.g. javascript, python)
        #[arg(long)]
        platform: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Update a project's settings
    UpdateProject {
        /// Project slug (defaults to SENTRY_DEFAULT_PROJECT)
        #[arg(long)]
        project: Option<String>,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New slug
        #[arg(long)]
        slug: Option<String>,

        /// New platform
        #[arg(long)]
        platform: Option<String>,

        /// Assign the project to this team
        #[arg(long)]
        team: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Create a client key (DSN) for a project
    CreateDsn {
        /// Key name
        name: String,

        /// Project slug (defaults to SENTRY_DEFAULT_PROJECT)
        #[arg(long)]
        project: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl Command {
    /// Whether the user already approved a mutating command
    pub fn pre_confirmed(&self) -> bool {
        match self {
            Command::UpdateIssue { yes, .. }
            | Command::CreateTeam { yes, .. }
            | Command::CreateProject { yes, .. }
            | Command::UpdateProject { yes, .. }
            | Command::CreateDsn { yes, .. } => *yes,
            _ => false,
        }
    }
}
