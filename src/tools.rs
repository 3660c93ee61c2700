//! Catalog of the Sentry MCP tools this CLI exposes as subcommands

/// Static metadata for one supported tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolInfo {
    /// Subcommand name
    pub command: &'static str,
    /// Tool name on the MCP server
    pub name: &'static str,
    pub summary: &'static str,
    /// Example invocation shown by `describe-tool`
    pub example: &'static str,
    /// Needs OPENAI_API_KEY on the server side
    pub requires_ai: bool,
    /// Changes data in Sentry
    pub mutating: bool,
}

const fn tool(
    command: &'static str,
    name: &'static str,
    summary: &'static str,
    example: &'static str,
) -> ToolInfo {
    ToolInfo {
        command,
        name,
        summary,
        example,
        requires_ai: false,
        mutating: false,
    }
}

const fn ai(info: ToolInfo) -> ToolInfo {
    ToolInfo {
        requires_ai: true,
        ..info
    }
}

const fn mutating(info: ToolInfo) -> ToolInfo {
    ToolInfo {
        mutating: true,
        ..info
    }
}

pub const CATALOG: &[ToolInfo] = &[
    tool(
        "whoami",
        "whoami",
        "Identify the authenticated Sentry user",
        "sentry whoami",
    ),
    tool(
        "find-organizations",
        "find_organizations",
        "Find organizations the user can access",
        "sentry find-organizations --query acme",
    ),
    tool(
        "find-teams",
        "find_teams",
        "Find teams in an organization",
        "sentry find-teams --org my-org",
    ),
    tool(
        "find-projects",
        "find_projects",
        "Find projects in an organization",
        "sentry find-projects --org my-org --query web",
    ),
    tool(
        "find-releases",
        "find_releases",
        "Find releases in an organization",
        "sentry find-releases --org my-org --project web --query 1.2",
    ),
    tool(
        "find-dsns",
        "find_dsns",
        "List client keys (DSNs) of a project",
        "sentry find-dsns --org my-org --project web",
    ),
    tool(
        "get-issue-details",
        "get_issue_details",
        "Get details of an issue",
        "sentry get-issue-details PROJ-123 --org my-org",
    ),
    tool(
        "get-trace-details",
        "get_trace_details",
        "Get an overview of a trace",
        "sentry get-trace-details a4d1aae7216b47ff8117cf4e09ce9d0a --org my-org",
    ),
    tool(
        "get-event-attachment",
        "get_event_attachment",
        "Download or list attachments of an event",
        "sentry get-event-attachment c49541c747cb4d8aa3efb70ca5aba243 --org my-org --project web",
    ),
    mutating(tool(
        "update-issue",
        "update_issue",
        "Change an issue's status or assignee",
        "sentry update-issue PROJ-123 --status resolved --org my-org",
    )),
    tool(
        "analyze-issue-with-seer",
        "analyze_issue_with_seer",
        "Root-cause analysis of an issue with Seer",
        "sentry analyze-issue-with-seer PROJ-123 --org my-org",
    ),
    ai(tool(
        "search-events",
        "search_events",
        "Search events with a natural-language query",
        "sentry search-events \"errors in the last hour\" --org my-org",
    )),
    ai(tool(
        "search-issues",
        "search_issues",
        "Search issues with a natural-language query",
        "sentry search-issues \"unresolved crashes affecting checkout\" --org my-org",
    )),
    tool(
        "search-docs",
        "search_docs",
        "Search Sentry documentation",
        "sentry search-docs \"rate limiting\" --guide javascript",
    ),
    tool(
        "get-doc",
        "get_doc",
        "Fetch a Sentry documentation page",
        "sentry get-doc /platforms/javascript/guides/nextjs.md",
    ),
    mutating(tool(
        "create-team",
        "create_team",
        "Create a team",
        "sentry create-team backend --org my-org",
    )),
    mutating(tool(
        "create-project",
        "create_project",
        "Create a project",
        "sentry create-project web --team backend --platform javascript --org my-org",
    )),
    mutating(tool(
        "update-project",
        "update_project",
        "Update a project's settings",
        "sentry update-project --project web --name \"Web App\" --org my-org",
    )),
    mutating(tool(
        "create-dsn",
        "create_dsn",
        "Create a client key (DSN) for a project",
        "sentry create-dsn staging --project web --org my-org",
    )),
];

/// Find a tool by subcommand name or MCP name
pub fn lookup(name: &str) -> Option<&'static ToolInfo> {
    CATALOG.iter().find(|t| t.command == name || t.name == name)
}

/// MCP name for a user-supplied tool name, accepting either spelling
pub fn mcp_name(name: &str) -> String {
    lookup(name)
        .map(|t| t.name.to_string())
        .unwrap_or_else(|| name.replace('-', "_"))
}

/// Subcommand spelling of an MCP tool name
pub fn command_name(mcp_name: &str) -> String {
    lookup(mcp_name)
        .map(|t| t.command.to_string())
        .unwrap_or_else(|| mcp_name.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_nineteen_unique_tools() {
        assert_eq!(CATALOG.len(), 19);
        let names: HashSet<_> = CATALOG.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), 19);
    }

    #[test]
    fn test_command_is_kebab_of_name() {
        for t in CATALOG {
            assert_eq!(t.command, t.name.replace('_', "-"));
        }
    }

    #[test]
    fn test_only_search_tools_need_ai() {
        let ai: Vec<_> = CATALOG.iter().filter(|t| t.requires_ai).map(|t| t.name).collect();
        assert_eq!(ai, vec!["search_events", "search_issues"]);
    }

    #[test]
    fn test_name_conversions() {
        assert_eq!(mcp_name("get-issue-details"), "get_issue_details");
        assert_eq!(mcp_name("get_issue_details"), "get_issue_details");
        assert_eq!(mcp_name("brand-new-tool"), "brand_new_tool");
        assert_eq!(command_name("find_dsns"), "find-dsns");
        assert_eq!(command_name("brand_new_tool"), "brand-new-tool");
    }
}
