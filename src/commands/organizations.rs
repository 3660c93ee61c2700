//! Organization, team, project, release and DSN commands

use crate::config::Settings;
use crate::error::{CliError, Result};
use crate::mcp::ToolCall;

use super::{non_empty, project_or_default, require_org, require_project};

pub fn whoami() -> ToolCall {
    ToolCall::new("whoami")
}

pub fn find_organizations(query: Option<String>) -> ToolCall {
    ToolCall::new("find_organizations").opt_arg("query", query)
}

pub fn find_teams(settings: &Settings, query: Option<String>) -> Result<ToolCall> {
    Ok(ToolCall::new("find_teams")
        .arg("organizationSlug", require_org(settings)?)
        .opt_arg("query", query))
}

pub fn find_projects(settings: &Settings, query: Option<String>) -> Result<ToolCall> {
    Ok(ToolCall::new("find_projects")
        .arg("organizationSlug", require_org(settings)?)
        .opt_arg("query", query))
}

pub fn find_releases(
    settings: &Settings,
    project: Option<String>,
    query: Option<String>,
) -> Result<ToolCall> {
    Ok(ToolCall::new("find_releases")
        .arg("organizationSlug", require_org(settings)?)
        .opt_arg("projectSlug", project_or_default(settings, project))
        .opt_arg("query", query))
}

pub fn find_dsns(settings: &Settings, project: Option<String>) -> Result<ToolCall> {
    Ok(ToolCall::new("find_dsns")
        .arg("organizationSlug", require_org(settings)?)
        .arg("projectSlug", require_project(settings, project)?))
}

pub fn create_team(settings: &Settings, name: &str) -> Result<ToolCall> {
    Ok(ToolCall::new("create_team")
        .arg("organizationSlug", require_org(settings)?)
        .arg("name", non_empty(name, "team name")?))
}

pub fn create_project(
    settings: &Settings,
    name: &str,
    team: &str,
    platform: Option<String>,
) -> Result<ToolCall> {
    Ok(ToolCall::new("create_project")
        .arg("organizationSlug", require_org(settings)?)
        .arg("teamSlug", non_empty(team, "team")?)
        .arg("name", non_empty(name, "project name")?)
        .opt_arg("platform", platform))
}

pub fn update_project(
    settings: &Settings,
    project: Option<String>,
    name: Option<String>,
    slug: Option<String>,
    platform: Option<String>,
    team: Option<String>,
) -> Result<ToolCall> {
    if name.is_none() && slug.is_none() && platform.is_none() && team.is_none() {
        return Err(CliError::invalid(
            "nothing to update: pass --name, --slug, --platform or --team",
        ));
    }
    Ok(ToolCall::new("update_project")
        .arg("organizationSlug", require_org(settings)?)
        .arg("projectSlug", require_project(settings, project)?)
        .opt_arg("name", name)
        .opt_arg("slug", slug)
        .opt_arg("platform", platform)
        .opt_arg("teamSlug", team))
}

pub fn create_dsn(settings: &Settings, name: &str, project: Option<String>) -> Result<ToolCall> {
    Ok(ToolCall::new("create_dsn")
        .arg("organizationSlug", require_org(settings)?)
        .arg("projectSlug", require_project(settings, project)?)
        .arg("name", non_empty(name, "key name")?))
}
