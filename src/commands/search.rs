//! Search and documentation commands

use crate::config::Settings;
use crate::error::{CliError, Result};
use crate::mcp::ToolCall;

use super::{non_empty, project_or_default, require_org};

pub fn search_events(
    settings: &Settings,
    query: &str,
    project: Option<String>,
    limit: Option<u32>,
    explain: bool,
) -> Result<ToolCall> {
    Ok(ToolCall::new("search_events")
        .arg("organizationSlug", require_org(settings)?)
        .arg("naturalLanguageQuery", non_empty(query, "query")?)
        .opt_arg("projectSlug", project_or_default(settings, project))
        .opt_arg("limit", positive(limit, "--limit")?)
        .opt_arg("includeExplanation", explain.then_some(true)))
}

pub fn search_issues(
    settings: &Settings,
    query: &str,
    project: Option<String>,
    limit: Option<u32>,
    explain: bool,
) -> Result<ToolCall> {
    Ok(ToolCall::new("search_issues")
        .arg("organizationSlug", require_org(settings)?)
        .arg("naturalLanguageQuery", non_empty(query, "query")?)
        .opt_arg("projectSlugOrId", project_or_default(settings, project))
        .opt_arg("limit", positive(limit, "--limit")?)
        .opt_arg("includeExplanation", explain.then_some(true)))
}

pub fn search_docs(
    query: &str,
    max_results: Option<u32>,
    guide: Option<String>,
) -> Result<ToolCall> {
    Ok(ToolCall::new("search_docs")
        .arg("query", non_empty(query, "query")?)
        .opt_arg("maxResults", positive(max_results, "--max-results")?)
        .opt_arg("guide", guide))
}

pub fn get_doc(path: &str) -> Result<ToolCall> {
    let path = non_empty(path, "path")?;
    if !path.ends_with(".md") {
        return Err(CliError::invalid(format!(
            "doc path must end in .md (as returned by search-docs), got '{}'",
            path
        )));
    }
    Ok(ToolCall::new("get_doc").arg("path", path))
}

fn positive(value: Option<u32>, flag: &str) -> Result<Option<u32>> {
    match value {
        Some(0) => Err(CliError::invalid(format!("{} must be at least 1", flag))),
        other => Ok(other),
    }
}
