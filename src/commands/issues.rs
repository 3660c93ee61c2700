//! Issue, event and trace commands

use crate::cli::IssueStatus;
use crate::config::Settings;
use crate::error::{CliError, Result};
use crate::mcp::ToolCall;

use super::{non_empty, require_org, require_project};

/// Add either `issueUrl` or `organizationSlug` + `issueId`
fn with_issue(call: ToolCall, settings: &Settings, issue: &str) -> Result<ToolCall> {
    let issue = non_empty(issue, "issue")?;
    if issue.starts_with("http://") || issue.starts_with("https://") {
        return Ok(call.arg("issueUrl", issue));
    }
    Ok(call
        .arg("organizationSlug", require_org(settings)?)
        .arg("issueId", issue))
}

pub fn get_issue_details(
    settings: &Settings,
    issue: &str,
    event: Option<String>,
) -> Result<ToolCall> {
    Ok(with_issue(ToolCall::new("get_issue_details"), settings, issue)?
        .opt_arg("eventId", event))
}

pub fn get_trace_details(settings: &Settings, trace_id: &str) -> Result<ToolCall> {
    let trace_id = non_empty(trace_id, "trace id")?;
    if trace_id.len() != 32 || !trace_id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CliError::invalid(format!(
            "trace id must be 32 hexadecimal characters, got '{}'",
            trace_id
        )));
    }
    Ok(ToolCall::new("get_trace_details")
        .arg("organizationSlug", require_org(settings)?)
        .arg("traceId", trace_id))
}

pub fn get_event_attachment(
    settings: &Settings,
    event_id: &str,
    project: Option<String>,
    attachment: Option<String>,
) -> Result<ToolCall> {
    Ok(ToolCall::new("get_event_attachment")
        .arg("organizationSlug", require_org(settings)?)
        .arg("projectSlug", require_project(settings, project)?)
        .arg("eventId", non_empty(event_id, "event id")?)
        .opt_arg("attachmentId", attachment))
}

pub fn update_issue(
    settings: &Settings,
    issue: &str,
    status: Option<IssueStatus>,
    assign_to: Option<String>,
) -> Result<ToolCall> {
    if status.is_none() && assign_to.is_none() {
        return Err(CliError::invalid(
            "nothing to update: pass --status and/or --assign-to",
        ));
    }
    Ok(with_issue(ToolCall::new("update_issue"), settings, issue)?
        .opt_arg("status", status.map(|s| s.as_api_str()))
        .opt_arg("assignedTo", assign_to))
}

pub fn analyze_issue_with_seer(
    settings: &Settings,
    issue: &str,
    instruction: Option<String>,
) -> Result<ToolCall> {
    Ok(with_issue(ToolCall::new("analyze_issue_with_seer"), settings, issue)?
        .opt_arg("instruction", instruction))
}
