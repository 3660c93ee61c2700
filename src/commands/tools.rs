//! Tool discovery commands: `list-tools`, `describe-tool`, `tool-schema`

use colored::Colorize;

use crate::error::{CliError, Result};
use crate::mcp::ToolDescriptor;
use crate::output;
use crate::tools as catalog;

use super::{CommandContext, CommandStatus, Launch};

fn fetch_tools(ctx: &CommandContext, launcher: &dyn Launch) -> Result<Vec<ToolDescriptor>> {
    let mut client = launcher.launch(ctx)?;
    let tools = client.list_tools();
    let closed = client.close();
    let tools = tools?;
    closed?;
    Ok(tools)
}

/// Pick a tool by MCP name or subcommand name
pub fn find_tool(tools: Vec<ToolDescriptor>, name: &str) -> Result<ToolDescriptor> {
    let wanted = catalog::mcp_name(name);
    tools
        .into_iter()
        .find(|t| t.name == wanted || t.name == name)
        .ok_or_else(|| {
            CliError::invalid(format!(
                "unknown tool '{}'; run `sentry list-tools` to see available tools",
                name
            ))
        })
}

/// Tier 1
pub fn list_tools(ctx: &CommandContext, launcher: &dyn Launch) -> Result<CommandStatus> {
    let tools = fetch_tools(ctx, launcher)?;
    println!("{}", output::render_tool_list(&tools, ctx.output.format)?);

    if ctx.output.show_hints() {
        eprintln!(
            "{}",
            format!(
                "{} tools. Use 'sentry describe-tool <name>' for details.",
                tools.len()
            )
            .dimmed()
        );
    }
    Ok(CommandStatus::Success)
}

/// Tier 2
pub fn describe_tool(
    ctx: &CommandContext,
    launcher: &dyn Launch,
    name: &str,
) -> Result<CommandStatus> {
    let tool = find_tool(fetch_tools(ctx, launcher)?, name)?;
    println!("{}", output::render_tool_description(&tool, ctx.output.format)?);

    if ctx.output.show_hints() {
        eprintln!(
            "{}",
            format!("Use 'sentry tool-schema {}' for the full schema.", name).dimmed()
        );
    }
    Ok(CommandStatus::Success)
}

/// Tier 3
pub fn tool_schema(
    ctx: &CommandContext,
    launcher: &dyn Launch,
    name: &str,
) -> Result<CommandStatus> {
    let tool = find_tool(fetch_tools(ctx, launcher)?, name)?;
    println!("{}", output::render_tool_schema(&tool, ctx.output.format)?);
    Ok(CommandStatus::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tools() -> Vec<ToolDescriptor> {
        ["whoami", "get_issue_details"]
            .iter()
            .map(|name| ToolDescriptor {
                name: name.to_string(),
                description: format!("{} tool", name),
                input_schema: json!({ "type": "object", "properties": {} }),
            })
            .collect()
    }

    #[test]
    fn test_find_tool_accepts_both_spellings() {
        assert_eq!(find_tool(tools(), "get-issue-details").unwrap().name, "get_issue_details");
        assert_eq!(find_tool(tools(), "get_issue_details").unwrap().name, "get_issue_details");
    }

    #[test]
    fn test_find_unknown_tool() {
        let err = find_tool(tools(), "delete-everything").unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(ref m) if m.contains("list-tools")));
    }
}
