//! Output formatting for the Sentry CLI
//!
//! Tool metadata is disclosed in three tiers:
//! 1. `list-tools`: name and one-line description
//! 2. `describe-tool`: description, parameters and an example invocation
//! 3. `tool-schema`: the complete input schema
//!
//! Every renderer has a JSON and a human form. Renderers select and lay out
//! fields; they never rewrite values.

use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;
use crate::mcp::{ToolDescriptor, ToolOutcome};
use crate::tools;

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output-related global flags
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub verbose: bool,
    pub quiet: bool,
}

impl OutputOptions {
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Whether hints and banners may be printed to stderr
    pub fn show_hints(&self) -> bool {
        !self.quiet && !self.is_json()
    }
}

/// Tier 1 entry
#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolListOutput<'a> {
    pub tools: Vec<ToolSummary<'a>>,
    pub total: usize,
}

/// One parameter from a tool's input schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Tier 2 payload
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescription<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub parameters: Vec<ParameterInfo>,
    pub example: String,
}

/// Tier 3 payload
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchemaOutput<'a> {
    pub name: &'a str,
    #[serde(rename = "inputSchema")]
    pub input_schema: &'a Value,
}

/// Error envelope printed in JSON mode
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub timestamp: String,
}

impl ErrorOutput {
    pub fn new(kind: &str, error: &str) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            kind: kind.to_string(),
            tool: None,
            hint: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_tool(mut self, tool: &str) -> Self {
        self.tool = Some(tool.to_string());
        self
    }

    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Tier 1: one `name: summary` line per tool, in server order
pub fn render_tool_list(
    tools: &[ToolDescriptor],
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => {
            let output = ToolListOutput {
                tools: tools
                    .iter()
                    .map(|t| ToolSummary {
                        name: &t.name,
                        description: &t.description,
                    })
                    .collect(),
                total: tools.len(),
            };
            serde_json::to_string_pretty(&output)
        }
        OutputFormat::Text => Ok(tools
            .iter()
            .map(|t| format!("{}: {}", t.name, t.summary()))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Parameters declared by an input schema, required ones first
pub fn describe_parameters(schema: &Value) -> Vec<ParameterInfo> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut params: Vec<ParameterInfo> = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| ParameterInfo {
                    name: name.clone(),
                    kind: schema_type(prop),
                    required: required.contains(&name.as_str()),
                    description: prop
                        .get("description")
                        .and_then(Value::as_str)
                        .map(String::from),
                })
                .collect()
        })
        .unwrap_or_default();

    // stable: keeps schema order within each group
    params.sort_by_key(|p| !p.required);
    params
}

fn schema_type(prop: &Value) -> String {
    match prop.get("type") {
        Some(Value::String(t)) => t.clone(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("|"),
        _ if prop.get("enum").is_some() => "enum".to_string(),
        _ if prop.get("anyOf").is_some() || prop.get("oneOf").is_some() => "union".to_string(),
        _ => "any".to_string(),
    }
}

/// Example invocation for a tool
///
/// Known tools use their catalog example; others get one built from the
/// required parameters.
pub fn example_invocation(tool: &ToolDescriptor) -> String {
    if let Some(info) = tools::lookup(&tool.name) {
        return info.example.to_string();
    }

    let mut example = format!("sentry {}", tools::command_name(&tool.name));
    for param in describe_parameters(&tool.input_schema)
        .iter()
        .filter(|p| p.required)
    {
        example.push_str(&format!(" --{} <{}>", kebab_case(&param.name), param.name));
    }
    example
}

fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch == '_' {
            out.push('-');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Tier 2
pub fn render_tool_description(
    tool: &ToolDescriptor,
    format: OutputFormat,
) -> serde_json::Result<String> {
    let description = ToolDescription {
        name: &tool.name,
        description: tool.description.trim(),
        parameters: describe_parameters(&tool.input_schema),
        example: example_invocation(tool),
    };

    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(&description);
    }

    let mut lines = vec![description.name.bold().to_string()];
    for line in description.description.lines() {
        lines.push(format!("  {}", line));
    }
    lines.push(String::new());

    if description.parameters.is_empty() {
        lines.push(format!("{} {}", "Parameters:".bold(), "none".dimmed()));
    } else {
        lines.push("Parameters:".bold().to_string());
        let width = description
            .parameters
            .iter()
            .map(|p| p.name.len())
            .max()
            .unwrap_or(0);
        for p in &description.parameters {
            let required = if p.required { " (required)" } else { "" };
            let mut line = format!("  {:<width$}  {}{}", p.name, p.kind, required, width = width);
            if let Some(ref d) = p.description {
                line.push_str(&format!("  {}", d.lines().next().unwrap_or("")));
            }
            lines.push(line);
        }
    }
    lines.push(String::new());
    lines.push("Example:".bold().to_string());
    lines.push(format!("  {}", description.example));

    Ok(lines.join("\n"))
}

/// Tier 3
pub fn render_tool_schema(
    tool: &ToolDescriptor,
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&ToolSchemaOutput {
            name: &tool.name,
            input_schema: &tool.input_schema,
        }),
        OutputFormat::Text => Ok(format!(
            "{}\n{}",
            tool.name.bold(),
            serde_json::to_string_pretty(&tool.input_schema)?
        )),
    }
}

/// Successful tool result
///
/// JSON mode prints the payload; text mode prints the server's text blocks
/// as they came.
pub fn render_outcome(outcome: &ToolOutcome, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&outcome.payload),
        OutputFormat::Text if !outcome.text.is_empty() => Ok(outcome.text.join("\n")),
        OutputFormat::Text => match &outcome.payload {
            Value::String(s) => Ok(s.clone()),
            Value::Null => Ok(String::new()),
            other => serde_json::to_string_pretty(other),
        },
    }
}

/// Failed tool result, carrying the server's message unchanged
pub fn render_tool_failure(
    tool: &str,
    message: &str,
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => ErrorOutput::new("tool_error", message)
            .with_tool(tool)
            .to_json(),
        OutputFormat::Text => Ok(format!("{} {}", "Error:".red().bold(), message)),
    }
}

/// Print a CLI error to stderr
pub fn report_error(err: &CliError, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let output = ErrorOutput::new(err.kind(), &err.to_string()).with_hint(err.hint());
            eprintln!("{}", output.to_json().unwrap_or_default());
        }
        OutputFormat::Text => {
            eprintln!("{} {}", "Error:".red().bold(), err);
            if let Some(hint) = err.hint() {
                for line in hint.lines() {
                    eprintln!("  {}", line.dimmed());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issue_tool() -> ToolDescriptor {
        ToolDescriptor {
            name: "get_issue_details".into(),
            description: "Get details of an issue.\nIncludes the latest event.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "eventId": { "type": "string", "description": "Specific event" },
                    "organizationSlug": { "type": "string", "description": "Organization slug" },
                    "issueId": { "type": "string", "description": "Issue short id" }
                },
                "required": ["organizationSlug", "issueId"]
            }),
        }
    }

    #[test]
    fn test_tool_list_text_is_one_line_per_tool() {
        let tools = vec![
            issue_tool(),
            ToolDescriptor {
                name: "whoami".into(),
                description: "Identify the user".into(),
                input_schema: json!({}),
            },
        ];
        let text = render_tool_list(&tools, OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "get_issue_details: Get details of an issue.\nwhoami: Identify the user"
        );
    }

    #[test]
    fn test_tool_list_json_keeps_full_description() {
        let text = render_tool_list(&[issue_tool()], OutputFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["total"], 1);
        assert_eq!(
            parsed["tools"][0]["description"],
            "Get details of an issue.\nIncludes the latest event."
        );
    }

    #[test]
    fn test_parameters_required_first_in_schema_order() {
        let params = describe_parameters(&issue_tool().input_schema);
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["organizationSlug", "issueId", "eventId"]);
        assert!(params[0].required);
        assert!(!params[2].required);
        assert_eq!(params[2].kind, "string");
    }

    #[test]
    fn test_describe_json_shape() {
        let text = render_tool_description(&issue_tool(), OutputFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["name"], "get_issue_details");
        assert_eq!(parsed["parameters"].as_array().unwrap().len(), 3);
        assert_eq!(parsed["parameters"][0]["type"], "string");
        assert_eq!(parsed["example"], "sentry get-issue-details PROJ-123 --org my-org");
    }

    #[test]
    fn test_example_for_unknown_tool_uses_required_params() {
        let tool = ToolDescriptor {
            name: "get_profile".into(),
            description: String::new(),
            input_schema: json!({
                "properties": { "organizationSlug": { "type": "string" }, "profileId": {} },
                "required": ["organizationSlug", "profileId"]
            }),
        };
        assert_eq!(
            example_invocation(&tool),
            "sentry get-profile --organization-slug <organizationSlug> --profile-id <profileId>"
        );
    }

    #[test]
    fn test_schema_json_is_unmodified() {
        let tool = issue_tool();
        let text = render_tool_schema(&tool, OutputFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["inputSchema"], tool.input_schema);
    }

    #[test]
    fn test_outcome_json_prints_payload() {
        let outcome = ToolOutcome::from_result(&json!({
            "content": [{ "type": "text", "text": "{\"id\":\"PROJ-123\",\"title\":\"X\"}" }]
        }));
        let text = render_outcome(&outcome, OutputFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({ "id": "PROJ-123", "title": "X" }));
    }

    #[test]
    fn test_outcome_text_is_verbatim() {
        let outcome = ToolOutcome::from_result(&json!({
            "content": [
                { "type": "text", "text": "# Projects" },
                { "type": "text", "text": "- web" }
            ]
        }));
        assert_eq!(render_outcome(&outcome, OutputFormat::Text).unwrap(), "# Projects\n- web");
    }

    #[test]
    fn test_tool_failure_json_envelope() {
        let text =
            render_tool_failure("find_teams", "Organization not found", OutputFormat::Json)
                .unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["tool"], "find_teams");
        assert_eq!(parsed["error"], "Organization not found");
    }
}
