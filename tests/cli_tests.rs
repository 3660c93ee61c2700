//! End-to-end tests for the `sentry` binary
//!
//! `SENTRY_MCP_COMMAND` points the CLI at the `sentry-mcp-stub` binary, and
//! HOME plus the working directory are temp dirs so no real env file leaks in.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

const STUB: &str = env!("CARGO_BIN_EXE_sentry-mcp-stub");

struct Sandbox {
    home: TempDir,
    project: TempDir,
}

impl Sandbox {
    /// Sandbox with a token and default org in the user env file
    fn new() -> Self {
        let sandbox = Self::bare();
        sandbox.user_env("SENTRY_ACCESS_TOKEN=test-token\nSENTRY_DEFAULT_ORG=acme\n");
        sandbox
    }

    /// Sandbox without any env files
    fn bare() -> Self {
        Self {
            home: TempDir::new().unwrap(),
            project: TempDir::new().unwrap(),
        }
    }

    fn user_env(&self, content: &str) {
        let dir = self.home.path().join(".claude");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(".env"), content).unwrap();
    }

    fn project_env(&self, content: &str) {
        fs::write(self.project.path().join(".env"), content).unwrap();
    }

    fn path(&self, name: &str) -> PathBuf {
        self.home.path().join(name)
    }

    fn sentry(&self) -> Command {
        let mut cmd = Command::cargo_bin("sentry").unwrap();
        cmd.env_clear()
            .env("HOME", self.home.path())
            .env("PATH", std::env::var("PATH").unwrap_or_default())
            .env("SENTRY_MCP_COMMAND", STUB)
            .current_dir(self.project.path());
        cmd
    }
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn stderr_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stderr).expect("stderr should be JSON")
}

// ============================================================================
// Progressive Disclosure Tests
// ============================================================================

#[test]
fn test_list_tools_one_line_per_tool() {
    let sandbox = Sandbox::new();
    let tools: Vec<Value> = (1..=19)
        .map(|i| {
            json!({
                "name": format!("tool_{:02}", i),
                "description": format!("Description {}\nSecond line never shown", i),
                "inputSchema": { "type": "object", "properties": {} }
            })
        })
        .collect();
    let tools_file = sandbox.path("tools.json");
    fs::write(&tools_file, Value::Array(tools).to_string()).unwrap();

    let output = sandbox
        .sentry()
        .arg("list-tools")
        .env("STUB_TOOLS", &tools_file)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 19);
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(*line, format!("tool_{:02}: Description {}", i + 1, i + 1));
    }
}

#[test]
fn test_list_tools_json() {
    let sandbox = Sandbox::new();
    let output = sandbox.sentry().args(["list-tools", "--json"]).output().unwrap();

    assert!(output.status.success());
    let body = stdout_json(&output);
    assert_eq!(body["total"], 19);
    assert_eq!(body["tools"][0]["name"], "whoami");
    // hints are suppressed in JSON mode
    assert!(output.stderr.is_empty());
}

#[test]
fn test_describe_tool_shows_parameters_and_example() {
    let sandbox = Sandbox::new();
    let tools_file = sandbox.path("tools.json");
    fs::write(
        &tools_file,
        json!([{
            "name": "get_issue_details",
            "description": "Get detailed information about a specific issue.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "eventId": { "type": "string", "description": "Event to show" },
                    "issueId": { "type": "string", "description": "Issue short ID" }
                },
                "required": ["issueId"]
            }
        }])
        .to_string(),
    )
    .unwrap();

    sandbox
        .sentry()
        .args(["describe-tool", "get-issue-details"])
        .env("STUB_TOOLS", &tools_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("get_issue_details"))
        .stdout(predicate::str::contains("issueId"))
        .stdout(predicate::str::contains("(required)"))
        .stdout(predicate::str::contains("Example:"))
        .stdout(predicate::str::contains("sentry get-issue-details"));

    let output = sandbox
        .sentry()
        .args(["describe-tool", "get_issue_details", "--json"])
        .env("STUB_TOOLS", &tools_file)
        .output()
        .unwrap();
    let body = stdout_json(&output);
    assert_eq!(body["parameters"][0]["name"], "issueId");
    assert_eq!(body["parameters"][0]["required"], true);
    assert_eq!(body["parameters"][1]["name"], "eventId");
}

#[test]
fn test_tool_schema_is_verbatim() {
    let sandbox = Sandbox::new();
    let schema = json!({
        "type": "object",
        "properties": { "path": { "type": "string", "pattern": "\\.md$" } },
        "required": ["path"],
        "additionalProperties": false
    });
    let tools_file = sandbox.path("tools.json");
    fs::write(
        &tools_file,
        json!([{ "name": "get_doc", "description": "Fetch a doc", "inputSchema": schema }])
            .to_string(),
    )
    .unwrap();

    let output = sandbox
        .sentry()
        .args(["tool-schema", "get-doc", "--json"])
        .env("STUB_TOOLS", &tools_file)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["inputSchema"], schema);
}

#[test]
fn test_unknown_tool_is_usage_error() {
    let sandbox = Sandbox::new();
    sandbox
        .sentry()
        .args(["describe-tool", "drop-database"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("list-tools"));
}

// ============================================================================
// Tool Invocation Tests
// ============================================================================

#[test]
fn test_issue_details_json_payload() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .sentry()
        .args(["get-issue-details", "PROJ-123", "--json"])
        .env("STUB_RESULT", r#"{"id":"PROJ-123","title":"X"}"#)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output), json!({ "id": "PROJ-123", "title": "X" }));
}

#[test]
fn test_arguments_forwarded_to_server() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .sentry()
        .args(["find-projects", "--query", "web", "--org", "globex", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        json!({
            "tool": "find_projects",
            "arguments": { "organizationSlug": "globex", "query": "web" }
        })
    );
}

#[test]
fn test_text_result_printed_as_is() {
    let sandbox = Sandbox::new();
    sandbox
        .sentry()
        .arg("whoami")
        .env("STUB_RESULT", "You are authenticated as jane@example.com")
        .assert()
        .success()
        .stdout("You are authenticated as jane@example.com\n");
}

#[test]
fn test_tool_error_exits_one() {
    let sandbox = Sandbox::new();
    sandbox
        .sentry()
        .args(["get-issue-details", "PROJ-999"])
        .env("STUB_TOOL_ERROR", "Issue PROJ-999 not found")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Issue PROJ-999 not found"));
}

#[test]
fn test_tool_error_json_envelope() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .sentry()
        .args(["get-issue-details", "PROJ-999", "--json"])
        .env("STUB_TOOL_ERROR", "Issue PROJ-999 not found")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let body = stderr_json(&output);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Issue PROJ-999 not found");
    assert_eq!(body["tool"], "get_issue_details");
}

#[test]
fn test_mutation_without_terminal_is_not_prompted() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .sentry()
        .args(["update-issue", "PROJ-1", "--status", "resolved", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let body = stdout_json(&output);
    assert_eq!(body["tool"], "update_issue");
    assert_eq!(body["arguments"]["status"], "resolved");
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_project_env_overrides_user_env() {
    let sandbox = Sandbox::new();
    sandbox.project_env("SENTRY_DEFAULT_ORG=initech\n");

    let output = sandbox.sentry().args(["find-teams", "--json"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["arguments"]["organizationSlug"], "initech");
}

#[test]
fn test_process_env_is_a_fallback() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .sentry()
        .args(["find-dsns", "--json"])
        .env("SENTRY_DEFAULT_PROJECT", "web")
        .env("SENTRY_DEFAULT_ORG", "ignored-because-file-sets-it")
        .output()
        .unwrap();

    assert!(output.status.success());
    let body = stdout_json(&output);
    assert_eq!(body["arguments"]["organizationSlug"], "acme");
    assert_eq!(body["arguments"]["projectSlug"], "web");
}

#[test]
fn test_missing_token_never_starts_server() {
    let sandbox = Sandbox::bare();
    let marker = sandbox.path("started");

    sandbox
        .sentry()
        .arg("whoami")
        .env("STUB_MARKER", &marker)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("SENTRY_ACCESS_TOKEN"));

    assert!(!marker.exists());
}

#[test]
fn test_missing_token_json_envelope() {
    let sandbox = Sandbox::bare();
    let output = sandbox.sentry().args(["whoami", "--json"]).output().unwrap();

    assert_eq!(output.status.code(), Some(3));
    let body = stderr_json(&output);
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "configuration_error");
    assert!(body["error"].as_str().unwrap().contains("SENTRY_ACCESS_TOKEN"));
    assert!(body["hint"].is_string());
}

#[test]
fn test_ai_search_without_key_never_starts_server() {
    let sandbox = Sandbox::new();
    let marker = sandbox.path("started");

    sandbox
        .sentry()
        .args(["search-events", "errors in the last hour"])
        .env("STUB_MARKER", &marker)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("OPENAI_API_KEY"));

    assert!(!marker.exists());
}

#[test]
fn test_ai_search_with_key() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .sentry()
        .args(["search-issues", "unresolved crashes", "--json"])
        .env("OPENAI_API_KEY", "sk-test")
        .output()
        .unwrap();

    assert!(output.status.success());
    let body = stdout_json(&output);
    assert_eq!(body["tool"], "search_issues");
    assert_eq!(body["arguments"]["naturalLanguageQuery"], "unresolved crashes");
}

#[test]
fn test_missing_org_is_usage_error() {
    let sandbox = Sandbox::bare();
    sandbox.user_env("SENTRY_ACCESS_TOKEN=test-token\n");
    let marker = sandbox.path("started");

    sandbox
        .sentry()
        .arg("find-projects")
        .env("STUB_MARKER", &marker)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("SENTRY_DEFAULT_ORG"));

    assert!(!marker.exists());
}

#[test]
fn test_issue_lookup_needs_org_unless_url() {
    let sandbox = Sandbox::bare();
    sandbox.user_env("SENTRY_ACCESS_TOKEN=test-token\n");

    sandbox
        .sentry()
        .args(["get-issue-details", "PROJ-123", "--json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--org"));

    let url = "https://acme.sentry.io/issues/PROJ-123/";
    let output = sandbox
        .sentry()
        .args(["get-issue-details", url, "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output)["arguments"],
        json!({ "issueUrl": url })
    );
}

// ============================================================================
// Output Preference Tests
// ============================================================================

#[test]
fn test_output_format_from_env_file() {
    let sandbox = Sandbox::new();
    sandbox.project_env("OUTPUT_FORMAT=json\n");

    let output = sandbox
        .sentry()
        .arg("whoami")
        .env("STUB_RESULT", r#"{"email":"jane@example.com"}"#)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!({ "email": "jane@example.com" }));
}

#[test]
fn test_output_format_json_applies_to_errors() {
    let sandbox = Sandbox::new();
    sandbox.project_env("OUTPUT_FORMAT=json\n");

    let output = sandbox.sentry().args(["describe-tool", "nope"]).output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr_json(&output)["kind"], "invalid_argument");
}

#[test]
fn test_plain_output_has_no_colors_by_default() {
    let sandbox = Sandbox::new();
    sandbox
        .sentry()
        .args(["describe-tool", "nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("\u{1b}[").not());
}

#[test]
fn test_output_color_forces_colors() {
    let sandbox = Sandbox::new();
    sandbox.project_env("OUTPUT_COLOR=true\n");

    sandbox
        .sentry()
        .args(["describe-tool", "nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("\u{1b}["));
}

// ============================================================================
// Server Failure Tests
// ============================================================================

#[test]
fn test_missing_server_executable() {
    let sandbox = Sandbox::new();
    sandbox
        .sentry()
        .arg("whoami")
        .env("SENTRY_MCP_COMMAND", "definitely-not-a-real-binary-xyz")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to launch MCP server"));
}

#[test]
fn test_protocol_error_exits_one() {
    let sandbox = Sandbox::new();
    sandbox
        .sentry()
        .arg("whoami")
        .env("STUB_MODE", "mismatch")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("protocol error"));
}

#[test]
fn test_request_timeout_from_env() {
    let sandbox = Sandbox::new();
    sandbox.project_env("SENTRY_MCP_TIMEOUT=1\n");

    sandbox
        .sentry()
        .arg("whoami")
        .env("STUB_MODE", "silent")
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("timed out"));
}

// ============================================================================
// Argument Parsing Tests
// ============================================================================

#[test]
fn test_help_lists_tool_commands() {
    Command::cargo_bin("sentry")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list-tools"))
        .stdout(predicate::str::contains("get-issue-details"))
        .stdout(predicate::str::contains("search-events"));
}

#[test]
fn test_stub_identifies_itself() {
    Command::new(STUB)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("not a real Sentry server"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    Command::cargo_bin("sentry")
        .unwrap()
        .args(["whoami", "-v", "-q"])
        .assert()
        .code(2);
}
