use std::io::IsTerminal;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sentry_cli::cli::{Cli, GlobalArgs};
use sentry_cli::commands::{self, CommandContext, CommandStatus, StdioLauncher};
use sentry_cli::error::{CliError, Result};
use sentry_cli::mcp::CancelToken;
use sentry_cli::output::{self, OutputFormat, OutputOptions};
use sentry_cli::Settings;

/// How long to wait for the command thread to tear the server down after Ctrl-C
const INTERRUPT_GRACE: Duration = Duration::from_secs(5);

fn init_logging(global: &GlobalArgs) {
    let default_level = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// OUTPUT_COLOR wins; otherwise colors only go to a terminal
fn init_colors(preference: Option<bool>) {
    match preference {
        Some(enabled) => colored::control::set_override(enabled),
        None if !std::io::stdout().is_terminal() => colored::control::set_override(false),
        None => {}
    }
}

async fn run(cli: Cli, settings: Settings, output: OutputOptions) -> Result<CommandStatus> {
    tracing::debug!(?settings, "configuration loaded");

    let interactive =
        !cli.global.no_interactive && !output.is_json() && std::io::stdin().is_terminal();
    let cancel = CancelToken::new();
    let ctx = CommandContext::new(settings, output)
        .with_interactive(interactive)
        .with_cancel(cancel.clone());

    let command = cli.command;
    let mut task =
        tokio::task::spawn_blocking(move || commands::run(command, &ctx, &StdioLauncher));

    tokio::select! {
        joined = &mut task => joined.map_err(|e| {
            CliError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
        })?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted; shutting down MCP server");
            cancel.cancel();
            if tokio::time::timeout(INTERRUPT_GRACE, task).await.is_err() {
                tracing::warn!("command did not stop within {:?}", INTERRUPT_GRACE);
            }
            Err(CliError::Interrupted)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global);

    let settings = Settings::load().map(|s| s.with_org(cli.global.org.clone()));
    let (default_format, color) = match settings {
        Ok(ref s) => (s.output_format, s.output_color),
        Err(_) => (OutputFormat::Text, None),
    };
    init_colors(color);

    let output = cli.global.output(default_format);
    let result = match settings {
        Ok(settings) => run(cli, settings, output).await,
        Err(e) => Err(e),
    };

    let code = match result {
        Ok(status) => status.exit_code(),
        Err(e) => {
            output::report_error(&e, output.format);
            e.exit_code()
        }
    };

    std::process::exit(code);
}
