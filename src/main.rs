//! cmdctl - Rust Edition
//!
//! Command-line client for a microservices toolkit.
//!
//! # Usage
//!
//! ```bash
//! # Load bash completion into the current shell
//! source <(cmdctl completion bash)
//!
//! # Install zsh completion
//! cmdctl completion zsh > "${fpath[1]}/_cmdctl"
//! ```

use std::io::IsTerminal;

use clap::CommandFactory;
use nu_ansi_term::Color;

use cmdctl::cli::{CliArgs, CliInterface};
use cmdctl::error::{CmdctlError, Result};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        report_error(&e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Handle the subcommand, or print help when none was given
///
/// # Returns
/// * `Result<()>` - Success or error
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_subcommand().await? {
        return Ok(());
    }

    CliArgs::command().print_help()?;
    Ok(())
}

/// Print an error to stderr; usage errors print as-is, in red on a terminal
fn report_error(error: &CmdctlError) {
    let message = match error {
        CmdctlError::Usage(usage) => usage.to_string(),
        other => format!("Error: {other}"),
    };

    let colored = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    if colored {
        eprintln!("{}", Color::Red.paint(message));
    } else {
        eprintln!("{message}");
    }
}

/// Initialize logging system based on verbosity level
///
/// Logs go to stderr; stdout carries scripts and completion candidates.
///
/// # Arguments
/// * `cli` - CLI interface with the effective logging configuration
fn initialize_logging(cli: &CliInterface) {
    let level = cli.config().logging.level.to_tracing_level();

    // Build subscriber with level filter
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    // Configure timestamps
    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
