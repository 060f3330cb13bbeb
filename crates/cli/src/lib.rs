pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "dlassist",
    about = "dlassist operator CLI",
    long_about = "Inspect configuration, check backend and assistant readiness, and list the actions served to the dialogue engine.",
    after_help = "Examples:\n  dlassist doctor --json\n  dlassist config\n  dlassist actions"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Validate config, backend reachability, and assistant availability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List the action names registered with the action server")]
    Actions,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config { json } => commands::config::run(json),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Actions => commands::actions::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
