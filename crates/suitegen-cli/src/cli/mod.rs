mod commands;
mod helpers;

use clap::Parser;
use std::path::PathBuf;
use suitegen_core::domain::SuiteError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();

    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let suite_error = error.as_suite_error();
            eprintln!("{}", suite_error.diagnostic_line());
            if let Some(summary_line) = suite_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            suite_error.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_logging(cli.global.verbose);
            dispatch_parsed(cli.global, cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "suitegen",
    version,
    about = "Generate a validator test suite from captured oracle output"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Args)]
pub(super) struct GlobalArgs {
    /// Repository root holding the fixture, expectation and suite directories
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// JSON config overlay (default: <root>/suitegen.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Per-file outcomes and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Capture oracle output for fixtures that have no cached expectation
    Expectations(commands::ExpectationsArgs),
    /// Render the test suite from cached expectations
    Generate(commands::GenerateArgs),
    /// Capture expectations, then render the test suite
    Setup(commands::ExpectationsArgs),
    /// Show fixture, expectation, oracle and suite state
    Status(commands::StatusArgs),
}

fn dispatch_parsed(global: GlobalArgs, command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Expectations(args) => commands::run_expectations_command(&global, args),
        CliCommand::Generate(args) => commands::run_generate_command(&global, args),
        CliCommand::Setup(args) => commands::run_setup_command(&global, args),
        CliCommand::Status(args) => commands::run_status_command(&global, args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Suite(SuiteError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<SuiteError> for CliError {
    fn from(error: SuiteError) -> Self {
        Self::Suite(error)
    }
}

impl CliError {
    fn as_suite_error(&self) -> SuiteError {
        match self {
            Self::Usage(message) => SuiteError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Suite(error) => error.clone(),
            Self::Internal(error) => SuiteError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
