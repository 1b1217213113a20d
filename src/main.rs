use clap::{Parser, Subcommand};
use fxdwh::core::log::init_logging;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Load new rates into the warehouse (default)
    Run,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Setup => match fxdwh::cli::setup::setup() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "Setup failed");
                ExitCode::from(2)
            }
        },
        Commands::Run => {
            match fxdwh::run_command(fxdwh::AppCommand::Run, cli.config_path.as_deref()).await {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %e, "Application failed");
                    ExitCode::from(e.exit_code())
                }
            }
        }
    }
}
