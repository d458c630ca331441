mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::schedule::{PaymentArgs, RecalculateArgs, ScheduleArgs};
use commands::session::SessionArgs;

/// Loan amortization schedules with mid-stream loan updates
#[derive(Parser)]
#[command(
    name = "amort",
    version,
    about = "Loan amortization schedules with extra principal payments and rate changes",
    long_about = "Generates level-payment amortization schedules in decimal precision and \
                  replays loan updates (extra principal plus a new rate, retaining either \
                  the term or the payment) against them. Sessions persist the loan and its \
                  updates as versioned JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log debug detail to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the baseline amortization schedule
    Schedule(ScheduleArgs),
    /// Replay loan updates from a session or input file
    Recalculate(RecalculateArgs),
    /// Calculate the level monthly payment only
    Payment(PaymentArgs),
    /// Create and edit saved loan sessions
    Session(SessionArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Recalculate(args) => commands::schedule::run_recalculate(args),
        Commands::Payment(args) => commands::schedule::run_payment(args),
        Commands::Session(args) => commands::session::run_session(args),
        Commands::Version => {
            println!("amort {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result.and_then(|value| output::format_output(&cli.output, &value)) {
        Ok(()) => process::exit(0),
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
