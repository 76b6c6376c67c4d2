mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use microloan_core::config::ProductConfig;

use commands::quote::{CompareArgs, QuoteArgs, ValidateArgs};
use commands::reconcile::ReconcileArgs;
use commands::schedule::ScheduleArgs;

/// Microloan quotes with decimal precision
#[derive(Parser)]
#[command(
    name = "mloan",
    version,
    about = "Microloan quotes, bounds checks and repayment schedules",
    long_about = "A CLI over the shared loan pricing engine. Prices a principal/term \
                  selection with the product's canonical policy, checks it against the \
                  product bounds, lays out the repayment schedule, and reconciles local \
                  quotes against the backend's calculate endpoint."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Product configuration (TOML); defaults to the built-in product
    #[arg(long, global = true, env = "MLOAN_CONFIG")]
    config: Option<String>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a loan with the configured policy
    Quote(QuoteArgs),
    /// Check a principal/term selection against the product bounds
    Validate(ValidateArgs),
    /// Build the installment schedule for a loan
    Schedule(ScheduleArgs),
    /// Price a loan under both the annualized and the flat rate model
    Compare(CompareArgs),
    /// Compare the local quote with the backend's
    Reconcile(ReconcileArgs),
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

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Quote(args) => commands::quote::run_quote(args, &config).await,
        Commands::Validate(args) => commands::quote::run_validate(args, &config),
        Commands::Schedule(args) => commands::schedule::run_schedule(args, &config),
        Commands::Compare(args) => commands::quote::run_compare(args, &config),
        Commands::Reconcile(args) => commands::reconcile::run_reconcile(args, &config).await,
        Commands::Version => {
            println!("mloan {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

fn load_config(path: Option<&str>) -> Result<ProductConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let resolved = input::file::resolve_path(path)?;
            Ok(ProductConfig::from_file(resolved)?)
        }
        None => Ok(ProductConfig::default()),
    }
}
