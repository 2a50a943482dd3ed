mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::evaluate::EvaluateArgs;
use commands::irr::IrrArgs;
use commands::sensitivity::{NpvGridArgs, SensitivityArgs};

/// Feasibility runs for modular biomass CHP fleets
#[derive(Parser)]
#[command(
    name = "chpfleet",
    version,
    about = "Feasibility runs for modular biomass CHP fleets",
    long_about = "Project a fleet of small combined heat and power units over its \
                  horizon with decimal precision. Reports NPV, IRR, payback, DSCR, \
                  customer savings and one- or two-way NPV sensitivity."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log filter written to stderr (e.g. "debug", "chp_fleet_core=trace")
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full feasibility model for one scenario
    Evaluate(EvaluateArgs),
    /// NPV swing of each key driver moved -20% / +20%
    Sensitivity(SensitivityArgs),
    /// NPV over a two-parameter sweep
    NpvGrid(NpvGridArgs),
    /// IRR (and optionally NPV) of an explicit cash-flow series
    Irr(IrrArgs),
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

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run_evaluate(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::NpvGrid(args) => commands::sensitivity::run_npv_grid(args),
        Commands::Irr(args) => commands::irr::run_irr(args),
        Commands::Version => {
            println!("chpfleet {}", env!("CARGO_PKG_VERSION"));
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
