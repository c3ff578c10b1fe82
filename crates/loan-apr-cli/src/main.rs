mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::loan::{LoanArgs, RateArgs};

/// Effective APR/APY of fixed-payment loans
#[derive(Parser)]
#[command(
    name = "apr",
    version,
    about = "Effective APR/APY of fixed-payment loans",
    long_about = "Recovers the periodic interest rate implied by a loan's principal, \
                  level payment and number of payments, then annualises it into \
                  APR and APY for monthly or weekly repayment schedules."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    output: OutputFormat,

    /// Log solver progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Loan summary and detailed breakdown (formatted figures)
    Metrics(LoanArgs),
    /// Raw loan figures with warnings and methodology
    Analyze(LoanArgs),
    /// Solve only the periodic interest rate
    Rate(RateArgs),
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
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Metrics(args) => commands::loan::run_metrics(args),
        Commands::Analyze(args) => commands::loan::run_analyze(args),
        Commands::Rate(args) => commands::loan::run_rate(args),
        Commands::Version => {
            println!("apr {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            // Error-shaped loan results are rendered like any other, but still fail the process
            let failed = value.get(output::ERROR_KEY).is_some();
            process::exit(if failed { 1 } else { 0 });
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
