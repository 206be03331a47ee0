use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use crate::constants::DEFAULT_PORT;

#[derive(Parser)]
#[command(name = "stockpulse")]
#[command(about = "Stock market data fetcher and analysis dashboard", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch price history and fundamentals into the local cache
    Fetch {
        /// Path to the symbol list CSV
        #[arg(short, long, default_value = "symbols.csv")]
        symbols: PathBuf,
        /// Delay between symbols in milliseconds
        #[arg(long)]
        pacing_ms: Option<u64>,
        /// Suppress the progress bar
        #[arg(long)]
        quiet: bool,
    },
    /// Compute indicators and market overview from the cache
    Analyze {
        /// Path to the symbol list CSV
        #[arg(short, long, default_value = "symbols.csv")]
        symbols: PathBuf,
    },
    /// Start the dashboard server
    Serve {
        /// Path to the symbol list CSV
        #[arg(short, long, default_value = "symbols.csv")]
        symbols: PathBuf,
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Generate a PDF analysis report
    Report {
        /// Path to the symbol list CSV
        #[arg(short, long, default_value = "symbols.csv")]
        symbols: PathBuf,
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show cache status
    Status,
}

pub async fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            symbols,
            pacing_ms,
            quiet,
        } => {
            commands::fetch::run(symbols, pacing_ms, quiet).await;
        }
        Commands::Analyze { symbols } => {
            commands::analyze::run(symbols);
        }
        Commands::Serve { symbols, port } => {
            commands::serve::run(symbols, port).await;
        }
        Commands::Report { symbols, output } => {
            commands::report::run(symbols, output);
        }
        Commands::Status => {
            commands::status::run();
        }
    }
}
