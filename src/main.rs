//! fx-history - main entry point
//!
//! This binary provides three subcommands:
//! - download: Fetch the configured training/validation splits to CSV
//! - fetch: Fetch a single date range to one CSV file
//! - inspect: Summarize a CSV file written by this tool

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fx_history::Interval;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "fx-history")]
#[command(about = "Download daily FX price history into training and validation CSV files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory for log files
    #[arg(long, global = true, default_value = "logs")]
    log_dir: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the training and validation datasets
    Download {
        /// Path to configuration file (built-in EURUSD defaults when omitted)
        #[arg(short, long)]
        config: Option<String>,

        /// Symbol to download (overrides config file). E.g., "EURUSD=X"
        #[arg(short, long)]
        symbol: Option<String>,

        /// Bar interval: 1d, 1wk or 1mo (overrides config file)
        #[arg(short, long)]
        interval: Option<Interval>,

        /// Output directory (overrides config file)
        #[arg(short, long)]
        output: Option<String>,

        /// Training range start (YYYY-MM-DD)
        #[arg(long)]
        train_start: Option<NaiveDate>,

        /// Training range end, exclusive (YYYY-MM-DD)
        #[arg(long)]
        train_end: Option<NaiveDate>,

        /// Validation range start (YYYY-MM-DD)
        #[arg(long)]
        valid_start: Option<NaiveDate>,

        /// Validation range end, exclusive (YYYY-MM-DD)
        #[arg(long)]
        valid_end: Option<NaiveDate>,
    },

    /// Fetch one date range into a single CSV file
    Fetch {
        /// Symbol to download. E.g., "EURUSD=X"
        #[arg(short, long)]
        symbol: String,

        /// Range start (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Range end, exclusive (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Bar interval: 1d, 1wk or 1mo
        #[arg(short, long, default_value = "1d")]
        interval: Interval,

        /// Output CSV file
        #[arg(long)]
        out: PathBuf,
    },

    /// Print a summary of a downloaded CSV file
    Inspect {
        /// CSV file to read
        file: PathBuf,
    },
}

fn setup_logging(verbose: bool, command_name: &str, log_dir: &str, file_only: bool) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    // Log file naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from(log_dir).join(&log_filename);

    // Keep HTTP internals quiet unless RUST_LOG says otherwise
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never(log_dir, &log_filename);

    // Built per branch: the layer's subscriber type differs between the two stacks
    macro_rules! file_layer {
        () => {
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
        };
    }

    if file_only {
        // Console stays clean for the progress bar
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer!())
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer!())
            .init();
    }

    info!("Log file: {}", log_path.display());

    Ok(())
}

/// Log file prefix and whether console logging is suppressed for a command
fn log_profile(command: &Commands) -> (&'static str, bool) {
    match command {
        Commands::Download { .. } => ("download", true), // File-only for clean progress bar
        Commands::Fetch { .. } => ("fetch", false),
        Commands::Inspect { .. } => ("inspect", false),
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let (command_name, file_only) = log_profile(&cli.command);
    setup_logging(cli.verbose, command_name, &cli.log_dir, file_only)?;

    match cli.command {
        Commands::Download {
            config,
            symbol,
            interval,
            output,
            train_start,
            train_end,
            valid_start,
            valid_end,
        } => commands::download::run(commands::download::Overrides {
            config,
            symbol,
            interval,
            output,
            train_start,
            train_end,
            valid_start,
            valid_end,
        }),

        Commands::Fetch {
            symbol,
            start,
            end,
            interval,
            out,
        } => commands::fetch::run(symbol, start, end, interval, out),

        Commands::Inspect { file } => commands::inspect::run(file),
    }
}
