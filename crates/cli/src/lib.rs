pub mod commands;

use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use medirent_core::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "medirent",
    about = "Medirent booking operator CLI",
    long_about = "Price rental spans, inspect policy configuration, and walk demo bookings through the rental flow.",
    after_help = "Examples:\n  medirent quote --start 2026-03-01 --end 2026-03-07 --daily 85 --weekly 450 --monthly 1200\n  medirent book --start 2026-03-01 --end 2026-03-07\n  medirent config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a rental span against a rate table and print the breakdown")]
    Quote {
        #[arg(long, help = "Rental start date (inclusive), e.g. 2026-03-01")]
        start: NaiveDate,
        #[arg(long, help = "Rental end date (inclusive)")]
        end: NaiveDate,
        #[arg(long, help = "Daily rate in currency units")]
        daily: Decimal,
        #[arg(long, help = "Weekly rate in currency units")]
        weekly: Decimal,
        #[arg(long, help = "Monthly rate in currency units")]
        monthly: Decimal,
    },
    #[command(about = "Drive a demo booking through the full rental flow with seeded fixtures")]
    Book {
        #[arg(long, default_value = "durban", help = "Service branch id")]
        branch: String,
        #[arg(long, default_value = "wheelchair", help = "Equipment category id")]
        category: String,
        #[arg(long, help = "Rental start date (inclusive)")]
        start: NaiveDate,
        #[arg(long, help = "Rental end date (inclusive)")]
        end: NaiveDate,
    },
    #[command(about = "Inspect effective policy configuration values")]
    Config,
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    let result = match config.logging.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .compact()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .pretty()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .json()
            .try_init(),
    };
    // A second init in the same process is harmless.
    let _ = result;
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }
    tracing::debug!("medirent cli invoked");

    let result = match cli.command {
        Command::Quote { start, end, daily, weekly, monthly } => {
            commands::quote::run(start, end, daily, weekly, monthly)
        }
        Command::Book { branch, category, start, end } => {
            commands::book::run(branch, category, start, end)
        }
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
