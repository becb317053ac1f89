pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::trip::TripArgs;

#[derive(Debug, Parser)]
#[command(
    name = "farecast",
    about = "Farecast operator CLI",
    long_about = "Price trips, project fares, get travel advice and inspect Farecast configuration.",
    after_help = "Examples:\n  farecast estimate --distance 5 --duration 15 --class sedan --location Chicago\n  farecast predict --distance 12 --duration 30 --time-of-day morning_rush --json\n  farecast doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Estimate the fare, contextual factors and eco metrics for one trip")]
    Estimate {
        #[command(flatten)]
        trip: TripArgs,
        #[arg(long, help = "Bill up to five passengers and show a ±10% range")]
        quick: bool,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Project the fare over the coming horizon")]
    Predict {
        #[command(flatten)]
        trip: TripArgs,
        #[arg(long, help = "Projection horizon in minutes (defaults to config)")]
        horizon: Option<u32>,
        #[arg(long, help = "Minutes between projected points (defaults to config)")]
        step: Option<u32>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run the full pipeline and print travel suggestions")]
    Advise {
        #[command(flatten)]
        trip: TripArgs,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and run pricing self-checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Estimate { trip, quick, json } => commands::estimate::run(&trip, quick, json),
        Command::Predict { trip, horizon, step, json } => {
            commands::predict::run(&trip, horizon, step, json)
        }
        Command::Advise { trip, json } => commands::advise::run(&trip, json),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
