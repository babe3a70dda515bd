pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use landed_core::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "landed",
    about = "Landed pricing engine CLI",
    long_about = "Price quotes through the 13-phase landed-cost pipeline and cross-validate \
                  the audit trail against spreadsheet ground truth.",
    after_help = "Examples:\n  landed calculate --input quote.json --rates rates.json\n  landed validate --input quote.json --rates rates.json --expected expected.json --mode detailed\n  landed variables"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a landed.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a quote file against an exchange-rate snapshot")]
    Calculate {
        #[arg(long, help = "Quote file: defaults plus product rows (JSON)")]
        input: PathBuf,
        #[arg(long, help = "Exchange-rate snapshot file (JSON)")]
        rates: PathBuf,
    },
    #[command(about = "Price a quote, then diff its audit trail against ground-truth values")]
    Validate {
        #[arg(long, help = "Quote file: defaults plus product rows (JSON)")]
        input: PathBuf,
        #[arg(long, help = "Exchange-rate snapshot file (JSON)")]
        rates: PathBuf,
        #[arg(long, help = "Ground-truth values per product (JSON)")]
        expected: PathBuf,
        #[arg(long, help = "Comparison mode: summary|detailed (defaults to config)")]
        mode: Option<String>,
        #[arg(long, help = "Absolute tolerance per field (defaults to config)")]
        tolerance: Option<String>,
    },
    #[command(about = "List the calculation variable registry with scopes and fallbacks")]
    Variables,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
        ..Default::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            let result = commands::CommandResult::failure(
                "config",
                "config_validation",
                error.to_string(),
                2,
            );
            println!("{}", result.output);
            return ExitCode::from(result.exit_code);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Calculate { input, rates } => commands::calculate::run(&config, &input, &rates),
        Command::Validate { input, rates, expected, mode, tolerance } => commands::validate::run(
            &config,
            &input,
            &rates,
            &expected,
            mode.as_deref(),
            tolerance.as_deref(),
        ),
        Command::Variables => {
            commands::CommandResult { exit_code: 0, output: commands::variables::run() }
        }
        Command::Config => commands::CommandResult {
            exit_code: 0,
            output: commands::config::run(&config, cli.config.as_deref()),
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
