//! Stellar Frontier - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use galaxy_core::data::GameConfig;
use galaxy_test_utils::balance::Matchup;
use galaxy_tools::battle::{parse_counts, run_batch};
use galaxy_tools::validate::{dump_default_config, validate_config_file};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "galaxy-tools")]
#[command(about = "Development tools for Stellar Frontier")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a RON config file
    Validate {
        /// Path to the config file
        path: PathBuf,
    },
    /// Print the default config as RON
    DumpConfig,
    /// Run a batch of seeded battles
    Battle {
        /// Attacking ships, e.g. "light_fighter=10,cruiser=2"
        #[arg(long)]
        attacker: String,
        /// Defending ships
        #[arg(long, default_value = "")]
        defender_fleet: String,
        /// Defending structures, e.g. "rocket_launcher=20"
        #[arg(long, default_value = "")]
        defense: String,
        /// Seed of the first battle
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Number of battles
        #[arg(long, default_value_t = 100)]
        runs: u32,
        /// Config file to use instead of the defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn run(command: Commands) -> galaxy_tools::Result<()> {
    match command {
        Commands::Validate { path } => {
            tracing::info!("Validating config: {}", path.display());
            validate_config_file(&path)?;
            tracing::info!("Validation passed");
        }
        Commands::DumpConfig => println!("{}", dump_default_config()?),
        Commands::Battle {
            attacker,
            defender_fleet,
            defense,
            seed,
            runs,
            config,
            json,
        } => {
            let config = match config {
                Some(path) => validate_config_file(&path)?,
                None => GameConfig::default(),
            };
            let matchup = Matchup {
                attacker: parse_counts(&attacker)?,
                defender_fleet: parse_counts(&defender_fleet)?,
                defender_defense: parse_counts(&defense)?,
            };
            let report = run_batch(matchup, &config, seed, runs)?;
            if json {
                println!("{}", report.to_json()?);
            } else {
                println!("{}", report.to_text());
            }
        }
    }
    Ok(())
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
