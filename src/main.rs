use anyhow::Result;
use clap::{Parser, Subcommand};

use oversight::cli::{import, rate, ratings, seed};
use oversight::config::Config;
use oversight::store::Store;

#[derive(Parser)]
#[command(name = "oversight")]
#[command(about = "Congressional committee oversight hearing tracker and rating tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "oversight.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed fixtures: jurisdiction, chambers, categories, congresses,
    /// committee tree
    Seed,

    /// Import committee keys and hearings from the legacy spreadsheets
    Import,

    /// Recompute CHP ratings for every congress and permanent committee
    Rate,

    /// Print the scored ratings table for a congress
    Ratings {
        /// Congress number (defaults to the most recent seeded)
        congress: Option<i64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let config = Config::load(&cli.config).unwrap_or_default();

    // Initialize store
    let store = Store::open(&config.database_path())?;

    match cli.command {
        Commands::Seed => {
            seed::run(&store, &config)?;
        }
        Commands::Import => {
            import::run(&store, &config)?;
        }
        Commands::Rate => {
            rate::run(&store, &config)?;
        }
        Commands::Ratings { congress } => {
            ratings::run(&store, &config, congress)?;
        }
    }

    Ok(())
}
