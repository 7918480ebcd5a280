//! Transit Watch - live subway arrival favorites
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use twatch_app::config;
use twatch_core::prelude::*;
use twatch_core::FavoriteEntity;

/// Transit Watch - live subway arrival favorites
#[derive(Parser, Debug)]
#[command(name = "twatch")]
#[command(about = "Live arrival times for your favorite subway stops", long_about = None)]
struct Args {
    /// Directory holding config.toml and favorites.toml
    #[arg(long, value_name = "DIR", global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll favorites and stream NDJSON events to stdout (default)
    Watch,

    /// Add a favorite
    Add {
        #[arg(long)]
        line: String,
        #[arg(long)]
        station: String,
        #[arg(long)]
        direction: String,
        /// Station name to show instead of the API name
        #[arg(long)]
        display: Option<String>,
    },

    /// Remove a favorite
    Remove {
        #[arg(long)]
        line: String,
        #[arg(long)]
        station: String,
        #[arg(long)]
        direction: String,
    },

    /// List favorites
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    color_eyre::install().map_err(|e| Error::config(e.to_string()))?;
    twatch_core::logging::init()?;

    let config_dir = args
        .config_dir
        .unwrap_or_else(config::default_config_dir);

    let mut stdout = std::io::stdout();
    let result = match args.command.unwrap_or(Command::Watch) {
        Command::Watch => transit_watch::run_headless(&config_dir).await,
        Command::Add {
            line,
            station,
            direction,
            display,
        } => {
            let mut favorite = FavoriteEntity::new(line, station, direction);
            if let Some(display) = display {
                favorite = favorite.with_display(display);
            }
            transit_watch::commands::add(&config_dir, favorite, &mut stdout)
        }
        Command::Remove {
            line,
            station,
            direction,
        } => transit_watch::commands::remove(&config_dir, &line, &station, &direction, &mut stdout),
        Command::List => transit_watch::commands::list(&config_dir, &mut stdout),
    };

    if let Err(ref e) = result {
        error!("Application error: {:?}", e);
    }

    info!("Transit Watch exiting");
    result
}
