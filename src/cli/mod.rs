pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rssfetcher")]
#[command(about = "Periodic RSS/Atom ingestion into a local item store", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a feed source
    Add {
        /// URL of the feed
        url: String,

        /// Display name stamped onto ingested items
        #[arg(short, long)]
        name: String,

        /// Category name
        #[arg(short, long)]
        category: String,

        /// Optional subcategory name
        #[arg(short, long)]
        subcategory: Option<String>,

        /// Language code, e.g. "en" or "fi"
        #[arg(short, long, default_value = "")]
        language: String,

        /// Homepage of the source
        #[arg(long)]
        site_url: Option<String>,
    },
    /// Remove a feed source (it stays on record but is no longer fetched)
    Remove {
        /// URL of the feed to remove
        url: String,
    },
    /// List feed sources
    Sources {
        /// Include removed sources
        #[arg(long)]
        all: bool,
    },
    /// List stored items, newest first
    Items {
        /// Maximum number of items
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },
    /// Run one ingestion cycle over all active sources
    Update,
    /// Run ingestion cycles periodically until interrupted
    Run {
        /// Cycle interval (e.g. "80s", "5m", "1h"); defaults to the config value
        #[arg(short, long)]
        interval: Option<String>,

        /// Skip the cycle that normally runs at startup
        #[arg(long)]
        no_initial_update: bool,
    },
}
