use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rssfetcher::app::AppContext;
use rssfetcher::cli::{commands, Cli, Commands};
use rssfetcher::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rssfetcher=info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Add {
            url,
            name,
            category,
            subcategory,
            language,
            site_url,
        } => {
            commands::add_source(
                &ctx,
                commands::NewSource {
                    url,
                    name,
                    category,
                    subcategory,
                    language,
                    site_url,
                },
            )?;
        }
        Commands::Remove { url } => {
            commands::remove_source(&ctx, &url)?;
        }
        Commands::Sources { all } => {
            commands::list_sources(&ctx, all)?;
        }
        Commands::Items { limit, json } => {
            commands::list_items(&ctx, limit, json)?;
        }
        Commands::Update => {
            commands::update(&ctx).await?;
        }
        Commands::Run {
            interval,
            no_initial_update,
        } => {
            commands::run(&ctx, interval.as_deref(), no_initial_update).await?;
        }
    }

    Ok(())
}
