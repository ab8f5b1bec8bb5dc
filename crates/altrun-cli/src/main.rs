use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod context;
mod filters;
mod location;

use filters::FilterArgs;
use location::{CacheCommands, PrefsCommands};

#[derive(Debug, Parser)]
#[command(name = "altrun")]
#[command(about = "Alt.Run location detection and event filter tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect the visitor's location, honoring consent and the cache
    Detect {
        /// Skip the cache and detect again
        #[arg(long)]
        refresh: bool,
    },
    /// Manage location consent preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },
    /// Inspect or clear the cached location
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Resolve the active filter set for a new session
    Filters {
        #[command(flatten)]
        filters: FilterArgs,
        /// Also list up to N events matching the resolved filters
        #[arg(long)]
        events: Option<usize>,
    },
    /// List upcoming events for explicit filters
    Events {
        #[command(flatten)]
        filters: FilterArgs,
        /// Maximum number of events to list
        #[arg(long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = altrun_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(env = %config.env, store = %config.store_path.display(), "config loaded");
    let ctx = context::AppContext::new(config)?;

    match cli.command {
        Some(Commands::Detect { refresh }) => location::run_detect(&ctx, refresh).await?,
        Some(Commands::Prefs { command }) => location::run_prefs(&ctx, &command)?,
        Some(Commands::Cache { command }) => location::run_cache(&ctx, &command)?,
        Some(Commands::Filters { filters, events }) => {
            filters::run_filters(&ctx, &filters, events).await?;
        }
        Some(Commands::Events { filters, limit }) => {
            filters::run_events(&ctx, &filters, limit).await?;
        }
        None => println!("altrun ready; see --help for commands"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
