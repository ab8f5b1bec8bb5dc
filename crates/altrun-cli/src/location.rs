//! `detect`, `prefs` and `cache` command handlers.

use clap::Subcommand;

use crate::context::AppContext;

#[derive(Debug, Subcommand)]
pub enum PrefsCommands {
    /// Print the stored consent preferences
    Show,
    /// Allow automatic location detection
    Enable,
    /// Opt out of automatic location detection
    Disable,
    /// Record that the consent prompt was shown now
    Prompted,
    /// Forget all stored decisions
    Reset,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommands {
    /// Print the cached location, if still fresh
    Show,
    /// Drop the cached location
    Clear,
}

pub(crate) async fn run_detect(ctx: &AppContext, refresh: bool) -> anyhow::Result<()> {
    let service = ctx.location_service()?;
    let location = if refresh {
        service.refresh().await
    } else {
        service.resolve().await
    };
    match location {
        Some(location) => println!("{}", serde_json::to_string_pretty(&location)?),
        None => println!("no supported location detected"),
    }
    Ok(())
}

pub(crate) fn run_prefs(ctx: &AppContext, command: &PrefsCommands) -> anyhow::Result<()> {
    let store = ctx.preferences();
    let prefs = match command {
        PrefsCommands::Show => store.load()?,
        PrefsCommands::Enable => store.enable_auto_detect()?,
        PrefsCommands::Disable => store.disable_auto_detect()?,
        PrefsCommands::Prompted => store.mark_prompted(chrono::Utc::now())?,
        PrefsCommands::Reset => {
            store.reset()?;
            store.load()?
        }
    };
    println!("{}", serde_json::to_string_pretty(&prefs)?);
    Ok(())
}

pub(crate) fn run_cache(ctx: &AppContext, command: &CacheCommands) -> anyhow::Result<()> {
    let cache = ctx.cache();
    match command {
        CacheCommands::Show => match cache.read()? {
            Some(location) => println!("{}", serde_json::to_string_pretty(&location)?),
            None => println!("location cache is empty"),
        },
        CacheCommands::Clear => {
            cache.clear()?;
            println!("location cache cleared");
        }
    }
    Ok(())
}
