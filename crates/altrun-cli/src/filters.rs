//! `filters` and `events` command handlers.
//!
//! `filters` runs one full resolution session: detection races the default
//! timer, then any dropdown values given on the command line are applied as a
//! manual edit on top of whatever won.

use std::future::Future;
use std::sync::Arc;

use altrun_core::{
    normalize_region, ActiveFilterSet, Country, DetectedLocation, FilterSource, ManualFilters,
};
use altrun_filters::FilterSession;
use chrono::NaiveDate;
use clap::Args;

use crate::context::AppContext;

/// Dropdown values, as a visitor would pick them.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Country code (USA or CAN)
    #[arg(long)]
    pub country: Option<Country>,
    /// State or province, code or full name
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=31))]
    pub day: Option<u32>,
    #[arg(long)]
    pub event_type: Option<String>,
}

impl FilterArgs {
    pub(crate) fn is_empty(&self) -> bool {
        self.country.is_none()
            && self.state.is_none()
            && self.city.is_none()
            && self.month.is_none()
            && self.day.is_none()
            && self.event_type.is_none()
    }

    /// Layers the given values over `base` in dropdown order, so a new
    /// country clears the state and city below it.
    pub(crate) fn edit(&self, base: ManualFilters) -> ManualFilters {
        let mut edit = base;
        if let Some(country) = self.country {
            edit = edit.with_country(Some(country));
        }
        if let Some(state) = &self.state {
            let state = match edit.country {
                Some(country) => normalize_region(country, state),
                None => state.trim().to_owned(),
            };
            edit = edit.with_state(Some(state));
        }
        if let Some(city) = &self.city {
            edit = edit.with_city(Some(city.trim().to_owned()));
        }
        if self.month.is_some() || self.day.is_some() {
            let month = self.month.or(edit.month);
            let day = self.day.or(edit.day);
            edit = edit.with_date(month, day);
        }
        if let Some(event_type) = &self.event_type {
            edit = edit.with_event_type(Some(event_type.clone()));
        }
        edit
    }
}

pub(crate) async fn run_filters(
    ctx: &AppContext,
    args: &FilterArgs,
    events: Option<usize>,
) -> anyhow::Result<()> {
    let service = Arc::new(ctx.location_service()?);
    let session = FilterSession::start(ctx.session_config());
    let active = resolve_session(session, async move { service.resolve().await }, args).await?;

    println!("{}", serde_json::to_string_pretty(&active)?);

    if let Some(limit) = events {
        print_events(ctx, &active, today(), limit).await?;
    }
    Ok(())
}

/// Races `detection` against the session's default timer, then layers any
/// command-line values over whichever source won. The session is closed
/// before returning.
pub(crate) async fn resolve_session<F>(
    session: FilterSession,
    detection: F,
    args: &FilterArgs,
) -> anyhow::Result<ActiveFilterSet>
where
    F: Future<Output = Option<DetectedLocation>> + Send + 'static,
{
    let detection = session.spawn_detection(detection);

    let Some(mut active) = session.resolved().await else {
        anyhow::bail!("filter session closed before resolving");
    };
    tracing::debug!(source = %active.source, "initial filters");

    if !args.is_empty() {
        let edit = args.edit(ManualFilters::from_active(&active));
        if session.handle().deliver_manual(edit).await {
            if let Some(set) = session.active() {
                active = set;
            }
        }
    }
    session.close();
    detection.abort();
    Ok(active)
}

pub(crate) async fn run_events(
    ctx: &AppContext,
    args: &FilterArgs,
    limit: usize,
) -> anyhow::Result<()> {
    let today = today();
    let filters = ActiveFilterSet::from_source(
        FilterSource::Manual(args.edit(ManualFilters::default())),
        today,
    );
    print_events(ctx, &filters, today, limit).await
}

async fn print_events(
    ctx: &AppContext,
    filters: &ActiveFilterSet,
    today: NaiveDate,
    limit: usize,
) -> anyhow::Result<()> {
    let client = ctx.require_events()?;
    let events = client.list_events(filters, today, limit).await?;
    tracing::info!(count = events.len(), "fetched events");
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
