use std::sync::Arc;
use std::time::Duration;

use altrun_core::{Accuracy, Country, DetectedLocation, ManualFilters, SourceTag};
use altrun_filters::{FilterSession, SessionConfig};
use chrono::NaiveDate;

use super::*;
use crate::filters::resolve_session;

fn session() -> FilterSession {
    FilterSession::start_with_clock(
        SessionConfig::default(),
        Arc::new(|| NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()),
    )
}

fn seattle() -> DetectedLocation {
    DetectedLocation {
        latitude: 47.61,
        longitude: -122.33,
        country: Country::Usa,
        state: "WA".to_owned(),
        city: "Seattle".to_owned(),
        accuracy: Accuracy::City,
        candidate_cities: Vec::new(),
    }
}

async fn detected_after(ms: u64, location: Option<DetectedLocation>) -> Option<DetectedLocation> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    location
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["altrun"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_detect_defaults_to_cached() {
    let cli = Cli::try_parse_from(["altrun", "detect"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Detect { refresh: false })
    ));
}

#[test]
fn parses_detect_refresh() {
    let cli = Cli::try_parse_from(["altrun", "detect", "--refresh"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Detect { refresh: true })));
}

#[test]
fn parses_prefs_subcommands() {
    let cli = Cli::try_parse_from(["altrun", "prefs", "disable"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Prefs {
            command: PrefsCommands::Disable
        })
    ));

    let cli = Cli::try_parse_from(["altrun", "prefs", "reset"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Prefs {
            command: PrefsCommands::Reset
        })
    ));
}

#[test]
fn parses_cache_clear() {
    let cli = Cli::try_parse_from(["altrun", "cache", "clear"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cache {
            command: CacheCommands::Clear
        })
    ));
}

#[test]
fn parses_filters_with_country_alias() {
    let cli = Cli::try_parse_from(["altrun", "filters", "--country", "ca", "--state", "Ontario"])
        .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Filters {
            filters: FilterArgs {
                country: Some(Country::Can),
                state: Some(ref s),
                ..
            },
            events: None,
        }) if s == "Ontario"
    ));
}

#[test]
fn rejects_unsupported_country() {
    assert!(Cli::try_parse_from(["altrun", "filters", "--country", "MX"]).is_err());
}

#[test]
fn rejects_out_of_range_month() {
    assert!(Cli::try_parse_from(["altrun", "events", "--month", "13"]).is_err());
}

#[test]
fn events_limit_defaults_to_fifty() {
    let cli = Cli::try_parse_from(["altrun", "events"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Events { limit: 50, .. })
    ));
}

#[test]
fn empty_filter_args_leave_base_untouched() {
    let base = ManualFilters {
        country: Some(Country::Usa),
        state: Some("WA".to_owned()),
        city: Some("Seattle".to_owned()),
        ..ManualFilters::default()
    };
    let args = FilterArgs::default();
    assert!(args.is_empty());
    assert_eq!(args.edit(base.clone()), base);
}

#[test]
fn new_country_clears_detected_state_and_city() {
    let base = ManualFilters {
        country: Some(Country::Usa),
        state: Some("WA".to_owned()),
        city: Some("Seattle".to_owned()),
        month: Some(10),
        day: Some(18),
        ..ManualFilters::default()
    };
    let args = FilterArgs {
        country: Some(Country::Can),
        ..FilterArgs::default()
    };
    let edit = args.edit(base);
    assert_eq!(edit.country, Some(Country::Can));
    assert!(edit.state.is_none());
    assert!(edit.city.is_none());
    assert_eq!(edit.month, Some(10));
}

#[test]
fn state_names_are_normalized_against_the_country() {
    let args = FilterArgs {
        country: Some(Country::Can),
        state: Some("Quebec".to_owned()),
        city: Some("Montreal".to_owned()),
        ..FilterArgs::default()
    };
    let edit = args.edit(ManualFilters::default());
    assert_eq!(edit.state.as_deref(), Some("QC"));
    assert_eq!(edit.city.as_deref(), Some("Montreal"));
}

#[test]
fn day_alone_keeps_existing_month() {
    let base = ManualFilters {
        month: Some(10),
        day: Some(18),
        ..ManualFilters::default()
    };
    let args = FilterArgs {
        day: Some(1),
        ..FilterArgs::default()
    };
    let edit = args.edit(base);
    assert_eq!(edit.month, Some(10));
    assert_eq!(edit.day, Some(1));
}

#[tokio::test(start_paused = true)]
async fn session_without_args_returns_detected_filters() {
    let active = resolve_session(session(), detected_after(100, Some(seattle())), &FilterArgs::default())
        .await
        .unwrap();
    assert_eq!(active.source, SourceTag::Auto);
    assert_eq!(active.city.as_deref(), Some("Seattle"));
}

#[tokio::test(start_paused = true)]
async fn city_arg_is_layered_over_detected_location() {
    let args = FilterArgs {
        city: Some("Tacoma".to_owned()),
        ..FilterArgs::default()
    };
    let active = resolve_session(session(), detected_after(100, Some(seattle())), &args)
        .await
        .unwrap();
    assert_eq!(active.source, SourceTag::Manual);
    assert_eq!(active.country, Some(Country::Usa));
    assert_eq!(active.state.as_deref(), Some("WA"));
    assert_eq!(active.city.as_deref(), Some("Tacoma"));
    assert_eq!((active.month, active.day), (Some(10), Some(18)));
}

#[tokio::test(start_paused = true)]
async fn missing_detection_falls_back_to_default() {
    let active = resolve_session(session(), detected_after(100, None), &FilterArgs::default())
        .await
        .unwrap();
    assert_eq!(active.source, SourceTag::Default);
    assert!(active.country.is_none());
}

#[tokio::test(start_paused = true)]
async fn detection_slower_than_default_is_ignored() {
    let active = resolve_session(session(), detected_after(9_000, Some(seattle())), &FilterArgs::default())
        .await
        .unwrap();
    assert_eq!(active.source, SourceTag::Default);
    assert!(active.city.is_none());
}

#[tokio::test(start_paused = true)]
async fn country_arg_is_layered_over_default() {
    let args = FilterArgs {
        country: Some(Country::Can),
        ..FilterArgs::default()
    };
    let active = resolve_session(session(), detected_after(100, None), &args)
        .await
        .unwrap();
    assert_eq!(active.source, SourceTag::Manual);
    assert_eq!(active.country, Some(Country::Can));
    assert!(active.state.is_none());
    assert_eq!((active.month, active.day), (Some(10), Some(18)));
}
