//! Filter resolution state machine.
//!
//! ```text
//! Idle --start--> WaitingForSignal --Auto | DefaultElapsed--> Resolved(auto | default)
//!                        |                                          |
//!                        +------------------Manual------------------+--> Resolved(manual)
//! ```
//!
//! `Auto` and `DefaultElapsed` only apply while nothing has resolved, so each
//! fires at most once per session. `Manual` always applies.

use altrun_core::{ActiveFilterSet, DetectedLocation, FilterSource, ManualFilters, SourceTag};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    Idle,
    WaitingForSignal,
    Resolved(SourceTag),
}

/// An input to the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSignal {
    Auto(DetectedLocation),
    Manual(ManualFilters),
    DefaultElapsed,
}

#[derive(Debug)]
pub struct FilterReconciler {
    state: ReconcilerState,
    active: Option<ActiveFilterSet>,
}

impl Default for FilterReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterReconciler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ReconcilerState::Idle,
            active: None,
        }
    }

    /// Begins waiting for a signal. No-op unless idle.
    pub fn start(&mut self) {
        if self.state == ReconcilerState::Idle {
            self.state = ReconcilerState::WaitingForSignal;
        }
    }

    #[must_use]
    pub fn state(&self) -> ReconcilerState {
        self.state
    }

    #[must_use]
    pub fn active(&self) -> Option<&ActiveFilterSet> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self.state, ReconcilerState::Resolved(_))
    }

    /// Feeds one signal through the state machine.
    ///
    /// Returns the new active set when the signal caused a transition, or
    /// `None` when it was ignored.
    pub fn apply(&mut self, signal: FilterSignal, today: NaiveDate) -> Option<ActiveFilterSet> {
        let source = match signal {
            FilterSignal::Manual(manual) => FilterSource::Manual(manual),
            FilterSignal::Auto(location) => {
                if let ReconcilerState::Resolved(by) = self.state {
                    tracing::debug!(resolved_by = %by, "ignoring auto-detected filters");
                    return None;
                }
                FilterSource::Auto(location)
            }
            FilterSignal::DefaultElapsed => {
                if let ReconcilerState::Resolved(by) = self.state {
                    tracing::debug!(resolved_by = %by, "default filter timer found filters already resolved");
                    return None;
                }
                FilterSource::Default
            }
        };

        let tag = source.tag();
        let set = ActiveFilterSet::from_source(source, today);
        tracing::info!(
            source = %tag,
            country = ?set.country,
            state = ?set.state,
            city = ?set.city,
            "filters resolved"
        );
        self.state = ReconcilerState::Resolved(tag);
        self.active = Some(set.clone());
        Some(set)
    }
}
