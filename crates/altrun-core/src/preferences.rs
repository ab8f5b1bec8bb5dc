use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visitor consent for automatic location detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPreferences {
    pub auto_detect_enabled: bool,
    pub has_been_prompted: bool,
    pub last_prompt_date: Option<DateTime<Utc>>,
    pub manually_disabled: bool,
}

impl Default for LocationPreferences {
    fn default() -> Self {
        Self {
            auto_detect_enabled: true,
            has_been_prompted: false,
            last_prompt_date: None,
            manually_disabled: false,
        }
    }
}

impl LocationPreferences {
    /// Whether auto-detection may run for this visitor.
    #[must_use]
    pub fn detection_allowed(&self) -> bool {
        self.auto_detect_enabled && !self.manually_disabled
    }

    /// Shallow-merges `update` into `self`. Unset fields are left alone.
    pub fn apply(&mut self, update: &PreferencesUpdate) {
        if let Some(v) = update.auto_detect_enabled {
            self.auto_detect_enabled = v;
        }
        if let Some(v) = update.has_been_prompted {
            self.has_been_prompted = v;
        }
        if let Some(v) = update.last_prompt_date {
            self.last_prompt_date = v;
        }
        if let Some(v) = update.manually_disabled {
            self.manually_disabled = v;
        }
    }
}

/// Partial update for [`LocationPreferences`].
///
/// `last_prompt_date` is doubly optional so an update can clear the date
/// (`Some(None)`) as well as leave it untouched (`None`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferencesUpdate {
    pub auto_detect_enabled: Option<bool>,
    pub has_been_prompted: Option<bool>,
    pub last_prompt_date: Option<Option<DateTime<Utc>>>,
    pub manually_disabled: Option<bool>,
}
