//! Persistent consent preferences for location detection.

use std::sync::Arc;

use altrun_core::{LocationPreferences, PreferencesUpdate};
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::kv::KeyValueStore;

const PREFERENCES_KEY: &str = "altrun.location.preferences";

pub struct LocationPreferenceStore {
    store: Arc<dyn KeyValueStore>,
}

impl LocationPreferenceStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Loads the persisted preferences, or the defaults when nothing usable
    /// has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn load(&self) -> Result<LocationPreferences, StoreError> {
        let Some(raw) = self.store.get(PREFERENCES_KEY)? else {
            return Ok(LocationPreferences::default());
        };
        match serde_json::from_str(&raw) {
            Ok(prefs) => Ok(prefs),
            Err(e) => {
                tracing::warn!(error = %e, "stored location preferences unreadable, using defaults");
                Ok(LocationPreferences::default())
            }
        }
    }

    /// Merges `update` into the stored record and persists it immediately.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record cannot be read, encoded or stored.
    pub fn save(&self, update: &PreferencesUpdate) -> Result<LocationPreferences, StoreError> {
        let mut prefs = self.load()?;
        prefs.apply(update);
        let raw = serde_json::to_string(&prefs).map_err(|source| StoreError::Json {
            context: PREFERENCES_KEY.to_owned(),
            source,
        })?;
        self.store.set(PREFERENCES_KEY, &raw)?;
        Ok(prefs)
    }

    /// Visitor opted in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record cannot be stored.
    pub fn enable_auto_detect(&self) -> Result<LocationPreferences, StoreError> {
        self.save(&PreferencesUpdate {
            auto_detect_enabled: Some(true),
            manually_disabled: Some(false),
            ..PreferencesUpdate::default()
        })
    }

    /// Visitor opted out. Detection stays off until re-enabled.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record cannot be stored.
    pub fn disable_auto_detect(&self) -> Result<LocationPreferences, StoreError> {
        self.save(&PreferencesUpdate {
            auto_detect_enabled: Some(false),
            manually_disabled: Some(true),
            ..PreferencesUpdate::default()
        })
    }

    /// Records that the consent prompt was shown at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record cannot be stored.
    pub fn mark_prompted(&self, now: DateTime<Utc>) -> Result<LocationPreferences, StoreError> {
        self.save(&PreferencesUpdate {
            has_been_prompted: Some(true),
            last_prompt_date: Some(Some(now)),
            ..PreferencesUpdate::default()
        })
    }

    /// Whether the consent prompt should be shown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn should_prompt(&self) -> Result<bool, StoreError> {
        let prefs = self.load()?;
        Ok(!prefs.has_been_prompted && !prefs.manually_disabled)
    }

    /// Forgets every stored decision.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.store.delete(PREFERENCES_KEY)
    }
}
