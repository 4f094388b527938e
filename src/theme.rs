use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::storage::{self, KeyValueStore, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

/// Persisted theme preference
pub struct ThemeStore {
    preference: ThemePreference,
    storage: Arc<dyn KeyValueStore>,
}

impl ThemeStore {
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let preference = storage::load_json(storage.as_ref(), THEME_KEY).unwrap_or_default();
        Self { preference, storage }
    }

    pub fn get(&self) -> ThemePreference {
        self.preference
    }

    pub fn set(&mut self, preference: ThemePreference) {
        self.preference = preference;
        storage::save_json(self.storage.as_ref(), THEME_KEY, &self.preference);
    }

    /// Light and dark swap; system resolves to dark
    pub fn toggle(&mut self) -> ThemePreference {
        let next = match self.preference {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
            ThemePreference::System => ThemePreference::Dark,
        };
        self.set(next);
        next
    }
}
