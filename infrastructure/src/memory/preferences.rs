//! In-memory preference store.

use finsense_application::ports::preference_store::PreferenceStore;
use finsense_domain::Preferences;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryPreferences {
    current: RwLock<Preferences>,
}

impl InMemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferences(preferences: Preferences) -> Self {
        Self {
            current: RwLock::new(preferences),
        }
    }
}

impl PreferenceStore for InMemoryPreferences {
    fn get(&self) -> Preferences {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn update(&self, preferences: Preferences) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = preferences;
    }

    fn clear(&self) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Preferences::default();
    }
}
