//! Preference store port
//!
//! Durable user-level preferences. The router only reads them; the
//! orchestrator's preference handlers update or clear them.

use finsense_domain::{PreferenceField, Preferences};

pub trait PreferenceStore: Send + Sync {
    /// Snapshot of the current preferences
    fn get(&self) -> Preferences;

    /// Replace the stored preferences
    fn update(&self, preferences: Preferences);

    /// Reset to empty preferences
    fn clear(&self);

    fn is_complete(&self) -> bool {
        self.get().is_complete()
    }

    fn missing_fields(&self) -> Vec<PreferenceField> {
        self.get().missing_fields()
    }
}
