//! # hypr-settings
//!
//! Configuration management with layered sources for the chat transport.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ChatSettings::default()`]
//! 2. **User file**: `~/.hypr/chat-settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `HYPR_CHAT_*` overrides (highest priority)
//!
//! The global cache is reloadable: [`reload_settings_from_path`] swaps the
//! cached value so subsequent [`get_settings`] calls return fresh data.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

/// Global settings cache.
static SETTINGS: RwLock<Option<Arc<ChatSettings>>> = parking_lot::const_rwlock(None);

/// Get the global settings instance.
///
/// On first call, loads settings from disk with env overrides. On later
/// calls, returns the cached value. If loading fails, returns compiled
/// defaults.
pub fn get_settings() -> Arc<ChatSettings> {
    if let Some(s) = SETTINGS.read().as_ref() {
        return Arc::clone(s);
    }

    let mut guard = SETTINGS.write();
    // Another thread may have initialized while we waited for the write lock.
    if let Some(s) = guard.as_ref() {
        return Arc::clone(s);
    }

    let settings = Arc::new(match load_settings() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            ChatSettings::default()
        }
    });
    *guard = Some(Arc::clone(&settings));
    settings
}

/// Initialize the global settings with a specific value.
///
/// Replaces any previously cached settings.
pub fn init_settings(settings: ChatSettings) {
    *SETTINGS.write() = Some(Arc::new(settings));
}

/// Reload settings from `path` and swap the global cache.
pub fn reload_settings_from_path(path: &Path) {
    let new = Arc::new(match load_settings_from_path(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, ?path, "failed to reload settings, falling back to defaults");
            ChatSettings::default()
        }
    });
    *SETTINGS.write() = Some(new);
    tracing::info!(?path, "settings reloaded from disk");
}
