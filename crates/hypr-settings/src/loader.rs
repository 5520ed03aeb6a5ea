//! Settings loading: compiled defaults → user file → environment.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::ChatSettings;

/// Environment variable that overrides the settings file location.
pub const SETTINGS_PATH_ENV: &str = "HYPR_CHAT_SETTINGS";

/// Default settings file location: `~/.hypr/chat-settings.json`.
///
/// [`SETTINGS_PATH_ENV`] takes precedence when set.
pub fn settings_path() -> PathBuf {
    if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".hypr").join("chat-settings.json")
}

/// Load settings from [`settings_path`] with env overrides applied.
pub fn load_settings() -> Result<ChatSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from `path`.
///
/// A missing file is not an error: compiled defaults are used. The file is
/// deep-merged over defaults, then `HYPR_CHAT_*` env overrides are applied
/// and the result is validated.
pub fn load_settings_from_path(path: &Path) -> Result<ChatSettings> {
    let defaults = serde_json::to_value(ChatSettings::default())?;

    let merged = if path.exists() {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "loaded user settings");
        deep_merge(defaults, user)
    } else {
        debug!(?path, "no settings file, using defaults");
        defaults
    };

    let mut settings: ChatSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings.validate();
    Ok(settings)
}

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key; any other overlay value (including arrays)
/// replaces the base value. `null` in the overlay leaves the base alone.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                let _ = base.insert(key, merged);
            }
            Value::Object(base)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Apply `HYPR_CHAT_*` overrides using `lookup` to read variables.
///
/// Unparseable values are ignored with a warning.
pub fn apply_env_overrides(settings: &mut ChatSettings, lookup: impl Fn(&str) -> Option<String>) {
    fn parse_into<T: std::str::FromStr>(name: &str, raw: Option<String>, target: &mut T) {
        if let Some(raw) = raw {
            match raw.trim().parse() {
                Ok(v) => *target = v,
                Err(_) => warn!(name, value = %raw, "ignoring unparseable env override"),
            }
        }
    }

    parse_into(
        "HYPR_CHAT_MAX_TOOL_STEPS",
        lookup("HYPR_CHAT_MAX_TOOL_STEPS"),
        &mut settings.agent.max_tool_steps,
    );
    parse_into(
        "HYPR_CHAT_WINDOW_THRESHOLD",
        lookup("HYPR_CHAT_WINDOW_THRESHOLD"),
        &mut settings.window.threshold,
    );
    parse_into(
        "HYPR_CHAT_WINDOW_KEEP",
        lookup("HYPR_CHAT_WINDOW_KEEP"),
        &mut settings.window.keep,
    );
    parse_into(
        "HYPR_CHAT_LOG_JSON",
        lookup("HYPR_CHAT_LOG_JSON"),
        &mut settings.logging.json,
    );
    if let Some(level) = lookup("HYPR_CHAT_LOG_LEVEL") {
        settings.logging.level = level;
    }
    if let Some(instructions) = lookup("HYPR_CHAT_INSTRUCTIONS") {
        settings.agent.instructions = Some(instructions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn deep_merge_nested() {
        let merged = deep_merge(
            json!({"window": {"threshold": 20, "keep": 10}, "agent": {"maxToolSteps": 5}}),
            json!({"window": {"keep": 3}}),
        );
        assert_eq!(merged["window"]["threshold"], 20);
        assert_eq!(merged["window"]["keep"], 3);
        assert_eq!(merged["agent"]["maxToolSteps"], 5);
    }

    #[test]
    fn deep_merge_null_keeps_base() {
        let merged = deep_merge(json!({"a": 1}), json!({"a": null}));
        assert_eq!(merged["a"], 1);
    }

    #[test]
    fn deep_merge_scalar_replaces_object() {
        let merged = deep_merge(json!({"a": {"b": 1}}), json!({"a": 2}));
        assert_eq!(merged["a"], 2);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.window, crate::WindowSettings::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat-settings.json");
        std::fs::write(&path, r#"{"agent": {"maxToolSteps": 3}, "logging": {"json": true}}"#).unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.agent.max_tool_steps, 3);
        assert!(settings.logging.json);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat-settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_settings_from_path(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn wrong_type_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat-settings.json");
        std::fs::write(&path, r#"{"window": {"threshold": "lots"}}"#).unwrap();

        let err = load_settings_from_path(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Schema(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let mut settings = ChatSettings::default();
        apply_env_overrides(
            &mut settings,
            env(&[
                ("HYPR_CHAT_MAX_TOOL_STEPS", "8"),
                ("HYPR_CHAT_WINDOW_KEEP", " 6 "),
                ("HYPR_CHAT_LOG_LEVEL", "hypr_transport=debug"),
                ("HYPR_CHAT_LOG_JSON", "true"),
            ]),
        );
        assert_eq!(settings.agent.max_tool_steps, 8);
        assert_eq!(settings.window.keep, 6);
        assert_eq!(settings.logging.level, "hypr_transport=debug");
        assert!(settings.logging.json);
    }

    #[test]
    fn bad_env_value_is_ignored() {
        let mut settings = ChatSettings::default();
        apply_env_overrides(&mut settings, env(&[("HYPR_CHAT_WINDOW_THRESHOLD", "many")]));
        assert_eq!(settings.window.threshold, 20);
    }
}
