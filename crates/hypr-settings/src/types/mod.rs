//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the app's
//! JSON wire format. Each type implements [`Default`] with production
//! values, and `#[serde(default)]` lets a settings file specify only the
//! fields it wants to change.

use serde::{Deserialize, Serialize};

/// Root settings type for the chat transport.
///
/// # JSON Format
///
/// ```json
/// {
///   "agent": { "maxToolSteps": 5 },
///   "window": { "threshold": 20, "keep": 10 },
///   "logging": { "level": "info" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    /// Tool-loop agent settings.
    pub agent: AgentSettings,
    /// History windowing settings.
    pub window: WindowSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl ChatSettings {
    /// Correct invalid invariants in place.
    ///
    /// Called automatically during loading. Bad values are corrected with a
    /// warning rather than rejected.
    pub fn validate(&mut self) {
        if self.agent.max_tool_steps == 0 {
            tracing::warn!("maxToolSteps is 0, using 1");
            self.agent.max_tool_steps = 1;
        }
        if self.window.keep == 0 {
            let default_keep = WindowSettings::default().keep;
            tracing::warn!("window.keep is 0, using {default_keep}");
            self.window.keep = default_keep;
        }
        if self.window.keep > self.window.threshold {
            tracing::warn!(
                keep = self.window.keep,
                threshold = self.window.threshold,
                "window.keep exceeds threshold, clamping"
            );
            self.window.keep = self.window.threshold.max(1);
        }
    }
}

/// Tool-loop agent settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSettings {
    /// Hard cap on model steps per turn.
    pub max_tool_steps: usize,
    /// System instructions. `None` uses the built-in prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tool_steps: 5,
            instructions: None,
        }
    }
}

/// History windowing: above `threshold` messages, keep the last `keep`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowSettings {
    /// Message count above which the history is truncated.
    pub threshold: usize,
    /// Number of most recent messages kept when truncating.
    pub keep: usize,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            threshold: 20,
            keep: 10,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let s = ChatSettings::default();
        assert_eq!(s.agent.max_tool_steps, 5);
        assert_eq!(s.window.threshold, 20);
        assert_eq!(s.window.keep, 10);
        assert_eq!(s.logging.level, "info");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: ChatSettings = serde_json::from_value(json!({"window": {"keep": 4}})).unwrap();
        assert_eq!(s.window.keep, 4);
        assert_eq!(s.window.threshold, 20);
        assert_eq!(s.agent.max_tool_steps, 5);
    }

    #[test]
    fn camel_case_wire_format() {
        let value = serde_json::to_value(ChatSettings::default()).unwrap();
        assert_eq!(value["agent"]["maxToolSteps"], 5);
        assert!(value["agent"].get("instructions").is_none());
    }

    #[test]
    fn validate_fixes_zero_steps() {
        let mut s = ChatSettings::default();
        s.agent.max_tool_steps = 0;
        s.validate();
        assert_eq!(s.agent.max_tool_steps, 1);
    }

    #[test]
    fn validate_clamps_keep_to_threshold() {
        let mut s = ChatSettings::default();
        s.window.keep = 50;
        s.validate();
        assert_eq!(s.window.keep, 20);
    }

    #[test]
    fn validate_fixes_zero_keep() {
        let mut s = ChatSettings::default();
        s.window.keep = 0;
        s.validate();
        assert_eq!(s.window.keep, 10);
    }
}
