//! History windowing applied before every model step.

use hypr_settings::WindowSettings;

/// Above `threshold` messages, only the last `keep` are sent.
///
/// The full history is kept by the loop; only the slice handed to the model
/// shrinks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowPolicy {
    /// Message count above which truncation happens.
    pub threshold: usize,
    /// Messages kept when truncating.
    pub keep: usize,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self::from(&WindowSettings::default())
    }
}

impl From<&WindowSettings> for WindowPolicy {
    fn from(settings: &WindowSettings) -> Self {
        Self {
            threshold: settings.threshold,
            keep: settings.keep,
        }
    }
}

impl WindowPolicy {
    /// The slice of `messages` to send.
    pub fn apply<'a, T>(&self, messages: &'a [T]) -> &'a [T] {
        if messages.len() > self.threshold {
            &messages[messages.len().saturating_sub(self.keep)..]
        } else {
            messages
        }
    }
}
