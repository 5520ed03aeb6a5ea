//! Error types and display normalization.
//!
//! Whatever a model stream fails with is turned into a single display string
//! by [`normalize_error`] before it reaches the UI as an `error` chunk.

use serde_json::Value;

/// Errors returned when opening a model stream.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The provider returned a non-success status.
    #[error("HTTP {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Provider message.
        message: String,
    },

    /// The provider is throttling requests.
    #[error("{0}")]
    RateLimited(String),

    /// Connection or transport failure.
    #[error("{0}")]
    Network(String),

    /// The request was rejected before it was sent.
    #[error("{0}")]
    InvalidRequest(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl ModelError {
    /// Stable error name used as the display prefix.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Api { .. } => "APICallError",
            Self::RateLimited(_) => "RateLimitError",
            Self::Network(_) => "NetworkError",
            Self::InvalidRequest(_) => "InvalidRequestError",
            Self::Other(_) => "ModelError",
        }
    }
}

/// Errors returned by tool execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// No tool registered under this name.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Arguments failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The tool ran and failed.
    #[error("{0}")]
    Execution(String),

    /// The turn was stopped while the tool was running.
    #[error("Operation cancelled")]
    Cancelled,
}

/// Errors returned by a context resolver.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The referenced data could not be read in a usable form.
    #[error("malformed session data: {0}")]
    Malformed(String),
}

/// Errors returned when building a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The built-in context template failed to compile.
    #[error("context template: {0}")]
    Template(#[from] minijinja::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Normalization
// ─────────────────────────────────────────────────────────────────────────────

/// An error observed on a model stream.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamError {
    /// A named error with a message.
    Typed {
        /// Error name, e.g. `RateLimitError`.
        name: String,
        /// Error message.
        message: String,
    },
    /// An arbitrary JSON value.
    Value(Value),
}

impl StreamError {
    /// Shorthand for [`StreamError::Typed`].
    pub fn typed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Typed {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<ModelError> for StreamError {
    fn from(err: ModelError) -> Self {
        Self::typed(err.name(), err.to_string())
    }
}

impl From<Value> for StreamError {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Display string for a stream error.
///
/// - typed errors render as `"<name>: <message>"`
/// - objects with a string `message` render as that message
/// - anything else renders as its JSON serialization
pub fn normalize_error(error: &StreamError) -> String {
    match error {
        StreamError::Typed { name, message } => format!("{name}: {message}"),
        StreamError::Value(value) => {
            if let Some(message) = value.get("message").and_then(Value::as_str) {
                return message.to_string();
            }
            serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_error_gets_name_prefix() {
        let err = StreamError::from(ModelError::RateLimited("slow down".into()));
        assert_eq!(normalize_error(&err), "RateLimitError: slow down");
    }

    #[test]
    fn api_error_includes_status() {
        let err = StreamError::from(ModelError::Api {
            status: 503,
            message: "overloaded".into(),
        });
        assert_eq!(normalize_error(&err), "APICallError: HTTP 503: overloaded");
    }

    #[test]
    fn object_with_message_uses_message() {
        let err = StreamError::Value(json!({"message": "context too long", "code": 400}));
        assert_eq!(normalize_error(&err), "context too long");
    }

    #[test]
    fn object_without_string_message_is_serialized() {
        let err = StreamError::Value(json!({"code": 42}));
        assert_eq!(normalize_error(&err), r#"{"code":42}"#);

        let err = StreamError::Value(json!({"message": 7}));
        assert_eq!(normalize_error(&err), r#"{"message":7}"#);
    }

    #[test]
    fn scalar_values_are_serialized() {
        assert_eq!(normalize_error(&StreamError::Value(json!("boom"))), r#""boom""#);
        assert_eq!(normalize_error(&StreamError::Value(Value::Null)), "null");
    }

    #[test]
    fn tool_error_display() {
        assert_eq!(ToolError::NotFound("x".into()).to_string(), "Tool not found: x");
        assert_eq!(ToolError::Cancelled.to_string(), "Operation cancelled");
    }
}
