//! Settings errors.

use std::path::PathBuf;

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid JSON or does not match the schema.
    #[error("invalid settings JSON in {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Merged settings could not be converted back into [`crate::ChatSettings`].
    #[error("invalid settings after merge: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Settings result alias.
pub type Result<T> = std::result::Result<T, SettingsError>;
