//! Error types for cfgcheck-meta

use std::path::PathBuf;

use crate::source::InputFormat;

/// Result type for cfgcheck-meta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a configuration document
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config at {origin}: {message}")]
    Parse {
        origin: String,
        format: InputFormat,
        message: String,
    },

    #[error("Invalid structure in {origin} at {section}: {message}")]
    Structure {
        origin: String,
        section: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    /// Invalid version constraint expression.
    #[error("invalid version constraint '{constraint}': {reason}")]
    VersionConstraintParse { constraint: String, reason: String },

    /// Invalid module-path matcher.
    #[error("invalid module pattern '{pattern}': {reason}")]
    ModulePattern { pattern: String, reason: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn structure(
        origin: &str,
        section: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Structure {
            origin: origin.to_string(),
            section: section.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the document itself could not be understood.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Structure { .. })
    }
}
