//! Configuration sources and format detection
//!
//! A document is read exactly once, either from a file or from inline
//! text, and decoded into a generic TOML table regardless of the on-disk
//! format.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Origin label used for inline documents.
pub const INLINE_ORIGIN: &str = "<inline>";

/// Structured data formats accepted as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputFormat {
    #[default]
    Toml,
    Json,
    Yaml,
}

impl InputFormat {
    /// Detect the format from a file extension.
    ///
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Detect the format of a file from its path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");
        Self::from_extension(extension).ok_or_else(|| Error::UnsupportedFormat {
            extension: extension.to_string(),
        })
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Toml => write!(f, "TOML"),
            InputFormat::Json => write!(f, "JSON"),
            InputFormat::Yaml => write!(f, "YAML"),
        }
    }
}

/// Where a configuration document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A file on disk. `format` overrides extension-based detection.
    File {
        path: PathBuf,
        format: Option<InputFormat>,
    },
    /// Text supplied directly, e.g. from the command line.
    Inline { text: String, format: InputFormat },
}

impl ConfigSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            format: None,
        }
    }

    pub fn inline(text: impl Into<String>) -> Self {
        Self::Inline {
            text: text.into(),
            format: InputFormat::Toml,
        }
    }

    /// Replace the detected format.
    pub fn with_format(self, format: InputFormat) -> Self {
        match self {
            Self::File { path, .. } => Self::File {
                path,
                format: Some(format),
            },
            Self::Inline { text, .. } => Self::Inline { text, format },
        }
    }

    /// Human readable label used in errors and reports.
    pub fn origin(&self) -> String {
        match self {
            Self::File { path, .. } => path.display().to_string(),
            Self::Inline { .. } => INLINE_ORIGIN.to_string(),
        }
    }

    /// Read and decode the document into a generic table.
    pub fn read_document(&self) -> Result<toml::Table> {
        let origin = self.origin();
        match self {
            Self::File { path, format } => {
                let format = match format {
                    Some(format) => *format,
                    None => InputFormat::from_path(path)?,
                };
                tracing::debug!(path = %path.display(), %format, "reading configuration file");
                let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
                decode(&content, format, &origin)
            }
            Self::Inline { text, format } => decode(text, *format, &origin),
        }
    }
}

/// Decode text in the given format into a TOML table.
///
/// JSON and YAML documents go through serde into the same value model, so
/// every later stage only deals with `toml::Value`.
pub fn decode(content: &str, format: InputFormat, origin: &str) -> Result<toml::Table> {
    let parse_error = |message: String| Error::Parse {
        origin: origin.to_string(),
        format,
        message,
    };

    match format {
        InputFormat::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
        InputFormat::Json => {
            serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))
        }
        InputFormat::Yaml => {
            if content.trim().is_empty() {
                return Err(parse_error("document is empty".to_string()));
            }
            serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))
        }
    }
}
