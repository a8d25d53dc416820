//! CLI argument parsing using clap derive

use std::path::PathBuf;

use cfgcheck_meta::{ConfigSource, InputFormat};
use cfgcheck_rules::OutputFormat;
use clap::{Parser, ValueEnum};

/// Check a Python project's dependency pins and tool settings for
/// conflicts
#[derive(Parser, Debug)]
#[command(name = "validate-config")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration document to check (pyproject.toml, .json, .yaml)
    #[arg(required_unless_present = "inline", conflicts_with = "inline")]
    pub path: Option<PathBuf>,

    /// Check this text instead of a file
    #[arg(long, value_name = "TEXT")]
    pub inline: Option<String>,

    /// Parse the document as this format instead of guessing from the
    /// extension
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub input_format: Option<InputFormatArg>,

    /// Treat warnings as violations
    #[arg(long, env = "VALIDATE_CONFIG_STRICT")]
    pub strict: bool,

    /// How to print violations
    #[arg(
        long,
        value_enum,
        default_value_t = FormatArg::Text,
        env = "VALIDATE_CONFIG_FORMAT"
    )]
    pub format: FormatArg,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormatArg {
    Toml,
    Json,
    Yaml,
}

impl From<InputFormatArg> for InputFormat {
    fn from(arg: InputFormatArg) -> Self {
        match arg {
            InputFormatArg::Toml => InputFormat::Toml,
            InputFormatArg::Json => InputFormat::Json,
            InputFormatArg::Yaml => InputFormat::Yaml,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

impl Cli {
    /// The document to load.
    ///
    /// clap requires `path` whenever `--inline` is absent.
    pub fn source(&self) -> ConfigSource {
        let source = match &self.inline {
            Some(text) => ConfigSource::inline(text.clone()),
            None => ConfigSource::file(self.path.clone().unwrap_or_default()),
        };
        match self.input_format {
            Some(format) => source.with_format(format.into()),
            None => source,
        }
    }
}
