//! Error types for the validate-config binary

use cfgcheck_rules::ExitStatus;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that end a run before a report is produced
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The document could not be read or parsed
    #[error(transparent)]
    Meta(#[from] cfgcheck_meta::Error),

    /// Writing the report failed
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Load and report-write failures both end the run with code 2.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CliError::Meta(_) | CliError::Io(_) => ExitStatus::ParseFailure,
        }
    }
}
