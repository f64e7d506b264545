//! Error taxonomy for the systable conversion

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while converting a system table
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Input file missing or unreadable
    #[error("Unable to read {}: {source}", path.display())]
    InputAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output file parent directory does not exist
    #[error("Output file path parent directory doesn't exist: {}", path.display())]
    OutputPath { path: PathBuf },

    /// Malformed configuration syntax
    #[error(transparent)]
    Parse(#[from] crate::libconfig::ParseError),

    /// Configuration is missing a field or carries a value of the wrong type
    #[error("{context}: {message}")]
    Schema { context: String, message: String },

    /// Output could not be written
    #[error("Unable to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub(crate) fn schema(context: impl Into<String>, message: impl Into<String>) -> Self {
        ConvertError::Schema {
            context: context.into(),
            message: message.into(),
        }
    }
}
