use std::path::PathBuf;

use thiserror::Error;

use crate::plot::ImageFormat;

// ---------------------------------------------------------------------------
// Error kinds surfaced to the caller
// ---------------------------------------------------------------------------

/// Errors produced by loading, jittering, configuring and exporting.
///
/// A group with a single observation is *not* an error: its standard
/// deviation and SEM are NaN and flow through as such.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("failed to parse {}: {message}", path.display())]
    InputParse { path: PathBuf, message: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to write {format} output to {}: {message}", path.display())]
    OutputWrite {
        format: ImageFormat,
        path: PathBuf,
        message: String,
    },

    #[error("invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::InputParse {
            path: path.into(),
            message: message.into(),
        }
    }
}
