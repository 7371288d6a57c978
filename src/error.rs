//! Error types for case-forge.
//!
//! [`ForgeError`] is fatal: the pipeline stops and the caller gets a message.
//! [`LogoError`] and [`ChartError`] are non-fatal: the logo or the single chart
//! is dropped, a warning is logged, and rendering carries on.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Fatal errors returned by the pipeline and its stages.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// The output identifier does not name a `.pdf` file.
    #[error("Output file must have a .pdf extension, got '{}'", .path.display())]
    InvalidOutputPath { path: PathBuf },

    /// The structured-text input could not be found.
    #[error("Input file not found: '{}'", .path.display())]
    InputNotFound { path: PathBuf },

    /// A style value or style file is unusable.
    #[error("Invalid style configuration: {0}")]
    Config(String),

    /// The page description could not be turned into PDF bytes.
    #[error("PDF rendering failed: {0}")]
    Render(String),

    /// The conversion collaborator ran but did not produce the output.
    #[error("Conversion to '{}' failed: {reason}", .output.display())]
    ConversionFailed { output: PathBuf, reason: String },

    /// The external converter exceeded its time budget and was killed.
    #[error("Converter '{program}' timed out after {}s", .timeout.as_secs())]
    ConversionTimedOut { program: String, timeout: Duration },

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ForgeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ForgeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A logo lookup or download that did not yield a usable image.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LogoError {
    /// Timeout, DNS failure, refused connection, TLS error.
    #[error("request to '{url}' failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("'{url}' answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("logo bytes are not a decodable image: {0}")]
    Undecodable(String),
}

/// A single chart that could not be drawn.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChartError {
    #[error("chart has no data points")]
    Empty,

    #[error("chart encoding failed: {0}")]
    Encode(String),
}
