//! Error types for G-code post-processing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while injecting the bed cooldown command.
#[derive(Error, Debug)]
pub enum CooldownError {
    /// Target file missing or not a regular file.
    #[error("issue with passed file: {} is not an existing regular file", .0.display())]
    InvalidPath(PathBuf),

    /// Neither the estimated printing time comment nor a TIME tag was found.
    #[error(
        "no print time estimate found (expected '; estimated printing time (normal mode) = ...' or ';TIME:<seconds>')"
    )]
    UnrecognizedTimeFormat,

    /// A time estimate was found but is not a non-negative integer.
    #[error("invalid print time estimate: {0}")]
    InvalidTimeValue(String),

    /// One or more parameters are out of range or not in their enum domain.
    #[error("invalid bed cooldown parameters: {}\n\n{params}", .problems.join("; "))]
    ParameterValidation {
        problems: Vec<String>,
        params: String,
    },

    /// Standalone mode found no `;ENABLE_BED_COOLDOWN` line to replace.
    #[error("no ';ENABLE_BED_COOLDOWN' line found; add it to your start G-code")]
    MissingEnableMarker,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for post-processing operations.
pub type Result<T> = std::result::Result<T, CooldownError>;
