use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for everything that can go wrong while building or running a pipeline.
///
/// None of these are recovered from; they bubble up to the binary, which reports
/// them and exits with a failure status.
#[derive(Error, Debug)]
pub enum GenodspError {
    /// Malformed, unknown, missing or conflicting command line argument.
    #[error("{0}")]
    Argument(String),

    /// Malformed interval (or mapping) line.
    #[error("problem at line {line}, {message}")]
    InputFormat { line: usize, message: String },

    /// Malformed line in a chromosome lengths file.
    #[error("problem at line {line}, {message}")]
    LengthsFormat { line: usize, message: String },

    /// Well-formed input that violates a constraint of the data, e.g. an
    /// interval beyond the end of a chromosome or an unknown named variable.
    #[error("{0}")]
    Domain(String),

    #[error("can't open \"{}\" for {mode}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        mode: &'static str,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl GenodspError {
    pub fn argument(message: impl Into<String>) -> Self {
        GenodspError::Argument(message.into())
    }

    pub fn domain(message: impl Into<String>) -> Self {
        GenodspError::Domain(message.into())
    }

    pub fn input_format(line: usize, message: impl Into<String>) -> Self {
        GenodspError::InputFormat {
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for genodsp operations.
pub type Result<T> = std::result::Result<T, GenodspError>;
