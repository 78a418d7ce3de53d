//! Error types for RepoPulse core.

use std::path::PathBuf;
use std::{error::Error, fmt, io};

/// Terminal error for a contributor or folder pipeline call.
#[derive(Debug)]
pub enum RepoPulseError {
    /// Missing or malformed identifiers supplied by the caller.
    InvalidInput(String),
    /// A provider answered with a non-success status.
    Upstream {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Raw error body returned by the provider.
        body: String,
    },
    /// Contributor statistics were still being computed after every attempt.
    StatsUnavailable {
        /// Number of attempts made before giving up.
        attempts: u32,
    },
    /// The aggregation root does not exist or is not a directory.
    InvalidPath(PathBuf),
    /// The provider could not be reached or its payload could not be decoded.
    Provider(String),
    /// An underlying I/O error.
    Io(io::Error),
}

impl RepoPulseError {
    /// Status code to report for this error when it has one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::StatsUnavailable { .. } => Some(202),
            _ => None,
        }
    }
}

impl fmt::Display for RepoPulseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Upstream { status, body } => write!(f, "upstream error ({status}): {body}"),
            Self::StatsUnavailable { attempts } => write!(
                f,
                "contributor statistics still processing after {attempts} attempts"
            ),
            Self::InvalidPath(path) => write!(f, "invalid folder path: {}", path.display()),
            Self::Provider(message) => write!(f, "provider error: {message}"),
            Self::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl Error for RepoPulseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for RepoPulseError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Convenience result type for RepoPulse core.
pub type Result<T> = std::result::Result<T, RepoPulseError>;

/// Recoverable failure while analyzing a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisError {
    message: String,
}

impl AnalysisError {
    /// Create an analysis error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for AnalysisError {}
