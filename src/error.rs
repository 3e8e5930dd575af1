//! Centralized error handling for the data explorer.
//!
//! Every failure inside the core is an [`ExplorerError`]. The variants follow
//! the categories the tool boundary cares about, so the dispatcher can turn
//! each one into the right caller-facing text:
//!
//! ```
//! use data_explorer::error::ExplorerError;
//!
//! fn describe(err: &ExplorerError) -> String {
//!     match err {
//!         ExplorerError::NotFound(path) => format!("Error: File not found: {}", path.display()),
//!         ExplorerError::ArgumentMissing(field) => format!("Error: {field} is required"),
//!         other => format!("Error: {other}"),
//!     }
//! }
//! # let _ = describe(&ExplorerError::Other("x".to_owned()));
//! ```
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any `Result` whose error converts into
//! [`ExplorerError`]:
//!
//! ```no_run
//! use data_explorer::error::ResultExt as _;
//!
//! fn read_header(path: &str) -> data_explorer::error::Result<String> {
//!     let text = std::fs::read_to_string(path).context("Failed to read CSV header")?;
//!     Ok(text.lines().next().unwrap_or_default().to_owned())
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

/// Main error type for data explorer operations.
#[derive(Debug)]
pub enum ExplorerError {
    /// A required tool argument was absent
    ArgumentMissing(String),

    /// The requested path does not resolve to a file
    NotFound(PathBuf),

    /// I/O errors (permissions, reads, pipes)
    Io(std::io::Error),

    /// Malformed content (CSV structure, encoding, type inference)
    Parse(String),

    /// The analysis script raised or exited non-zero
    Execution { message: String, trace: String },

    /// Configuration errors
    Config(String),

    /// A worker task panicked or was cancelled
    Worker(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArgumentMissing(field) => write!(f, "{field} is required"),
            Self::NotFound(path) => write!(f, "File not found: {}", path.display()),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
            Self::Execution { message, .. } => write!(f, "{message}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Worker(msg) => write!(f, "Worker failed: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ExplorerError {}

impl From<std::io::Error> for ExplorerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for ExplorerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for ExplorerError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<csv::Error> for ExplorerError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => Self::Io(io),
                other => Self::Parse(format!("{other:?}")),
            }
        } else {
            Self::Parse(err.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for ExplorerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Worker(err.to_string())
    }
}

impl From<ExplorerError> for String {
    fn from(err: ExplorerError) -> Self {
        err.to_string()
    }
}

/// Result type alias for data explorer operations.
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ExplorerError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(msg.into(), e.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(f(), e.into()))
    }
}

// NotFound keeps its kind so the boundary can still report the missing path.
fn wrap(msg: String, err: ExplorerError) -> ExplorerError {
    match err {
        ExplorerError::NotFound(_) | ExplorerError::ArgumentMissing(_) => err,
        ExplorerError::Parse(inner) => ExplorerError::Parse(format!("{msg}: {inner}")),
        other => ExplorerError::Other(format!("{msg}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExplorerError::Parse("unexpected field count".to_owned());
        assert_eq!(err.to_string(), "Parse error: unexpected field count");

        let err = ExplorerError::ArgumentMissing("csv_path".to_owned());
        assert_eq!(err.to_string(), "csv_path is required");
    }

    #[test]
    fn test_error_conversion_to_string() {
        let err = ExplorerError::NotFound(PathBuf::from("missing.csv"));
        let s: String = err.into();
        assert_eq!(s, "File not found: missing.csv");
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "data.csv",
        ));

        let result: Result<()> = result.context("Failed to open file");
        let message = result.unwrap_err().to_string();
        assert!(message.contains("Failed to open file"), "got {message}");
        assert!(message.contains("data.csv"), "got {message}");
    }

    #[test]
    fn test_context_preserves_not_found() {
        let result: Result<()> = Err(ExplorerError::NotFound(PathBuf::from("x.csv")));
        let wrapped = result.context("Loading failed");
        assert!(matches!(wrapped, Err(ExplorerError::NotFound(_))));
    }
}
