//! Global error handling for protree
//!
//! `ProtreeError` covers failures that stop a whole run. `Issue` covers
//! the per-item problems a decode pass records and keeps going past.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::tokens::TokenizerError;

/// Global error type for protree operations
#[derive(Error, Debug)]
pub enum ProtreeError {
    /// Tokenizer-related errors
    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Scanner errors
    #[error("Scanner error: {0}")]
    Scanner(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(String),
}

/// Specialized Result type for protree operations
pub type Result<T> = std::result::Result<T, ProtreeError>;

/// Creates a ProtreeError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::ProtreeError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

// The binary keeps an io::Result main
impl From<ProtreeError> for io::Error {
    fn from(err: ProtreeError) -> Self {
        io::Error::new(io::ErrorKind::Other, err.to_string())
    }
}

/// A problem with a single line, block or file found during a decode pass
#[derive(Error, Debug)]
pub enum Issue {
    /// A tree line's parent depth has no recorded directory
    #[error("line {line}: no directory recorded at depth {missing_depth}, '{name}' placed under the output root")]
    PathResolution {
        line: usize,
        name: String,
        missing_depth: usize,
    },

    /// A tag line that cannot bound a block
    #[error("line {line}: malformed tag '{tag}' ignored")]
    MalformedTag { line: usize, tag: String },

    /// An opening tag arrived before the previous block was closed
    #[error("line {line}: block '{path}' was never closed, ended at the next opening tag")]
    UnterminatedBlock { line: usize, path: String },

    /// A tree line ending in `/` with no connector before the name
    #[error("line {line}: directory line without a connector ignored: '{text}'")]
    MalformedLine { line: usize, text: String },

    /// A tree line whose name cannot be a single path segment
    #[error("line {line}: invalid directory name '{name}'")]
    InvalidName { line: usize, name: String },

    /// A content path that would escape the output root
    #[error("unsafe path '{0}' skipped")]
    UnsafePath(String),

    /// Failure reading a source file
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failure creating a directory or writing a file
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Issue {
    /// Short label for the kind of issue
    pub fn kind(&self) -> &'static str {
        match self {
            Issue::PathResolution { .. } => "path-resolution",
            Issue::MalformedTag { .. } => "malformed-tag",
            Issue::MalformedLine { .. } => "malformed-line",
            Issue::UnterminatedBlock { .. } => "unterminated-block",
            Issue::InvalidName { .. } => "invalid-name",
            Issue::UnsafePath(_) => "unsafe-path",
            Issue::Read { .. } => "read",
            Issue::Write { .. } => "write",
        }
    }

    /// Whether the issue lost data rather than just being tolerated
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Issue::Read { .. } | Issue::Write { .. } | Issue::UnsafePath(_) | Issue::InvalidName { .. }
        )
    }
}

impl Serialize for Issue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Issue", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
