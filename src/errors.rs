//! Error types for loading and parsing.
//!
//! Errors that happen while producing a reply are deliberately NOT here: per
//! the RiveScript language, those are delivered inside the reply text itself
//! (either as the whole reply, e.g. `"ERR: No Reply Matched"`, or embedded,
//! e.g. `[ERR: Object Not Found]`). The engine-level reply strings can be
//! remapped through [`ErrorMessages`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the RiveScript source parser.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A structural or syntactic rule was violated while strict mode is on.
    #[error("syntax error: {message} at {filename} line {line}")]
    Syntax { filename: String, line: usize, message: String },

    /// The source declared `! version = X` with `X` above what we speak.
    /// This aborts the parse regardless of strict mode.
    #[error("unsupported RiveScript version {version} at {filename} line {line}: this interpreter supports up to {supported}")]
    UnsupportedVersion { filename: String, line: usize, version: String, supported: f64 },
}

/// Errors raised while loading RiveScript documents from disk.
#[derive(Debug, Error)]
pub enum RiveScriptError {
    #[error("'{0}' is not a regular file")]
    NotAFile(PathBuf),

    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    #[error("error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// The engine-surfaced reply strings, overridable via
/// [`Config`](crate::Config).
#[derive(Debug, Clone)]
pub struct ErrorMessages {
    /// Returned as the whole reply when no trigger matched the input.
    pub reply_not_matched: String,
    /// Returned as the whole reply when a trigger matched but produced no text.
    pub reply_not_found: String,
    /// Returned as the whole reply when redirects recurse past `depth`.
    pub deep_recursion: String,
    /// Embedded in a reply when a `<call>` target has no registered macro.
    pub object_not_found: String,
}

impl Default for ErrorMessages {
    fn default() -> Self {
        Self {
            reply_not_matched: "ERR: No Reply Matched".to_string(),
            reply_not_found: "ERR: No Reply Found".to_string(),
            deep_recursion: "ERR: Deep Recursion Detected!".to_string(),
            object_not_found: "[ERR: Object Not Found]".to_string(),
        }
    }
}
