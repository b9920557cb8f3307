//! Error types for xvsa-util.

use std::path::PathBuf;

/// Errors produced by utility functions.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    /// An I/O operation failed.
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A glob pattern was invalid.
    #[error("invalid glob pattern `{pattern}`: {message}")]
    GlobPattern { pattern: String, message: String },

    /// A command could not be spawned or its output could not be read.
    #[error("cannot execute {program}: {source}")]
    CommandExec {
        program: String,
        source: std::io::Error,
    },

    /// Two paths share no ancestor, not even the filesystem root.
    #[error("no common ancestor between '{first}' and '{second}' — the module tree is broken")]
    NoCommonAncestor { first: PathBuf, second: PathBuf },
}
