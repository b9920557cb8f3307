//! Error types for xvsa-frontend.

use std::path::PathBuf;

/// Errors produced by tool detection and invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The executable does not exist or is not a regular file.
    #[error("{tool} not found at {path} — check the tool-chain install directory")]
    NotFound { tool: String, path: PathBuf },

    /// The executable exists but lacks execute permission.
    #[error("{tool} found at {path} but is not executable — check file permissions")]
    NotExecutable { tool: String, path: PathBuf },

    /// The process could not be started.
    #[error("cannot launch {program}: {source}")]
    Launch {
        program: String,
        source: xvsa_util::error::UtilError,
    },

    /// The process ran and reported failure.
    #[error("{program} failed with {}", describe_exit(.exit_code))]
    NonZeroExit {
        program: String,
        exit_code: Option<i32>,
    },

    /// No source directory was resolved for the module.
    #[error("no source directory found — check the module's source roots or the xvsa.sources property")]
    NoSourceDirs,

    /// No compiled-class directory was given to the front end.
    #[error("no compiled-class directory specified for the front end")]
    NoClassDir,

    /// No output artifact path was given.
    #[error("no output path specified for the tool invocation")]
    NoOutput,

    /// The analyzer input object does not exist.
    #[error("object file {path} does not exist — the front end must run first")]
    MissingObject { path: PathBuf },
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (killed by signal)".to_owned(),
    }
}
