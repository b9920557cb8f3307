//! Error types for xvsa-engine.

use std::path::PathBuf;

use xvsa_frontend::ToolError;
use xvsa_util::error::UtilError;

/// Errors produced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A filesystem operation failed.
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A utility operation failed.
    #[error("{0}")]
    Util(#[from] UtilError),

    /// An external tool could not be located, parameterized, or run.
    #[error("{0}")]
    Tool(#[from] ToolError),

    /// The reactor does not flag any module as the execution root.
    #[error("no execution root module found — mark the top-level module with `execution_root`")]
    NoExecutionRoot,

    /// A module reached by the walk has no configuration.
    #[error("cannot determine project structure: no configuration for module {module}")]
    MissingConfiguration { module: String },

    /// Two module directories share no ancestor.
    #[error("no common ancestor between '{first}' and '{second}' — the module tree is broken")]
    NoCommonAncestor { first: PathBuf, second: PathBuf },

    /// A declared sub-module leads back to a module still being walked.
    #[error("module cycle detected: {chain}")]
    ModuleCycle { chain: String },

    /// A user-declared source or test root does not exist.
    #[error("the directory '{path}' does not exist for module {module} — check the property {key}")]
    MissingSourceDir {
        module: String,
        key: String,
        path: PathBuf,
    },

    /// The host has not resolved dependencies for a module.
    #[error("cannot populate {scope} libraries of module {module}: dependencies are not resolved")]
    UnresolvedClasspath { module: String, scope: String },

    /// A dump or manifest list could not be written.
    #[error("writing list file failed under {path}: {source}")]
    WriteList { path: PathBuf, source: UtilError },

    /// The shared source registry cannot be written.
    #[error("cannot write to the source registry {path} — check the directory permissions")]
    RegistryNotWritable { path: PathBuf },

    /// The source registry could not be serialized.
    #[error("cannot encode source registry {path}: {message}")]
    RegistryEncode { path: PathBuf, message: String },

    /// No working directory is available for a module's artifacts.
    #[error("no working directory for module {module}: {reason}")]
    NoWorkingDir { module: String, reason: String },

    /// The front end must run but no install directory was configured.
    #[error("no tool-chain install directory configured — set install_dir in xvsa.toml or pass --install-dir")]
    NoInstallDir,
}

impl EngineError {
    /// Whether the error is confined to one module and the walk may continue.
    pub fn is_module_failure(&self) -> bool {
        match self {
            EngineError::Tool(ToolError::Launch { .. }) => false,
            EngineError::Tool(_) | EngineError::NoWorkingDir { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_failures_are_fatal() {
        let err = EngineError::Tool(ToolError::Launch {
            program: "mapfej".to_owned(),
            source: UtilError::CommandExec {
                program: "mapfej".to_owned(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
        });
        assert!(!err.is_module_failure());
    }

    #[test]
    fn tool_exit_and_missing_work_dir_are_module_failures() {
        let exit = EngineError::Tool(ToolError::NonZeroExit {
            program: "xvsa".to_owned(),
            exit_code: Some(1),
        });
        assert!(exit.is_module_failure());

        let work = EngineError::NoWorkingDir {
            module: "g:a".to_owned(),
            reason: "no build directory".to_owned(),
        };
        assert!(work.is_module_failure());
        assert!(!EngineError::NoExecutionRoot.is_module_failure());
    }

    #[test]
    fn missing_source_dir_names_module_and_property() {
        let err = EngineError::MissingSourceDir {
            module: "com.acme:core".to_owned(),
            key: "xvsa.sources".to_owned(),
            path: PathBuf::from("/work/core/gen"),
        };
        let msg = err.to_string();
        assert!(msg.contains("com.acme:core"));
        assert!(msg.contains("xvsa.sources"));
        assert!(msg.contains("/work/core/gen"));
    }
}
