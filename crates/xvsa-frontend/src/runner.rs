//! Executing tool invocations and applying the ignore-errors policy.

use std::path::Path;
use std::process::Command;

use crate::error::ToolError;

/// Result of a tool invocation that was allowed to continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolRun {
    /// Exit code reported by the tool, if any.
    pub exit_code: Option<i32>,
    /// The tool failed but the failure was downgraded to a warning.
    pub failure_ignored: bool,
}

impl ToolRun {
    pub fn succeeded(&self) -> bool {
        !self.failure_ignored
    }
}

/// Runs an external tool inside a working directory.
pub trait ToolRunner {
    /// Run `program` with `args`, blocking until it exits.
    ///
    /// # Errors
    /// Returns [`ToolError::Launch`] if the process cannot be started and
    /// [`ToolError::NonZeroExit`] if it reports failure, unless the runner
    /// is configured to ignore errors.
    fn run(&self, program: &Path, args: &[String], working_dir: &Path) -> Result<ToolRun, ToolError>;
}

/// Spawns real processes, streaming their output to the debug log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    ignore_errors: bool,
}

impl ProcessRunner {
    pub fn new(ignore_errors: bool) -> Self {
        Self { ignore_errors }
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, program: &Path, args: &[String], working_dir: &Path) -> Result<ToolRun, ToolError> {
        let name = program_name(program);
        tracing::info!("running {} {}", program.display(), args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(working_dir);

        let outcome = xvsa_util::process::run_streaming(&mut cmd, |line| {
            tracing::debug!(target: "xvsa::tool", "{name}: {line}");
        });

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(source) if self.ignore_errors => {
                tracing::warn!("cannot launch {name}, continuing: {source}");
                return Ok(ToolRun {
                    exit_code: None,
                    failure_ignored: true,
                });
            }
            Err(source) => {
                return Err(ToolError::Launch {
                    program: name,
                    source,
                })
            }
        };

        if outcome.success {
            return Ok(ToolRun {
                exit_code: outcome.exit_code,
                failure_ignored: false,
            });
        }

        let err = ToolError::NonZeroExit {
            program: name,
            exit_code: outcome.exit_code,
        };
        if self.ignore_errors {
            tracing::warn!("{err}, continuing");
            return Ok(ToolRun {
                exit_code: outcome.exit_code,
                failure_ignored: true,
            });
        }
        Err(err)
    }
}

fn program_name(program: &Path) -> String {
    program
        .file_name()
        .map_or_else(|| program.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn successful_run() {
        let tmp = tempfile::tempdir().unwrap();
        let run = ProcessRunner::new(false)
            .run(Path::new("echo"), &args(&["hello"]), tmp.path())
            .unwrap();
        assert_eq!(run.exit_code, Some(0));
        assert!(run.succeeded());
    }

    #[test]
    fn failing_run_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ProcessRunner::new(false)
            .run(Path::new("sh"), &args(&["-c", "exit 3"]), tmp.path())
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::NonZeroExit {
                exit_code: Some(3),
                ..
            }
        ));
        assert_eq!(err.to_string(), "sh failed with exit code 3");
    }

    #[test]
    fn failing_run_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let run = ProcessRunner::new(true)
            .run(Path::new("sh"), &args(&["-c", "exit 3"]), tmp.path())
            .unwrap();
        assert_eq!(run.exit_code, Some(3));
        assert!(run.failure_ignored);
        assert!(!run.succeeded());
    }

    #[test]
    fn launch_failure_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ProcessRunner::new(false)
            .run(Path::new("/nonexistent/mapfej"), &[], tmp.path())
            .unwrap_err();
        assert!(matches!(err, ToolError::Launch { .. }));
        assert!(err.to_string().contains("mapfej"));
    }

    #[test]
    fn launch_failure_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let run = ProcessRunner::new(true)
            .run(Path::new("/nonexistent/mapfej"), &[], tmp.path())
            .unwrap();
        assert!(run.failure_ignored);
        assert_eq!(run.exit_code, None);
    }

    #[test]
    fn runs_inside_working_dir() {
        let tmp = tempfile::tempdir().unwrap();
        ProcessRunner::new(false)
            .run(Path::new("sh"), &args(&["-c", "touch marker"]), tmp.path())
            .unwrap();
        assert!(tmp.path().join("marker").exists());
    }
}
