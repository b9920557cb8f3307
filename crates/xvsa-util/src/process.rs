//! Process execution helpers for xvsa-gather.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use crate::error::UtilError;

/// How a streamed command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Whether the command exited successfully.
    pub success: bool,
    /// The exit code, if the process was not killed by a signal.
    pub exit_code: Option<i32>,
}

/// Execute a command, feeding every stdout and stderr line to `on_line` as it arrives.
///
/// Both streams are drained on reader threads and funnelled through one
/// channel, so `on_line` is only ever called from the calling thread. The
/// call blocks until the process exits; there is no timeout.
///
/// # Errors
/// Returns an error if the command cannot be spawned (e.g. binary not found)
/// or cannot be waited on. A non-zero exit code is **not** an error; check
/// `ExitOutcome::success` instead.
pub fn run_streaming<F>(cmd: &mut Command, mut on_line: F) -> Result<ExitOutcome, UtilError>
where
    F: FnMut(&str),
{
    let program = cmd.get_program().to_string_lossy().into_owned();
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| UtilError::CommandExec {
            program: program.clone(),
            source,
        })?;

    let (tx, rx) = mpsc::channel::<String>();
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(forward_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(forward_lines(stderr, tx.clone()));
    }
    // The loop below ends once every reader has dropped its sender.
    drop(tx);

    for line in rx {
        on_line(&line);
    }
    for reader in readers {
        join_reader(reader, &program);
    }

    let status = child
        .wait()
        .map_err(|source| UtilError::CommandExec { program, source })?;

    Ok(ExitOutcome {
        success: status.success(),
        exit_code: status.code(),
    })
}

/// Wait for an output reader; returns `false` if it panicked.
fn join_reader(reader: thread::JoinHandle<()>, program: &str) -> bool {
    if reader.join().is_ok() {
        return true;
    }
    tracing::warn!("output reader for {program} panicked, some tool output may be missing");
    false
}

fn forward_lines<R>(stream: R, tx: mpsc::Sender<String>) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    })
}
