//! Guard orchestration: run an external check command and classify the
//! outcome.
//!
//! Exit code 0 maps to `ok`; a nonzero exit, abnormal termination,
//! spawn failure, or timeout maps to `issue`. Every failure path ends
//! in a classified record; running a guard never surfaces a fault to
//! the caller.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::process::{ChildStderr, ChildStdout, Command, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

use crate::models::{GuardRunRecord, GuardStatus};

/// A named external check command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardCommand {
    /// Short name used to invoke the guard (e.g. "toolchain-pin")
    pub name: String,

    /// Human description stored on history records
    pub label: String,

    /// Program to execute
    pub program: String,

    /// Arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,
}

/// Result of one guard run: the history record plus the raw output and
/// exit code, which are exposed for display independent of the history
/// list.
#[derive(Debug)]
pub struct GuardOutcome {
    pub record: GuardRunRecord,
    /// Combined stdout and stderr text
    pub output: String,
    /// Exit code, absent on spawn failure or signal termination
    pub exit_code: Option<i32>,
}

impl GuardOutcome {
    fn classified(command: &GuardCommand, status: GuardStatus, output: String, exit_code: Option<i32>) -> Self {
        Self {
            record: GuardRunRecord::new(command.label.clone(), status),
            output,
            exit_code,
        }
    }
}

/// Run a guard command to completion, bounded by `timeout`.
pub fn run_guard(command: &GuardCommand, timeout: Duration) -> GuardOutcome {
    tracing::info!("guard start: {} ({})", command.name, command.program);

    let mut child = match Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            // Cannot start at all (missing executable, permissions):
            // classified identically to a nonzero exit.
            tracing::warn!("guard {} failed to start: {}", command.name, e);
            return GuardOutcome::classified(
                command,
                GuardStatus::Issue,
                format!("failed to start {}: {}", command.program, e),
                None,
            );
        }
    };

    // Drain both pipes on background threads while waiting. A child
    // writing more than the pipe buffer blocks until someone reads, so
    // reading only after the wait would deadlock it into the timeout.
    let stdout_reader = child.stdout.take().map(drain_stdout);
    let stderr_reader = child.stderr.take().map(drain_stderr);

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => Some(status),
        Ok(None) => {
            // Timed out: kill and reap, classify as issue.
            tracing::warn!("guard {} timed out after {:?}", command.name, timeout);
            let _ = child.kill();
            let _ = child.wait();
            None
        }
        Err(e) => {
            tracing::warn!("guard {} wait failed: {}", command.name, e);
            let _ = child.kill();
            let _ = child.wait();
            None
        }
    };

    // The child has exited (or been killed), so both pipes are at EOF
    // and the reader threads finish promptly.
    let mut output = String::new();
    if let Some(handle) = stdout_reader {
        output.push_str(&handle.join().unwrap_or_default());
    }
    if let Some(handle) = stderr_reader {
        output.push_str(&handle.join().unwrap_or_default());
    }

    let exit_code = status.and_then(|s| s.code());
    let guard_status = match exit_code {
        Some(0) => GuardStatus::Ok,
        _ => GuardStatus::Issue,
    };

    tracing::info!(
        "guard finish: {} -> {} (exit {:?})",
        command.name,
        guard_status,
        exit_code
    );
    GuardOutcome::classified(command, guard_status, output, exit_code)
}

fn drain_stdout(mut pipe: ChildStdout) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut text = String::new();
        let _ = pipe.read_to_string(&mut text);
        text
    })
}

fn drain_stderr(mut pipe: ChildStderr) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut text = String::new();
        let _ = pipe.read_to_string(&mut text);
        text
    })
}
