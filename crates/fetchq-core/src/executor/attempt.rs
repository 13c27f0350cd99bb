//! One tool invocation under one client identity.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio_util::sync::CancellationToken;

use crate::error::AttemptFailure;
use crate::job::JobId;
use crate::registry::Registry;
use crate::tool::{parse_line, ToolLine};

pub(super) enum AttemptOutcome {
    /// Exit status zero.
    Exited,
    /// Token cancelled; the tool was killed.
    Cancelled,
}

/// Spawns the tool, feeds its stdout into the registry line by line and drains
/// stderr on a side task. The token is checked between lines and while waiting
/// for exit; on cancellation the tool is killed at once.
pub(super) async fn run_attempt(
    registry: &Registry,
    job_id: JobId,
    program: &Path,
    args: &[OsString],
    cancel: &CancellationToken,
) -> Result<AttemptOutcome, AttemptFailure> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| AttemptFailure::Spawn {
            program: program.display().to_string(),
            source,
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("tool stdout not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("tool stderr not captured"))?;
    let stderr_task = tokio::spawn(drain(stderr));

    let mut reader = BufReader::new(stdout);
    let mut line = Vec::new();
    let mut cancelled = false;
    loop {
        line.clear();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                cancelled = true;
                break;
            }
            read = reader.read_until(b'\n', &mut line) => match read {
                Ok(0) => break,
                Ok(_) => apply_line(registry, job_id, &String::from_utf8_lossy(&line)),
                Err(e) => {
                    tracing::warn!(job_id, "reading tool stdout: {e}");
                    break;
                }
            }
        }
    }

    let waited = if cancelled {
        None
    } else {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            status = child.wait() => Some(status),
        }
    };

    let Some(waited) = waited else {
        stop(&mut child, job_id).await;
        stderr_task.abort();
        let _ = stderr_task.await;
        return Ok(AttemptOutcome::Cancelled);
    };

    let status = match waited {
        Ok(status) => status,
        Err(e) => {
            stderr_task.abort();
            let _ = stderr_task.await;
            return Err(e.into());
        }
    };
    let stderr_text = stderr_task.await.unwrap_or_default();

    if status.success() {
        Ok(AttemptOutcome::Exited)
    } else {
        Err(AttemptFailure::Exit {
            code: status.code(),
            stderr: stderr_text,
        })
    }
}

fn apply_line(registry: &Registry, job_id: JobId, line: &str) {
    match parse_line(line) {
        ToolLine::Progress { percent, rate } => {
            registry.record_progress(job_id, percent, rate);
        }
        ToolLine::Title(title) => {
            registry.adopt_title(job_id, &title);
        }
        ToolLine::Other => tracing::trace!(job_id, line = line.trim_end(), "tool output"),
    }
}

/// Reads stderr to EOF so the tool never blocks on a full pipe.
async fn drain(mut stderr: ChildStderr) -> String {
    let mut bytes = Vec::new();
    if let Err(e) = stderr.read_to_end(&mut bytes).await {
        tracing::debug!("reading tool stderr: {e}");
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

async fn stop(child: &mut Child, job_id: JobId) {
    if let Err(e) = child.kill().await {
        tracing::debug!(job_id, "killing tool: {e}");
    }
}
