//! Error taxonomy for the queue and the fetch path.
//!
//! Control errors go straight back to the caller. Attempt failures never leave
//! the fetch executor: they either advance to the next client identity or end
//! up as the job's `last_error`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::job::{JobId, JobStatus};
use crate::tool::{classify_stderr, Rejection};

/// Upper bound on the diagnostic text kept as a job's `last_error`.
const MAX_DIAGNOSTIC_CHARS: usize = 2000;

/// Synchronous errors returned by control operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("job {id} is {status}")]
    InvalidState { id: JobId, status: JobStatus },
}

impl ControlError {
    /// Stable machine-readable tag for the control protocol.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlError::InvalidInput(_) => "invalid_input",
            ControlError::NotFound(_) => "not_found",
            ControlError::InvalidState { .. } => "invalid_state",
        }
    }
}

/// One client identity's attempt did not produce a file.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("tool I/O: {0}")]
    Io(#[from] io::Error),
    #[error("tool exited with status {}", exit_label(.code))]
    Exit { code: Option<i32>, stderr: String },
    #[error("tool reported success but no output file was found in {}", .0.display())]
    MissingOutput(PathBuf),
}

impl AttemptFailure {
    /// Text recorded as the job's `last_error` if this turns out to be the final attempt.
    /// Prefers what the tool wrote to stderr.
    pub fn diagnostic(&self) -> String {
        match self {
            AttemptFailure::Exit { stderr, .. } if !stderr.trim().is_empty() => {
                tail_chars(stderr.trim(), MAX_DIAGNOSTIC_CHARS).to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn rejection(&self) -> Rejection {
        match self {
            AttemptFailure::Exit { stderr, .. } => classify_stderr(stderr),
            _ => Rejection::Other,
        }
    }
}

/// The job task itself died (panic or abort) instead of returning an outcome.
#[derive(Debug, Error)]
#[error("job {job_id} task aborted: {message}")]
pub struct SupervisorFault {
    pub job_id: JobId,
    pub message: String,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "signal".to_string(),
    }
}

fn tail_chars(s: &str, max: usize) -> &str {
    let count = s.chars().count();
    if count <= max {
        return s;
    }
    let skip = count - max;
    let start = s.char_indices().nth(skip).map_or(0, |(i, _)| i);
    &s[start..]
}
