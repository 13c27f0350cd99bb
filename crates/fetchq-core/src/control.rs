//! Control surface: the operations a client may issue against the queue.
//!
//! All operations are synchronous against the registry and never wait for the
//! worker. [`Request`]/[`Response`] are the JSON-lines wire form used by the
//! control socket; [`Control::handle`] maps one onto the other.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ControlError;
use crate::job::{JobId, JobView, Quality};
use crate::locator;
use crate::logging::state_dir;
use crate::registry::Registry;
use crate::title::TitleProber;

/// Requested move for [`Control::prioritize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Enqueue {
        target: String,
        #[serde(default = "default_quality")]
        quality: String,
    },
    List,
    Status {
        id: JobId,
    },
    Pause {
        id: JobId,
    },
    Resume {
        id: JobId,
    },
    PauseAll,
    ResumeAll,
    Prioritize {
        id: JobId,
        direction: Direction,
    },
}

fn default_quality() -> String {
    Quality::default().as_str().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Enqueued { id: JobId },
    Jobs { jobs: Vec<JobView> },
    Job { job: JobView },
    Done,
    Count { count: usize },
    Error { kind: String, message: String },
}

impl From<ControlError> for Response {
    fn from(e: ControlError) -> Self {
        Response::Error {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

/// Control socket path: `~/.local/state/fetchq/control.sock`.
pub fn default_control_socket_path() -> Result<PathBuf> {
    Ok(state_dir()?.join("control.sock"))
}

pub struct Control {
    registry: Arc<Registry>,
    titles: Option<Arc<TitleProber>>,
}

impl Control {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            titles: None,
        }
    }

    /// Enqueued jobs get a background title probe.
    pub fn with_title_prober(mut self, titles: Arc<TitleProber>) -> Self {
        self.titles = Some(titles);
        self
    }

    /// Validates and normalizes `target`, parses `quality` and queues a new job.
    pub fn enqueue(&self, target: &str, quality: &str) -> Result<JobId, ControlError> {
        let quality: Quality = quality.parse()?;
        let target = locator::validate(target)?;
        let id = self.registry.enqueue(target.clone(), quality);
        tracing::info!(job_id = id, %target, quality = quality.as_str(), "job enqueued");
        if let Some(titles) = &self.titles {
            titles.spawn(id, target);
        }
        Ok(id)
    }

    /// Every job ever submitted, in submission order.
    pub fn list_queue(&self) -> Vec<JobView> {
        self.registry.list()
    }

    pub fn status(&self, id: JobId) -> Result<JobView, ControlError> {
        self.registry.view(id).ok_or(ControlError::NotFound(id))
    }

    pub fn pause(&self, id: JobId) -> Result<(), ControlError> {
        let was = self.registry.pause(id)?;
        tracing::info!(job_id = id, %was, "job paused");
        Ok(())
    }

    pub fn resume(&self, id: JobId) -> Result<(), ControlError> {
        self.registry.resume(id)?;
        tracing::info!(job_id = id, "job resumed");
        Ok(())
    }

    /// Pauses every `queued` and `downloading` job. Returns how many changed.
    pub fn pause_all(&self) -> usize {
        let count = self.registry.pause_all();
        tracing::info!(count, "pause all");
        count
    }

    /// Resumes every `paused` job, oldest first. Returns how many changed.
    pub fn resume_all(&self) -> usize {
        let count = self.registry.resume_all();
        tracing::info!(count, "resume all");
        count
    }

    /// Accepted for interface compatibility; queue order is never changed.
    pub fn prioritize(&self, id: JobId, direction: Direction) -> Result<(), ControlError> {
        if self.registry.view(id).is_none() {
            return Err(ControlError::NotFound(id));
        }
        tracing::debug!(job_id = id, ?direction, "prioritize ignored: reordering unsupported");
        Ok(())
    }

    pub fn handle(&self, request: Request) -> Response {
        match request {
            Request::Enqueue { target, quality } => match self.enqueue(&target, &quality) {
                Ok(id) => Response::Enqueued { id },
                Err(e) => e.into(),
            },
            Request::List => Response::Jobs {
                jobs: self.list_queue(),
            },
            Request::Status { id } => match self.status(id) {
                Ok(job) => Response::Job { job },
                Err(e) => e.into(),
            },
            Request::Pause { id } => done(self.pause(id)),
            Request::Resume { id } => done(self.resume(id)),
            Request::PauseAll => Response::Count {
                count: self.pause_all(),
            },
            Request::ResumeAll => Response::Count {
                count: self.resume_all(),
            },
            Request::Prioritize { id, direction } => done(self.prioritize(id, direction)),
        }
    }

    /// Decodes one JSON request line and handles it. Malformed input is answered
    /// with a `bad_request` error rather than dropped.
    pub fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line.trim()) {
            Ok(request) => self.handle(request),
            Err(e) => Response::Error {
                kind: "bad_request".to_string(),
                message: e.to_string(),
            },
        }
    }
}

fn done(result: Result<(), ControlError>) -> Response {
    match result {
        Ok(()) => Response::Done,
        Err(e) => e.into(),
    }
}
