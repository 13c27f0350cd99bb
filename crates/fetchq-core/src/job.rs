//! Job record types shared by the store, the queue, the executor and the control surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ControlError;

/// Job identifier. Assigned by the store, never reused within a process.
pub type JobId = u64;

/// Title shown until the tool (or the title probe) reports the real one.
pub const PLACEHOLDER_TITLE: &str = "Fetching title...";

/// Highest progress a job may report while still downloading; 100 means completed.
pub const MAX_RUNNING_PROGRESS: u8 = 99;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Downloading,
    Paused,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Downloading => "downloading",
            JobStatus::Paused => "paused",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Edges of the job state machine. Anything else is refused by [`JobRecord::transition`].
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Queued, Downloading)
                | (Queued, Paused)
                | (Downloading, Completed)
                | (Downloading, Failed)
                | (Downloading, Paused)
                | (Paused, Queued)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality selector accepted at enqueue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Best,
    Worst,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Best => "best",
            Quality::Worst => "worst",
        }
    }

    /// Format-selection expression passed to the tool's `-f`.
    pub fn format_selector(self) -> &'static str {
        match self {
            Quality::Best => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
            Quality::Worst => "worst",
        }
    }
}

impl FromStr for Quality {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best" => Ok(Quality::Best),
            "worst" => Ok(Quality::Worst),
            other => Err(ControlError::InvalidInput(format!(
                "unknown quality {other:?} (expected \"best\" or \"worst\")"
            ))),
        }
    }
}

/// One submitted request and its current lifecycle state.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    /// Canonical source locator.
    pub target: String,
    pub quality: Quality,
    pub status: JobStatus,
    /// 0..=99 while downloading, 100 only once completed.
    pub progress: u8,
    pub title: String,
    /// Last transfer rate reported by the tool, e.g. `"1.20MiB/s"`.
    pub rate: Option<String>,
    pub output_filename: Option<String>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(id: JobId, target: String, quality: Quality) -> Self {
        Self {
            id,
            target,
            quality,
            status: JobStatus::Queued,
            progress: 0,
            title: PLACEHOLDER_TITLE.to_string(),
            rate: None,
            output_filename: None,
            last_error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn has_placeholder_title(&self) -> bool {
        self.title == PLACEHOLDER_TITLE
    }

    /// Moves to `next` if the state machine allows it. Returns false (and logs)
    /// when the edge does not exist; the record is left untouched.
    pub fn transition(&mut self, next: JobStatus) -> bool {
        if !self.status.can_transition_to(next) {
            tracing::warn!(
                job_id = self.id,
                from = %self.status,
                to = %next,
                "refusing status transition"
            );
            return false;
        }
        tracing::debug!(job_id = self.id, from = %self.status, to = %next, "status change");
        self.status = next;
        true
    }

    /// Snapshot for the control surface; `queue_position` is computed by the caller.
    pub fn view(&self, queue_position: Option<usize>) -> JobView {
        JobView {
            id: self.id,
            target: self.target.clone(),
            quality: self.quality,
            status: self.status,
            progress: self.progress,
            title: self.title.clone(),
            rate: self.rate.clone(),
            output_filename: self.output_filename.clone(),
            last_error: self.last_error.clone(),
            queue_position,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

/// Read-only view returned by status queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobView {
    pub id: JobId,
    pub target: String,
    pub quality: Quality,
    pub status: JobStatus,
    pub progress: u8,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// 1-based position among dispatch-eligible pending jobs; absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobStatus; 5] = [
        JobStatus::Queued,
        JobStatus::Downloading,
        JobStatus::Paused,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    #[test]
    fn state_machine_has_exactly_the_documented_edges() {
        let allowed = [
            (JobStatus::Queued, JobStatus::Downloading),
            (JobStatus::Queued, JobStatus::Paused),
            (JobStatus::Downloading, JobStatus::Completed),
            (JobStatus::Downloading, JobStatus::Failed),
            (JobStatus::Downloading, JobStatus::Paused),
            (JobStatus::Paused, JobStatus::Queued),
        ];
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for to in ALL {
            assert!(!JobStatus::Completed.can_transition_to(to));
            assert!(!JobStatus::Failed.can_transition_to(to));
        }
    }

    #[test]
    fn refused_transition_leaves_record_untouched() {
        let mut rec = JobRecord::new(1, "t".into(), Quality::Best);
        assert!(!rec.transition(JobStatus::Completed));
        assert_eq!(rec.status, JobStatus::Queued);
        assert!(rec.transition(JobStatus::Downloading));
        assert_eq!(rec.status, JobStatus::Downloading);
    }

    #[test]
    fn new_record_starts_queued_with_placeholder() {
        let rec = JobRecord::new(7, "https://www.youtube.com/watch?v=AAAAAAAAAAA".into(), Quality::Worst);
        assert_eq!(rec.status, JobStatus::Queued);
        assert_eq!(rec.progress, 0);
        assert!(rec.has_placeholder_title());
        assert!(rec.completed_at.is_none());
    }

    #[test]
    fn quality_parses_case_insensitively() {
        assert_eq!("best".parse::<Quality>().unwrap(), Quality::Best);
        assert_eq!(" WORST ".parse::<Quality>().unwrap(), Quality::Worst);
        assert!(matches!(
            "1080p".parse::<Quality>(),
            Err(ControlError::InvalidInput(_))
        ));
    }

    #[test]
    fn job_view_serializes_status_lowercase() {
        let rec = JobRecord::new(3, "t".into(), Quality::Best);
        let json = serde_json::to_value(rec.view(Some(1))).unwrap();
        assert_eq!(json["status"], "queued");
        assert_eq!(json["quality"], "best");
        assert_eq!(json["queue_position"], 1);
        assert!(json.get("last_error").is_none());
    }
}
