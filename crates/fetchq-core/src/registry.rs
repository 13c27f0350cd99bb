//! Shared job registry: job store, pending queue and the in-flight job behind one lock.
//!
//! Every mutation takes the lock exactly once, so a status poll never observes a
//! half-applied update (e.g. `completed` with progress below 100), and a pause
//! issued from the control surface is seen by the worker at its next checkpoint.
//! The lock is never held across an `.await`.

use chrono::Utc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::error::ControlError;
use crate::job::{JobId, JobStatus, JobView, Quality, MAX_RUNNING_PROGRESS};
use crate::queue::PendingQueue;
use crate::store::JobStore;

/// A job handed to the fetch executor by [`Registry::claim_next`].
#[derive(Debug, Clone)]
pub struct Claim {
    pub id: JobId,
    pub target: String,
    pub quality: Quality,
    /// Cancelled when the job is paused (or the worker shuts down) mid-fetch.
    pub cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct State {
    store: JobStore,
    pending: PendingQueue,
    /// The one job currently `downloading`, with its cancellation token.
    active: Option<(JobId, CancellationToken)>,
}

impl State {
    /// `queued`/`downloading` → `paused`: out of dispatch eligibility, in-flight fetch signalled.
    fn park(&mut self, id: JobId) -> bool {
        let Some(record) = self.store.get_mut(id) else {
            return false;
        };
        if !record.transition(JobStatus::Paused) {
            return false;
        }
        record.rate = None;
        self.pending.pause(id);
        if let Some((active, token)) = &self.active {
            if *active == id {
                token.cancel();
            }
        }
        true
    }

    /// `paused` → `queued`, appended at the tail of the pending queue.
    fn requeue(&mut self, id: JobId) -> bool {
        let Some(record) = self.store.get_mut(id) else {
            return false;
        };
        if !record.transition(JobStatus::Queued) {
            return false;
        }
        record.last_error = None;
        self.pending.resume(id);
        true
    }

    fn view(&self, id: JobId) -> Option<JobView> {
        self.store
            .get(id)
            .map(|r| r.view(self.pending.position(id)))
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    state: Mutex<State>,
    wake: Notify,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a `queued` record and appends it to the pending queue.
    /// Callers validate and normalize `target` first.
    pub fn enqueue(&self, target: String, quality: Quality) -> JobId {
        let id = {
            let mut guard = self.lock();
            let st = &mut *guard;
            let id = st.store.create(target, quality);
            st.pending.enqueue(id);
            id
        };
        tracing::debug!(job_id = id, "job queued");
        self.wake.notify_one();
        id
    }

    pub fn view(&self, id: JobId) -> Option<JobView> {
        self.lock().view(id)
    }

    /// All records in creation order, with queue positions computed now.
    pub fn list(&self) -> Vec<JobView> {
        let st = self.lock();
        let views = st
            .store
            .iter()
            .map(|r| r.view(st.pending.position(r.id)))
            .collect();
        views
    }

    pub fn status(&self, id: JobId) -> Option<JobStatus> {
        self.lock().store.get(id).map(|r| r.status)
    }

    /// Pauses a queued or downloading job; idempotent for paused jobs.
    /// Returns the status the job had before the call.
    pub fn pause(&self, id: JobId) -> Result<JobStatus, ControlError> {
        let mut st = self.lock();
        let status = st
            .store
            .get(id)
            .map(|r| r.status)
            .ok_or(ControlError::NotFound(id))?;
        match status {
            JobStatus::Paused => Ok(status),
            JobStatus::Completed | JobStatus::Failed => {
                Err(ControlError::InvalidState { id, status })
            }
            JobStatus::Queued | JobStatus::Downloading => {
                st.park(id);
                Ok(status)
            }
        }
    }

    /// Re-queues a paused job at the tail.
    pub fn resume(&self, id: JobId) -> Result<(), ControlError> {
        {
            let mut st = self.lock();
            let status = st
                .store
                .get(id)
                .map(|r| r.status)
                .ok_or(ControlError::NotFound(id))?;
            if status != JobStatus::Paused {
                return Err(ControlError::InvalidState { id, status });
            }
            st.requeue(id);
        }
        self.wake.notify_one();
        Ok(())
    }

    /// Pauses every queued or downloading job. Returns how many were paused.
    pub fn pause_all(&self) -> usize {
        let mut st = self.lock();
        let mut ids = st.store.ids_with_status(JobStatus::Queued);
        ids.extend(st.store.ids_with_status(JobStatus::Downloading));
        ids.into_iter().filter(|id| st.park(*id)).count()
    }

    /// Resumes every paused job in id order. Returns how many were resumed.
    pub fn resume_all(&self) -> usize {
        let resumed = {
            let mut st = self.lock();
            let ids = st.store.ids_with_status(JobStatus::Paused);
            ids.into_iter().filter(|id| st.requeue(*id)).count()
        };
        if resumed > 0 {
            self.wake.notify_one();
        }
        resumed
    }

    /// Pops the next eligible job and marks it `downloading`, unless a job is
    /// already in flight. This is the only way into `downloading`.
    pub fn claim_next(&self) -> Option<Claim> {
        let mut guard = self.lock();
        let st = &mut *guard;
        if st.active.is_some() {
            return None;
        }
        while let Some(id) = st.pending.pop_next_eligible() {
            let Some(record) = st.store.get_mut(id) else {
                tracing::warn!(job_id = id, "pending id without a record; dropped");
                continue;
            };
            if !record.transition(JobStatus::Downloading) {
                continue;
            }
            record.progress = 0;
            record.rate = None;
            let cancel = CancellationToken::new();
            let claim = Claim {
                id,
                target: record.target.clone(),
                quality: record.quality,
                cancel: cancel.clone(),
            };
            st.active = Some((id, cancel));
            return Some(claim);
        }
        None
    }

    /// Clears the in-flight slot once the executor for `id` has returned.
    pub fn release(&self, id: JobId) {
        let mut st = self.lock();
        if matches!(&st.active, Some((active, _)) if *active == id) {
            st.active = None;
        }
    }

    pub fn is_busy(&self) -> bool {
        self.lock().active.is_some()
    }

    /// Id of the job currently `downloading`, if any.
    pub fn active_job(&self) -> Option<JobId> {
        self.lock().active.as_ref().map(|(id, _)| *id)
    }

    /// Signals the in-flight fetch to stop (worker shutdown). The executor reports it as paused.
    pub fn cancel_active(&self) -> Option<JobId> {
        let st = self.lock();
        let cancelled = st.active.as_ref().map(|(id, token)| {
            token.cancel();
            *id
        });
        cancelled
    }

    /// Start of one identity attempt: progress back to 0, rate cleared.
    pub fn begin_attempt(&self, id: JobId) {
        let mut st = self.lock();
        if let Some(record) = st.store.get_mut(id) {
            if record.status == JobStatus::Downloading {
                record.progress = 0;
                record.rate = None;
            }
        }
    }

    /// Applies one progress line. Progress never goes backwards within an attempt
    /// and is capped at [`MAX_RUNNING_PROGRESS`]. Returns the stored progress.
    pub fn record_progress(&self, id: JobId, percent: f64, rate: Option<String>) -> Option<u8> {
        let mut st = self.lock();
        let record = st.store.get_mut(id)?;
        if record.status != JobStatus::Downloading {
            return None;
        }
        let observed = if percent.is_finite() {
            percent.clamp(0.0, f64::from(MAX_RUNNING_PROGRESS)) as u8
        } else {
            0
        };
        record.progress = record.progress.max(observed);
        record.rate = rate;
        Some(record.progress)
    }

    /// Replaces the placeholder title; a real title is never overwritten.
    pub fn adopt_title(&self, id: JobId, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        let mut st = self.lock();
        match st.store.get_mut(id) {
            Some(record) if record.has_placeholder_title() => {
                record.title = title.to_string();
                tracing::debug!(job_id = id, title, "title adopted");
                true
            }
            _ => false,
        }
    }

    /// `downloading` → `completed` with progress 100. False if the job was paused meanwhile.
    pub fn complete(&self, id: JobId, output_filename: String) -> bool {
        let mut st = self.lock();
        let Some(record) = st.store.get_mut(id) else {
            return false;
        };
        if !record.transition(JobStatus::Completed) {
            return false;
        }
        record.progress = 100;
        record.rate = None;
        record.last_error = None;
        record.output_filename = Some(output_filename);
        record.completed_at = Some(Utc::now());
        true
    }

    /// `downloading` → `failed` with `error` recorded. False if the job was paused meanwhile.
    pub fn fail(&self, id: JobId, error: String) -> bool {
        let mut st = self.lock();
        let Some(record) = st.store.get_mut(id) else {
            return false;
        };
        if !record.transition(JobStatus::Failed) {
            return false;
        }
        record.rate = None;
        record.last_error = Some(error);
        true
    }

    /// The executor observed its cancellation token. No-op if a control call already
    /// moved the job to `paused`.
    pub fn mark_paused(&self, id: JobId) -> bool {
        let mut st = self.lock();
        match st.store.get(id).map(|r| r.status) {
            Some(JobStatus::Downloading) => st.park(id),
            _ => false,
        }
    }

    /// Resolves on enqueue/resume, or after `timeout` at the latest.
    pub async fn wait_for_work(&self, timeout: Duration) {
        let _ = tokio::time::timeout(timeout, self.wake.notified()).await;
    }
}
