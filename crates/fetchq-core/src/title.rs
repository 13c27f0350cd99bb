//! Concurrent title probe.
//!
//! Resolving a title is cheap compared to a download, so it runs right after
//! enqueue, outside the single-worker slot. Whatever the probe finds is only
//! adopted while the job still shows the placeholder; a title reported by the
//! fetch itself always wins. At most `title_probe_limit` probes run the tool
//! at once; the rest wait for a permit.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::AbortHandle;

use crate::config::{FetchqConfig, ToolConfig};
use crate::job::JobId;
use crate::registry::Registry;
use crate::tool::{title_args, ClientIdentity, DEFAULT_IDENTITIES};

pub struct TitleProber {
    registry: Arc<Registry>,
    program: PathBuf,
    tool: ToolConfig,
    identities: Vec<ClientIdentity>,
    tasks: Mutex<HashMap<JobId, AbortHandle>>,
    permits: Semaphore,
}

impl TitleProber {
    pub fn new(registry: Arc<Registry>, cfg: &FetchqConfig) -> Self {
        Self {
            registry,
            program: cfg.tool_path.clone(),
            tool: cfg.tool_or_default(),
            identities: DEFAULT_IDENTITIES.to_vec(),
            tasks: Mutex::new(HashMap::new()),
            permits: Semaphore::new(cfg.title_probe_limit()),
        }
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<JobId, AbortHandle>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a background probe for `job_id`. Must be called inside a tokio runtime.
    pub fn spawn(self: &Arc<Self>, job_id: JobId, target: String) {
        let prober = Arc::clone(self);
        // Hold the map while spawning so the task's own removal cannot run first.
        let mut tasks = self.tasks();
        let handle = tokio::spawn(async move {
            match prober.probe(&target).await {
                Some(title) => {
                    if !prober.registry.adopt_title(job_id, &title) {
                        tracing::debug!(job_id, "probed title not adopted; job already titled");
                    }
                }
                None => tracing::debug!(job_id, "title probe found nothing"),
            }
            prober.tasks().remove(&job_id);
        });
        if let Some(previous) = tasks.insert(job_id, handle.abort_handle()) {
            previous.abort();
        }
    }

    /// Aborts the probe for `job_id` (its tool process is killed on drop).
    pub fn cancel(&self, job_id: JobId) -> bool {
        match self.tasks().remove(&job_id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Number of probes still pending, running or waiting for a permit.
    pub fn in_flight(&self) -> usize {
        self.tasks().len()
    }

    async fn probe(&self, target: &str) -> Option<String> {
        // Held across the whole identity loop; dropped with the task on abort.
        let _permit = self.permits.acquire().await.ok()?;
        for identity in &self.identities {
            let args = title_args(target, identity, &self.tool);
            let output = Command::new(&self.program)
                .args(&args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await;
            match output {
                Ok(out) if out.status.success() => {
                    let stdout = String::from_utf8_lossy(&out.stdout);
                    if let Some(title) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
                        return Some(title.to_string());
                    }
                }
                Ok(out) => {
                    tracing::debug!(identity = identity.name, status = %out.status, "title probe rejected");
                }
                Err(e) => {
                    tracing::debug!(identity = identity.name, "title probe could not start: {e}");
                    return None;
                }
            }
        }
        None
    }
}
