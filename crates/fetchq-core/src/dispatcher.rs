//! Single-worker dispatcher.
//!
//! Alternates between idle and busy: claim the next eligible job, run it to an
//! outcome, release the slot, repeat. At most one job is `downloading` at any
//! time because the registry refuses a second claim while one is active.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::FetchqConfig;
use crate::error::SupervisorFault;
use crate::executor::{FetchExecutor, FetchOutcome};
use crate::job::JobId;
use crate::registry::Registry;
use crate::title::TitleProber;

/// One finished dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub job_id: JobId,
    pub outcome: FetchOutcome,
}

pub struct Dispatcher {
    registry: Arc<Registry>,
    executor: Arc<FetchExecutor>,
    titles: Option<Arc<TitleProber>>,
    idle_poll: Duration,
    fault_backoff: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, executor: Arc<FetchExecutor>, cfg: &FetchqConfig) -> Self {
        Self {
            registry,
            executor,
            titles: None,
            idle_poll: cfg.idle_poll(),
            fault_backoff: cfg.fault_backoff(),
        }
    }

    /// Title probes for jobs that reach a terminal state are aborted.
    pub fn with_title_prober(mut self, titles: Arc<TitleProber>) -> Self {
        self.titles = Some(titles);
        self
    }

    /// Runs the next eligible job to completion. `Ok(None)` if nothing is eligible
    /// or a job is already in flight.
    ///
    /// The executor runs on its own task so a panic inside it surfaces here as a
    /// [`SupervisorFault`]; the job is then marked failed and the slot is freed.
    pub async fn dispatch_next(&self) -> Result<Option<Dispatched>, SupervisorFault> {
        let Some(claim) = self.registry.claim_next() else {
            return Ok(None);
        };
        let job_id = claim.id;
        tracing::debug!(job_id, target = %claim.target, "dispatching job");

        let executor = Arc::clone(&self.executor);
        let joined = tokio::spawn(async move { executor.run(&claim).await }).await;

        let result = match joined {
            Ok(outcome) => Ok(Some(Dispatched { job_id, outcome })),
            Err(join_error) => {
                let message = if join_error.is_panic() {
                    "fetch task panicked"
                } else {
                    "fetch task was aborted"
                };
                self.registry
                    .fail(job_id, format!("internal fault: {message}"));
                Err(SupervisorFault {
                    job_id,
                    message: message.to_string(),
                })
            }
        };

        self.registry.release(job_id);
        if let Some(titles) = &self.titles {
            if self.registry.status(job_id).is_some_and(|s| s.is_terminal()) {
                titles.cancel(job_id);
            }
        }
        result
    }

    /// Dispatch loop. On `shutdown` the in-flight fetch is cancelled (the job ends
    /// up `paused`) and the loop returns once it has stopped.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!("dispatcher started");
        while !shutdown.is_cancelled() {
            let dispatch = self.dispatch_next();
            tokio::pin!(dispatch);
            let result = tokio::select! {
                result = &mut dispatch => result,
                _ = shutdown.cancelled() => {
                    if let Some(job_id) = self.registry.cancel_active() {
                        tracing::info!(job_id, "shutdown: stopping in-flight fetch");
                    }
                    dispatch.await
                }
            };

            match result {
                Ok(Some(done)) => {
                    tracing::debug!(job_id = done.job_id, outcome = ?done.outcome, "dispatch finished");
                }
                Ok(None) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => {}
                        _ = self.registry.wait_for_work(self.idle_poll) => {}
                    }
                }
                Err(fault) => {
                    tracing::error!(job_id = fault.job_id, error = %fault, "supervisor fault; backing off");
                    tokio::select! {
                        _ = shutdown.cancelled() => {}
                        _ = tokio::time::sleep(self.fault_backoff) => {}
                    }
                }
            }
        }
        tracing::info!("dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobStatus, Quality};
    use std::path::PathBuf;

    fn dispatcher_with_tool(tool: &str) -> (Arc<Registry>, Dispatcher) {
        let registry = Arc::new(Registry::new());
        let cfg = FetchqConfig {
            tool_path: PathBuf::from(tool),
            idle_poll_ms: 10,
            ..FetchqConfig::default()
        };
        let executor = Arc::new(FetchExecutor::new(
            Arc::clone(&registry),
            &cfg,
            std::env::temp_dir(),
        ));
        let dispatcher = Dispatcher::new(Arc::clone(&registry), executor, &cfg);
        (registry, dispatcher)
    }

    #[tokio::test]
    async fn nothing_eligible_is_idle() {
        let (registry, dispatcher) = dispatcher_with_tool("/nonexistent/fetch-tool");
        assert_eq!(dispatcher.dispatch_next().await.unwrap(), None);
        let id = registry.enqueue("https://www.youtube.com/watch?v=AAAAAAAAAAA".into(), Quality::Best);
        registry.pause(id).unwrap();
        assert_eq!(dispatcher.dispatch_next().await.unwrap(), None);
        assert_eq!(registry.status(id), Some(JobStatus::Paused));
    }

    #[tokio::test]
    async fn unstartable_tool_fails_the_job_and_frees_the_slot() {
        let (registry, dispatcher) = dispatcher_with_tool("/nonexistent/fetch-tool");
        let id = registry.enqueue("https://www.youtube.com/watch?v=AAAAAAAAAAA".into(), Quality::Best);
        let done = dispatcher.dispatch_next().await.unwrap().unwrap();
        assert_eq!(done.job_id, id);
        assert!(matches!(done.outcome, FetchOutcome::Failed { .. }));
        assert!(!registry.is_busy());
        let view = registry.view(id).unwrap();
        assert_eq!(view.status, JobStatus::Failed);
        assert!(view.last_error.unwrap().contains("failed to start"));
    }

    #[tokio::test]
    async fn run_returns_on_shutdown() {
        let (_registry, dispatcher) = dispatcher_with_tool("/nonexistent/fetch-tool");
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), dispatcher.run(shutdown))
            .await
            .expect("dispatcher did not stop");
    }
}
