//! Fetch executor: runs one claimed job end to end.
//!
//! The tool is invoked once per client identity, in priority order, until one
//! attempt leaves a finished file behind. Attempt failures of any kind (spawn
//! error, non-zero exit, missing output) only advance to the next identity; the
//! job is marked `failed` once the list is exhausted. A cancelled token ends the
//! job as `paused` and no further identity is tried.

mod attempt;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{FetchqConfig, ToolConfig};
use crate::error::AttemptFailure;
use crate::job::JobId;
use crate::registry::{Claim, Registry};
use crate::tool::{download_args, ClientIdentity, DEFAULT_IDENTITIES};

use self::attempt::{run_attempt, AttemptOutcome};

/// How a job's fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Completed {
        output_filename: String,
        identity: &'static str,
    },
    Paused,
    Failed {
        error: String,
    },
}

pub struct FetchExecutor {
    registry: Arc<Registry>,
    program: PathBuf,
    tool: ToolConfig,
    download_dir: PathBuf,
    identities: Vec<ClientIdentity>,
}

impl FetchExecutor {
    pub fn new(registry: Arc<Registry>, cfg: &FetchqConfig, download_dir: PathBuf) -> Self {
        Self {
            registry,
            program: cfg.tool_path.clone(),
            tool: cfg.tool_or_default(),
            download_dir,
            identities: DEFAULT_IDENTITIES.to_vec(),
        }
    }

    /// Replaces the identity fallback list.
    pub fn with_identities(mut self, identities: Vec<ClientIdentity>) -> Self {
        self.identities = identities;
        self
    }

    /// Runs `job` through the identity list and records the result in the registry.
    pub async fn run(&self, job: &Claim) -> FetchOutcome {
        let total = self.identities.len();
        let mut last_error: Option<String> = None;

        for (index, identity) in self.identities.iter().enumerate() {
            if job.cancel.is_cancelled() {
                return self.paused(job.id);
            }
            self.registry.begin_attempt(job.id);
            tracing::info!(
                job_id = job.id,
                identity = identity.name,
                attempt = index + 1,
                of = total,
                "starting fetch attempt"
            );

            let args = download_args(
                &job.target,
                job.quality,
                identity,
                &self.download_dir,
                &self.tool,
            );
            let result = match run_attempt(&self.registry, job.id, &self.program, &args, &job.cancel)
                .await
            {
                Ok(AttemptOutcome::Cancelled) => return self.paused(job.id),
                Ok(AttemptOutcome::Exited) => self.locate_output().await,
                Err(failure) => Err(failure),
            };

            match result {
                Ok(output_filename) => {
                    if !self.registry.complete(job.id, output_filename.clone()) {
                        // Paused between tool exit and here; the file stays for the next run.
                        return FetchOutcome::Paused;
                    }
                    tracing::info!(
                        job_id = job.id,
                        identity = identity.name,
                        file = %output_filename,
                        "job completed"
                    );
                    return FetchOutcome::Completed {
                        output_filename,
                        identity: identity.name,
                    };
                }
                Err(failure) => {
                    let rejection = failure.rejection();
                    if rejection.is_identity_rejection() {
                        tracing::warn!(
                            job_id = job.id,
                            identity = identity.name,
                            ?rejection,
                            "identity rejected by source; trying next"
                        );
                    } else {
                        tracing::warn!(
                            job_id = job.id,
                            identity = identity.name,
                            error = %failure,
                            "fetch attempt failed; trying next"
                        );
                    }
                    last_error = Some(failure.diagnostic());
                }
            }
        }

        let error = last_error.unwrap_or_else(|| "no client identity succeeded".to_string());
        if self.registry.fail(job.id, error.clone()) {
            tracing::error!(job_id = job.id, "all client identities failed");
            FetchOutcome::Failed { error }
        } else {
            FetchOutcome::Paused
        }
    }

    async fn locate_output(&self) -> Result<String, AttemptFailure> {
        output::newest_output(&self.download_dir)
            .await?
            .ok_or_else(|| AttemptFailure::MissingOutput(self.download_dir.clone()))
    }

    fn paused(&self, id: JobId) -> FetchOutcome {
        self.registry.mark_paused(id);
        tracing::info!(job_id = id, "fetch stopped: job paused");
        FetchOutcome::Paused
    }
}
