//! The stage chain that replaced this system's original Celery `chain()`
//! of `dbcopy_task | datacheck_task | metadata_update_task` calls.
//! Each [`Stage`] is one downstream submission-and-poll cycle;
//! [`Chain`] runs them in order, journaling a report at every
//! transition and honoring revocation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use handover_shared::{HandoverSpec, Report, ReportType};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::OrchestrationResult;
use crate::journal::Journal;
use crate::runtime::registry::{TaskHandle, TaskRegistry, TaskState};

/// What a stage did with the spec it was handed.
pub enum StageOutcome {
    /// The stage's job finished successfully; move to the next stage.
    Advance(HandoverSpec),
    /// The stage's job hasn't reached a terminal state yet; poll again
    /// after the configured retry delay.
    Retry(HandoverSpec),
    /// The chain stops here — either the stage's job failed terminally
    /// (`success = false`), or it finished successfully with no further
    /// stage needed (e.g. GRCh37's copy-only pipeline, or metadata
    /// completing without a dispatch decision).
    Terminate { spec: HandoverSpec, success: bool },
}

#[async_trait]
pub trait Stage: Send + Sync {
    /// Used in journaled reports and logs; one of `datacheck`, `dbcopy`,
    /// `metadata`, `dispatch`.
    fn name(&self) -> &'static str;

    async fn run(&self, spec: HandoverSpec) -> OrchestrationResult<StageOutcome>;
}

/// Drives a handover's `HandoverSpec` through an ordered list of stages,
/// retrying each one until it advances or terminates, and recording every
/// transition in the journal.
pub struct Chain {
    stages: Vec<Arc<dyn Stage>>,
    journal: Arc<dyn Journal>,
    registry: Arc<TaskRegistry>,
    retry_delay: Duration,
}

impl Chain {
    pub fn new(
        stages: Vec<Arc<dyn Stage>>,
        journal: Arc<dyn Journal>,
        registry: Arc<TaskRegistry>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            stages,
            journal,
            registry,
            retry_delay,
        }
    }

    /// Runs every stage for `spec` in order, returning the final spec.
    /// The task must already be registered in `registry` under
    /// `spec.handover_token`.
    pub async fn run(&self, mut spec: HandoverSpec, handle: &TaskHandle) -> HandoverSpec {
        handle.set_state(TaskState::Started);

        for stage in &self.stages {
            if handle.state() == TaskState::Revoked {
                self.journal_note(&spec, "Job Revoked").await;
                return spec;
            }

            // Rewritten each time a stage starts; the journal entry below records it before the stage's
            // first external submission.
            spec.task_id = Some(Uuid::new_v4());
            self.journal_note(&spec, &format!("Entering {} stage", stage.name())).await;

            loop {
                let outcome = match stage.run(spec.clone()).await {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        warn!(stage = stage.name(), %err, "stage returned an error");
                        handle.set_state(TaskState::Failure);
                        self.journal_note(&spec, &format!("{} failed: {err}", stage.name())).await;
                        return spec;
                    }
                };

                match outcome {
                    StageOutcome::Advance(next) => {
                        spec = next;
                        break;
                    }
                    StageOutcome::Retry(next) => {
                        spec = next;
                        handle.set_state(TaskState::Retry);
                        let retries = handle.bump_retry();
                        info!(stage = stage.name(), retries, "stage not yet terminal, retrying");

                        if !handle.wait_or_cancel(self.retry_delay).await {
                            handle.set_state(TaskState::Revoked);
                            self.journal_note(&spec, "Job Revoked").await;
                            return spec;
                        }
                        handle.set_state(TaskState::Started);
                    }
                    StageOutcome::Terminate { spec: next, success } => {
                        spec = next;
                        handle.set_state(if success { TaskState::Success } else { TaskState::Failure });
                        if success {
                            self.journal_note(&spec, "Handover successful").await;
                        }
                        return spec;
                    }
                }
            }
        }

        handle.set_state(TaskState::Success);
        self.journal_note(&spec, "Handover successful").await;
        spec
    }

    async fn journal_note(&self, spec: &HandoverSpec, message: &str) {
        let report = Report::new(
            ReportType::Info,
            message.to_string(),
            serde_json::to_value(spec).unwrap_or_default(),
            spec.src_uri.clone(),
        );
        if let Err(err) = self.journal.append(report).await {
            warn!(%err, "failed to journal stage transition");
        }
    }
}
