//! Dispatch stage: a further copy, source database to the
//! dispatch target selected by the metadata stage. Grounded in the
//! original `dispatch_db_task`, which reuses the copy service.

use std::sync::Arc;

use async_trait::async_trait;
use handover_client::{DbCopyClient, DbCopyStatus, DbCopySubmission};
use handover_shared::{HandoverSpec, Report, ReportType};
use tracing::warn;

use super::notifier::EmailNotifier;
use crate::errors::OrchestrationResult;
use crate::journal::Journal;
use crate::runtime::{Stage, StageOutcome};
use super::copy::host_and_port;

pub struct DispatchStage {
    client: DbCopyClient,
    journal: Arc<dyn Journal>,
    notifier: Arc<dyn EmailNotifier>,
    copy_user: String,
}

impl DispatchStage {
    pub fn new(
        client: DbCopyClient,
        journal: Arc<dyn Journal>,
        notifier: Arc<dyn EmailNotifier>,
        copy_user: impl Into<String>,
    ) -> Self {
        Self {
            client,
            journal,
            notifier,
            copy_user: copy_user.into(),
        }
    }

    async fn fail(&self, spec: &HandoverSpec, message: String) {
        let report = Report::new(
            ReportType::Error,
            message.clone(),
            serde_json::to_value(spec).unwrap_or_default(),
            spec.tgt_uri.clone(),
        );
        if let Err(err) = self.journal.append(report).await {
            warn!(%err, "failed to journal dispatch failure");
        }
        self.notifier
            .notify(&spec.contact, "Handover failed", &message)
            .await;
    }
}

#[async_trait]
impl Stage for DispatchStage {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    async fn run(&self, mut spec: HandoverSpec) -> OrchestrationResult<StageOutcome> {
        let job_id = match &spec.dispatch_job_id {
            Some(id) => id.clone(),
            None => {
                let src_host = host_and_port(&spec.src_uri);
                let tgt_host = host_and_port(&spec.tgt_uri);
                let submission = DbCopySubmission {
                    src_host: &src_host,
                    src_incl_db: &spec.database,
                    tgt_host: &tgt_host,
                    tgt_db_name: &spec.database,
                    overwrite: false,
                    user: &self.copy_user,
                };
                let job_id = match self.client.submit(&submission).await {
                    Ok(job_id) => job_id,
                    Err(err) => {
                        self.fail(&spec, format!("Submitting dispatch job failed, Handover failed: {err}"))
                            .await;
                        return Ok(StageOutcome::Terminate { spec, success: false });
                    }
                };
                spec.dispatch_job_id = Some(job_id.clone());

                let report = Report::new(
                    ReportType::Info,
                    format!(
                        "Copying in progress, please see: {}",
                        self.client.job_url(&job_id)
                    ),
                    serde_json::to_value(&spec).unwrap_or_default(),
                    spec.tgt_uri.clone(),
                );
                self.journal.append(report).await?;

                job_id
            }
        };

        let status = match self.client.status(&job_id).await {
            Ok(status) => status,
            Err(err) => {
                self.fail(&spec, format!("Checking dispatch status failed, Handover failed: {err}"))
                    .await;
                return Ok(StageOutcome::Terminate { spec, success: false });
            }
        };

        match status.overall_status {
            DbCopyStatus::Scheduled | DbCopyStatus::Running | DbCopyStatus::Submitted => {
                Ok(StageOutcome::Retry(spec))
            }
            DbCopyStatus::Complete => {
                spec.progress_complete = 4;
                Ok(StageOutcome::Terminate { spec, success: true })
            }
            DbCopyStatus::Failed => {
                let message = format!("Copy failed, please see: {}", self.client.job_url(&job_id));
                self.fail(&spec, message).await;
                Ok(StageOutcome::Terminate { spec, success: false })
            }
        }
    }
}
