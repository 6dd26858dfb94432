//! Copy stage: submits once, polls to terminal. Grounded in
//! the original `dbcopy_task`.

use std::sync::Arc;

use async_trait::async_trait;
use handover_client::{DbCopyClient, DbCopyStatus, DbCopySubmission};
use handover_shared::{HandoverSpec, Report, ReportType};
use tracing::warn;

use super::notifier::EmailNotifier;
use crate::errors::OrchestrationResult;
use crate::journal::Journal;
use crate::runtime::{Stage, StageOutcome};

pub struct CopyStage {
    client: DbCopyClient,
    journal: Arc<dyn Journal>,
    notifier: Arc<dyn EmailNotifier>,
    copy_user: String,
}

impl CopyStage {
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
            warn!(%err, "failed to journal copy failure");
        }
        self.notifier
            .notify(&spec.contact, "Handover failed", &message)
            .await;
    }
}

/// `host[:port]` out of a `scheme://user@host:port/database`-shaped URI,
/// the shape the copy service's `src_host`/`tgt_host` submission fields
/// expect. Falls back to the whole URI if it doesn't parse as a URL.
pub(crate) fn host_and_port(uri: &str) -> String {
    match url::Url::parse(uri) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            _ => uri.to_string(),
        },
        Err(_) => uri.to_string(),
    }
}

#[async_trait]
impl Stage for CopyStage {
    fn name(&self) -> &'static str {
        "dbcopy"
    }

    async fn run(&self, mut spec: HandoverSpec) -> OrchestrationResult<StageOutcome> {
        let job_id = match &spec.copy_job_id {
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
                        self.fail(&spec, format!("Submitting copy job failed, Handover failed: {err}"))
                            .await;
                        return Ok(StageOutcome::Terminate { spec, success: false });
                    }
                };
                spec.copy_job_id = Some(job_id.clone());

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
                self.fail(&spec, format!("Checking copy status failed, Handover failed: {err}"))
                    .await;
                return Ok(StageOutcome::Terminate { spec, success: false });
            }
        };

        match status.overall_status {
            DbCopyStatus::Scheduled | DbCopyStatus::Running | DbCopyStatus::Submitted => {
                Ok(StageOutcome::Retry(spec))
            }
            DbCopyStatus::Complete if spec.grch37 => {
                spec.progress_complete = 3;
                Ok(StageOutcome::Terminate { spec, success: true })
            }
            DbCopyStatus::Complete => {
                spec.progress_complete = 2;
                Ok(StageOutcome::Advance(spec))
            }
            DbCopyStatus::Failed => {
                let message = format!("Copy failed, please see: {}", self.client.job_url(&job_id));
                self.fail(&spec, message).await;
                Ok(StageOutcome::Terminate { spec, success: false })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_and_port_extracts_authority() {
        assert_eq!(host_and_port("mysql://u@h:3306/homo_sapiens_core_108_38"), "h:3306");
    }

    #[test]
    fn host_and_port_falls_back_to_input_when_unparseable() {
        assert_eq!(host_and_port("not-a-url"), "not-a-url");
    }
}
