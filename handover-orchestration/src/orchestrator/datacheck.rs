//! DC stage: already submitted at ingress; this stage only
//! polls. Grounded in the original `datacheck_task`.

use std::sync::Arc;

use async_trait::async_trait;
use handover_client::{DataCheckClient, DataCheckStatus};
use handover_shared::{HandoverSpec, Report, ReportType};
use tracing::warn;

use super::notifier::EmailNotifier;
use crate::errors::{OrchestrationError, OrchestrationResult};
use crate::journal::Journal;
use crate::runtime::{Stage, StageOutcome};

pub struct DataCheckStage {
    client: DataCheckClient,
    journal: Arc<dyn Journal>,
    notifier: Arc<dyn EmailNotifier>,
}

impl DataCheckStage {
    pub fn new(client: DataCheckClient, journal: Arc<dyn Journal>, notifier: Arc<dyn EmailNotifier>) -> Self {
        Self {
            client,
            journal,
            notifier,
        }
    }

    async fn fail(&self, spec: &HandoverSpec, message: String) {
        let report = Report::new(
            ReportType::Error,
            message.clone(),
            serde_json::to_value(spec).unwrap_or_default(),
            spec.src_uri.clone(),
        );
        if let Err(err) = self.journal.append(report).await {
            warn!(%err, "failed to journal datacheck failure");
        }
        self.notifier
            .notify(&spec.contact, "Handover failed", &message)
            .await;
    }
}

#[async_trait]
impl Stage for DataCheckStage {
    fn name(&self) -> &'static str {
        "datacheck"
    }

    async fn run(&self, mut spec: HandoverSpec) -> OrchestrationResult<StageOutcome> {
        let job_id = spec
            .dc_job_id
            .clone()
            .ok_or(OrchestrationError::MissingJobId { stage: "datacheck" })?;

        let status = match self.client.status(&job_id).await {
            Ok(status) => status,
            Err(err) => {
                self.fail(&spec, format!("Checking datacheck status failed, Handover failed: {err}"))
                    .await;
                return Ok(StageOutcome::Terminate { spec, success: false });
            }
        };
        spec.job_progress = status.progress.clone();

        match status.status {
            DataCheckStatus::Submitted | DataCheckStatus::Running | DataCheckStatus::Incomplete => {
                Ok(StageOutcome::Retry(spec))
            }
            DataCheckStatus::Passed => {
                spec.clear_job_progress();
                spec.progress_complete = 1;
                Ok(StageOutcome::Advance(spec))
            }
            DataCheckStatus::Failed => {
                let download_url = self.client.download_output_url(&job_id);
                let message = format!(
                    "Datachecks found problems, Handover failed, you can download the output here: {download_url}"
                );
                self.fail(&spec, message).await;
                Ok(StageOutcome::Terminate { spec, success: false })
            }
            DataCheckStatus::DcRunError => {
                self.fail(&spec, "Datachecks didn't run successfully, Handover failed.".to_string())
                    .await;
                Ok(StageOutcome::Terminate { spec, success: false })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::InMemoryJournal;
    use crate::orchestrator::notifier::test_utils::RecordingNotifier;
    use handover_shared::{DbDivision, DbType};
    use uuid::Uuid;

    fn sample_spec(dc_job_id: Option<&str>) -> HandoverSpec {
        HandoverSpec {
            src_uri: "mysql://u@h:3306/homo_sapiens_core_108_38".into(),
            tgt_uri: "mysql://stage@staging:3306/homo_sapiens_core_108_38".into(),
            contact: "a@x".into(),
            comment: "c".into(),
            database: "homo_sapiens_core_108_38".into(),
            handover_token: Uuid::new_v4(),
            db_type: DbType::Core,
            db_division: DbDivision::Vertebrates,
            staging_uri: "mysql://stage@staging:3306/".into(),
            progress_total: 3,
            progress_complete: 0,
            dc_job_id: dc_job_id.map(String::from),
            copy_job_id: None,
            metadata_job_id: None,
            dispatch_job_id: None,
            task_id: None,
            job_progress: None,
            grch37: false,
            genome: None,
        }
    }

    #[tokio::test]
    async fn missing_job_id_is_rejected() {
        let stage = DataCheckStage::new(
            DataCheckClient::new("https://dc.example/"),
            Arc::new(InMemoryJournal::default()),
            Arc::new(RecordingNotifier::default()),
        );
        let result = stage.run(sample_spec(None)).await;
        assert!(matches!(result, Err(OrchestrationError::MissingJobId { stage: "datacheck" })));
    }
}
