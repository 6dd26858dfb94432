//! C7: restart/cancel controller, grounded in the original's
//! `stop_handover_job`/`restart_handover_job`. Neither operation touches a
//! running stage directly — both act through the journal and [`TaskRegistry`],
//! the same seams C5 itself uses.

use std::sync::Arc;

use handover_shared::{HandoverConfig, HandoverSpec, Report, ReportType};
use uuid::Uuid;

use crate::errors::{OrchestrationError, OrchestrationResult};
use crate::ingress::{Ingress, SubmissionPayload};
use crate::journal::Journal;
use crate::runtime::{Chain, TaskRegistry, TaskState};

pub struct Control {
    journal: Arc<dyn Journal>,
    registry: Arc<TaskRegistry>,
    ingress: Arc<Ingress>,
    config: Arc<HandoverConfig>,
    /// Remaining chain suffix starting at `dbcopy`: [copy, metadata, dispatch].
    dbcopy_chain: Arc<Chain>,
    /// Remaining chain suffix starting at `metadata`: [metadata, dispatch].
    metadata_chain: Arc<Chain>,
}

impl Control {
    pub fn new(
        journal: Arc<dyn Journal>,
        registry: Arc<TaskRegistry>,
        ingress: Arc<Ingress>,
        config: Arc<HandoverConfig>,
        dbcopy_chain: Arc<Chain>,
        metadata_chain: Arc<Chain>,
    ) -> Self {
        Self {
            journal,
            registry,
            ingress,
            config,
            dbcopy_chain,
            metadata_chain,
        }
    }

    /// Revokes the task backing `token` if it isn't already terminal, and
    /// journals an INFO "Handover failed, Job Revoked" report. Idempotent:
    /// calling this on an already-stopped or unknown-to-the-registry token
    /// just re-records the revocation.
    pub async fn stop(&self, token: Uuid) -> OrchestrationResult<()> {
        let latest = self
            .journal
            .latest_by_token(token)
            .await?
            .ok_or(OrchestrationError::TaskNotFound { handover_token: token })?;

        let already_terminal = self
            .registry
            .get_state(token)
            .map(TaskState::is_terminal)
            .unwrap_or(true);
        if !already_terminal {
            self.registry.revoke(token);
        }

        let report = Report::new(
            ReportType::Info,
            "Handover failed, Job Revoked",
            latest.params.clone(),
            latest.source.clone(),
        );
        self.journal.append(report).await
    }

    /// Stops `token`, reloads its spec from the journal, and re-enters the
    /// pipeline at `stage`. `datacheck` goes back through ingress entirely
    /// (a fresh token and DC job); `dbcopy`/`metadata` re-enqueue the
    /// remaining chain suffix directly under the same token. Returns the
    /// token the restarted work now runs under.
    pub async fn restart(&self, token: Uuid, stage: &str) -> OrchestrationResult<Uuid> {
        if !self.config.allowed_task_restart.contains(stage) {
            return Err(OrchestrationError::UnknownRestartStage { stage: stage.to_string() });
        }

        self.stop(token).await?;

        let latest = self
            .journal
            .latest_by_token(token)
            .await?
            .ok_or(OrchestrationError::TaskNotFound { handover_token: token })?;
        let mut spec = latest
            .spec()
            .ok_or_else(|| OrchestrationError::Journal("journaled params do not hold a full spec".into()))?;
        spec.clear_job_progress();

        match stage {
            "datacheck" => {
                let payload = SubmissionPayload {
                    src_uri: spec.src_uri.clone(),
                    contact: spec.contact.clone(),
                    comment: spec.comment.clone(),
                };
                self.ingress
                    .submit(payload)
                    .await
                    .map_err(|err| OrchestrationError::RestartIngressRejected(err.to_string()))
            }
            "dbcopy" => {
                spec.progress_complete = 2;
                spec.copy_job_id = None;
                spec.metadata_job_id = None;
                spec.dispatch_job_id = None;
                self.enter_chain(self.dbcopy_chain.clone(), spec, token).await
            }
            "metadata" => {
                spec.progress_complete = 3;
                spec.metadata_job_id = None;
                spec.dispatch_job_id = None;
                self.enter_chain(self.metadata_chain.clone(), spec, token).await
            }
            other => Err(OrchestrationError::UnknownRestartStage { stage: other.to_string() }),
        }
    }

    async fn enter_chain(&self, chain: Arc<Chain>, mut spec: HandoverSpec, token: Uuid) -> OrchestrationResult<Uuid> {
        let task_id = Uuid::new_v4();
        spec.task_id = Some(task_id);
        let handle = self.registry.register(token, task_id);
        tokio::spawn(async move {
            chain.run(spec, &handle).await;
        });
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingress::AlwaysReachable;
    use crate::journal::InMemoryJournal;
    use handover_client::DataCheckClient;
    use handover_shared::{DbDivision, DbType, HandoverConfig};
    use serde_json::json;
    use std::time::Duration;

    fn sample_spec() -> HandoverSpec {
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
            progress_complete: 1,
            dc_job_id: Some("dc-1".into()),
            copy_job_id: None,
            metadata_job_id: None,
            dispatch_job_id: None,
            task_id: None,
            job_progress: Some(json!({"percent": 50})),
            grch37: false,
            genome: None,
        }
    }

    fn test_control(journal: Arc<dyn Journal>, registry: Arc<TaskRegistry>) -> Control {
        let config = Arc::new(HandoverConfig::default());
        let ingress = Arc::new(Ingress::new(
            config.clone(),
            journal.clone(),
            registry.clone(),
            Arc::new(Chain::new(vec![], journal.clone(), registry.clone(), Duration::from_secs(60))),
            DataCheckClient::new("https://dc.example/"),
            Arc::new(AlwaysReachable),
        ));
        let dbcopy_chain = Arc::new(Chain::new(vec![], journal.clone(), registry.clone(), Duration::from_secs(60)));
        let metadata_chain = Arc::new(Chain::new(vec![], journal.clone(), registry.clone(), Duration::from_secs(60)));
        Control::new(journal, registry, ingress, config, dbcopy_chain, metadata_chain)
    }

    #[tokio::test]
    async fn stop_rejects_unknown_token() {
        let journal: Arc<dyn Journal> = Arc::new(InMemoryJournal::default());
        let registry = Arc::new(TaskRegistry::new());
        let control = test_control(journal, registry);

        let result = control.stop(Uuid::new_v4()).await;
        assert!(matches!(result, Err(OrchestrationError::TaskNotFound { .. })));
    }

    #[tokio::test]
    async fn stop_revokes_registered_task_and_journals_revocation() {
        let journal: Arc<dyn Journal> = Arc::new(InMemoryJournal::default());
        let registry = Arc::new(TaskRegistry::new());
        let spec = sample_spec();
        let token = spec.handover_token;

        journal
            .append(Report::new(
                ReportType::Info,
                "Copying in progress",
                serde_json::to_value(&spec).unwrap(),
                spec.tgt_uri.clone(),
            ))
            .await
            .unwrap();
        registry.register(token, Uuid::new_v4());

        let control = test_control(journal.clone(), registry.clone());
        control.stop(token).await.unwrap();

        assert_eq!(registry.get_state(token), Some(TaskState::Revoked));
        let latest = journal.latest_by_token(token).await.unwrap().unwrap();
        assert!(latest.is_terminal());
        assert_eq!(latest.message, "Handover failed, Job Revoked");
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let journal: Arc<dyn Journal> = Arc::new(InMemoryJournal::default());
        let registry = Arc::new(TaskRegistry::new());
        let spec = sample_spec();
        let token = spec.handover_token;

        journal
            .append(Report::new(
                ReportType::Info,
                "Copying in progress",
                serde_json::to_value(&spec).unwrap(),
                spec.tgt_uri.clone(),
            ))
            .await
            .unwrap();
        registry.register(token, Uuid::new_v4());

        let control = test_control(journal.clone(), registry.clone());
        control.stop(token).await.unwrap();
        assert!(control.stop(token).await.is_ok());
    }

    #[tokio::test]
    async fn restart_rejects_unknown_stage() {
        let journal: Arc<dyn Journal> = Arc::new(InMemoryJournal::default());
        let registry = Arc::new(TaskRegistry::new());
        let spec = sample_spec();
        let token = spec.handover_token;

        journal
            .append(Report::new(
                ReportType::Info,
                "Copying in progress",
                serde_json::to_value(&spec).unwrap(),
                spec.tgt_uri.clone(),
            ))
            .await
            .unwrap();

        let control = test_control(journal, registry);
        let result = control.restart(token, "frobnicate").await;
        assert!(matches!(result, Err(OrchestrationError::UnknownRestartStage { .. })));
    }

    #[tokio::test]
    async fn restart_dbcopy_resets_progress_and_clears_downstream_job_ids() {
        let journal: Arc<dyn Journal> = Arc::new(InMemoryJournal::default());
        let registry = Arc::new(TaskRegistry::new());
        let mut spec = sample_spec();
        spec.copy_job_id = Some("copy-1".into());
        spec.metadata_job_id = Some("meta-1".into());
        let token = spec.handover_token;

        journal
            .append(Report::new(
                ReportType::Info,
                "Copying in progress",
                serde_json::to_value(&spec).unwrap(),
                spec.tgt_uri.clone(),
            ))
            .await
            .unwrap();

        let control = test_control(journal.clone(), registry.clone());
        let result_token = control.restart(token, "dbcopy").await.unwrap();
        assert_eq!(result_token, token);

        // enter_chain re-registers under the same token.
        assert!(registry.get_state(token).is_some());
    }
}
