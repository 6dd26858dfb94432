//! Metadata stage: submits, polls, and on success inspects
//! the registration events to decide pruning, BLAT notification, and the
//! dispatch hand-off. Grounded in the original `metadata_update_task`.

use std::sync::Arc;

use async_trait::async_trait;
use handover_client::{MetadataClient, MetadataStatus, MetadataSubmission};
use handover_shared::{HandoverConfig, HandoverSpec, Report, ReportType};
use serde_json::json;
use tracing::warn;

use super::dropper::DatabaseDropper;
use super::notifier::EmailNotifier;
use crate::errors::{OrchestrationError, OrchestrationResult};
use crate::journal::Journal;
use crate::runtime::{Stage, StageOutcome};

pub struct MetadataStage {
    client: MetadataClient,
    journal: Arc<dyn Journal>,
    notifier: Arc<dyn EmailNotifier>,
    dropper: Arc<dyn DatabaseDropper>,
    config: Arc<HandoverConfig>,
}

impl MetadataStage {
    pub fn new(
        client: MetadataClient,
        journal: Arc<dyn Journal>,
        notifier: Arc<dyn EmailNotifier>,
        dropper: Arc<dyn DatabaseDropper>,
        config: Arc<HandoverConfig>,
    ) -> Self {
        Self {
            client,
            journal,
            notifier,
            dropper,
            config,
        }
    }

    async fn error_report(&self, spec: &HandoverSpec, message: String, source: String) {
        let report = Report::new(
            ReportType::Error,
            message.clone(),
            serde_json::to_value(spec).unwrap_or_default(),
            source,
        );
        if let Err(err) = self.journal.append(report).await {
            warn!(%err, "failed to journal metadata failure");
        }
        self.notifier
            .notify(&spec.contact, "Handover failed", &message)
            .await;
    }
}

#[async_trait]
impl Stage for MetadataStage {
    fn name(&self) -> &'static str {
        "metadata"
    }

    async fn run(&self, mut spec: HandoverSpec) -> OrchestrationResult<StageOutcome> {
        let job_id = match &spec.metadata_job_id {
            Some(id) => id.clone(),
            None => {
                let submission = MetadataSubmission {
                    uri: &spec.tgt_uri,
                    contact: &spec.contact,
                    comment: &spec.comment,
                    source: "Handover",
                };
                let job_id = match self.client.submit(&submission).await {
                    Ok(job_id) => job_id,
                    Err(err) => {
                        self.error_report(
                            &spec,
                            format!("Submitting metadata job failed, Handover failed: {err}"),
                            spec.tgt_uri.clone(),
                        )
                        .await;
                        return Ok(StageOutcome::Terminate { spec, success: false });
                    }
                };
                spec.metadata_job_id = Some(job_id.clone());

                let report = Report::new(
                    ReportType::Info,
                    format!(
                        "Loading into metadata database, please see: {}",
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
                self.error_report(
                    &spec,
                    format!("Checking metadata status failed, Handover failed: {err}"),
                    spec.tgt_uri.clone(),
                )
                .await;
                return Ok(StageOutcome::Terminate { spec, success: false });
            }
        };

        match status.status {
            MetadataStatus::Submitted | MetadataStatus::Running | MetadataStatus::Incomplete => {
                Ok(StageOutcome::Retry(spec))
            }
            MetadataStatus::Failed => {
                self.dropper.drop_database(&spec.tgt_uri).await;
                let message = format!(
                    "Metadata load failed, please see: {}",
                    self.client.failure_view_url(&job_id)
                );
                self.error_report(&spec, message, spec.tgt_uri.clone()).await;
                Ok(StageOutcome::Terminate { spec, success: false })
            }
            MetadataStatus::Complete => {
                let events = status.output.map(|o| o.events).unwrap_or_default();

                for event in &events {
                    if let Some(list) = event.current_database_list() {
                        for database in list {
                            if database != spec.database {
                                self.dropper
                                    .drop_database(&format!("{}{database}", spec.staging_uri))
                                    .await;
                            }
                        }
                    }

                    if event.is_new_assembly() {
                        if let Some(genome) = &event.genome {
                            if self.config.blat_species.contains(genome) {
                                self.notifier
                                    .notify(
                                        &self.config.production_email,
                                        "BLAT configuration update required",
                                        &format!(
                                            "{genome} has a new assembly; update the BLAT configuration."
                                        ),
                                    )
                                    .await;
                            }
                        }
                    }
                }

                let dispatch_genome = events.iter().find_map(|event| {
                    event
                        .genome
                        .as_ref()
                        .filter(|genome| self.config.genome_needs_dispatch(genome))
                });

                if self.config.has_dispatch_target(spec.db_type) && dispatch_genome.is_some() {
                    let genome = dispatch_genome.cloned().unwrap_or_default();
                    let dispatch_target = self
                        .config
                        .dispatch_target(spec.db_type)
                        .ok_or(OrchestrationError::NoDispatchTarget { db_type: spec.db_type.as_str() })?;
                    spec.genome = Some(json!(genome));
                    spec.tgt_uri = format!("{dispatch_target}{}", spec.database);
                    spec.progress_total = 4;
                    Ok(StageOutcome::Advance(spec))
                } else {
                    spec.progress_complete = 3;
                    Ok(StageOutcome::Terminate { spec, success: true })
                }
            }
        }
    }
}
