//! C6: ingress validation. Accepts a raw submission,
//! classifies and routes the database name, checks for duplicates, submits
//! the first data-check job, and hands the remaining chain to C4 — all
//! before returning the minted token synchronously.

use std::sync::Arc;

use async_trait::async_trait;
use handover_client::{DataCheckClient, DataCheckSubmission};
use handover_shared::db_name::{classify, route};
use handover_shared::errors::{IngressError, IngressResult};
use handover_shared::{DbType, HandoverConfig, HandoverSpec, Report, ReportType};
use tracing::info;
use uuid::Uuid;

use crate::journal::Journal;
use crate::runtime::{Chain, TaskRegistry};

/// Stands in for a reachability probe against the source database — the
/// original connects and runs a trivial query; that driver is out of
/// scope here, so it is an injected collaborator like
/// [`crate::orchestrator::EmailNotifier`].
#[async_trait]
pub trait SourceChecker: Send + Sync {
    async fn exists(&self, src_uri: &str) -> bool;
}

/// Assumes every submitted source is reachable; the production default
/// until a real probe is wired in.
#[derive(Debug, Default, Clone)]
pub struct AlwaysReachable;

#[async_trait]
impl SourceChecker for AlwaysReachable {
    async fn exists(&self, _src_uri: &str) -> bool {
        true
    }
}

/// Raw submission payload.
#[derive(Debug, Clone)]
pub struct SubmissionPayload {
    pub src_uri: String,
    pub contact: String,
    pub comment: String,
}

pub struct Ingress {
    config: Arc<HandoverConfig>,
    journal: Arc<dyn Journal>,
    registry: Arc<TaskRegistry>,
    chain: Arc<Chain>,
    datacheck_client: DataCheckClient,
    source_checker: Arc<dyn SourceChecker>,
}

impl Ingress {
    pub fn new(
        config: Arc<HandoverConfig>,
        journal: Arc<dyn Journal>,
        registry: Arc<TaskRegistry>,
        chain: Arc<Chain>,
        datacheck_client: DataCheckClient,
        source_checker: Arc<dyn SourceChecker>,
    ) -> Self {
        Self {
            config,
            journal,
            registry,
            chain,
            datacheck_client,
            source_checker,
        }
    }

    /// Validates, classifies, and routes a submission, then admits it onto
    /// the chain. Duplicate detection is best-effort: two near-simultaneous
    /// submissions for the same database may both observe "no in-flight"
    /// and both be admitted; no journal-side conditional write guards
    /// against this.
    pub async fn submit(&self, payload: SubmissionPayload) -> IngressResult<Uuid> {
        if self.config.compara_species.is_empty() {
            return Err(IngressError::MissingDispatchConfiguration);
        }

        let database = bare_database_name(&payload.src_uri);

        let already_in_flight = self
            .journal
            .in_flight_for_database(&database)
            .await
            .map_err(|_| IngressError::SourceNotFound {
                uri: payload.src_uri.clone(),
            })?;
        if already_in_flight {
            if let Ok(Some(existing)) = self.journal.latest_for_database(&database).await {
                if let Some(existing_token) = existing.handover_token() {
                    return Err(IngressError::AlreadyInFlight {
                        database,
                        existing_token,
                    });
                }
            }
        }

        let handover_token = Uuid::new_v4();

        if !self.source_checker.exists(&payload.src_uri).await {
            return Err(IngressError::SourceNotFound { uri: payload.src_uri });
        }

        let classification = classify(&database)?;
        let allowed_divisions: Vec<handover_shared::DbDivision> = self
            .config
            .allowed_divisions
            .iter()
            .filter_map(|d| d.parse().ok())
            .collect();
        let routed = route(
            &classification,
            &database,
            self.config.release,
            &self.config.staging_uri,
            &self.config.secondary_staging_uri,
            &allowed_divisions,
            false,
        )?;

        let db_type = classification.db_type();
        if !self.config.allowed_database_types.contains(&db_type) {
            return Err(IngressError::Parse(handover_shared::errors::ParseError::DatabaseTypeNotAllowed {
                db_type: db_type.as_str().to_string(),
            }));
        }

        let tgt_uri = format!("{}{database}", routed.staging_uri);

        let mut spec = HandoverSpec {
            src_uri: payload.src_uri.clone(),
            tgt_uri,
            contact: payload.contact,
            comment: payload.comment,
            database: database.clone(),
            handover_token,
            db_type,
            db_division: routed.db_division,
            staging_uri: routed.staging_uri,
            progress_total: routed.progress_total,
            progress_complete: 0,
            dc_job_id: None,
            copy_job_id: None,
            metadata_job_id: None,
            dispatch_job_id: None,
            task_id: None,
            job_progress: None,
            grch37: routed.is_grch37,
            genome: None,
        };

        self.journal
            .append(Report::new(
                ReportType::Info,
                format!("Handling {database}"),
                serde_json::to_value(&spec).unwrap_or_default(),
                spec.src_uri.clone(),
            ))
            .await
            .ok();

        let submission = datacheck_submission(&spec);
        let dc_job_id = self
            .datacheck_client
            .submit(&submission)
            .await
            .map_err(|err| IngressError::DataCheckSubmissionFailed {
                uri: spec.src_uri.clone(),
                reason: err.to_string(),
            })?;
        spec.dc_job_id = Some(dc_job_id);

        let task_id = Uuid::new_v4();
        spec.task_id = Some(task_id);
        let handle = self.registry.register(handover_token, task_id);

        let chain = self.chain.clone();
        tokio::spawn(async move {
            chain.run(spec, &handle).await;
        });

        info!(%handover_token, %database, "handover admitted");
        Ok(handover_token)
    }
}

fn bare_database_name(src_uri: &str) -> String {
    match url::Url::parse(src_uri) {
        Ok(parsed) => parsed.path().trim_start_matches('/').to_string(),
        Err(_) => src_uri.rsplit('/').next().unwrap_or(src_uri).to_string(),
    }
}

/// Different datacheck argument shapes per `db_type`,
/// grounded in the original's `submit_dc` branching.
fn datacheck_submission(spec: &HandoverSpec) -> DataCheckSubmission<'_> {
    let group = match spec.db_type {
        DbType::Compara => Some("compara"),
        DbType::Ancestral => Some("ancestral"),
        DbType::Rnaseq | DbType::Cdna | DbType::Otherfeatures => Some("rnaseq"),
        DbType::Core | DbType::Variation | DbType::Funcgen => None,
    };
    DataCheckSubmission {
        uri: &spec.src_uri,
        db_type: spec.db_type.as_str(),
        group,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::InMemoryJournal;
    use handover_shared::errors::ParseError;
    use std::time::Duration;

    fn test_ingress(config: HandoverConfig) -> Ingress {
        let registry = Arc::new(TaskRegistry::new());
        let journal: Arc<dyn Journal> = Arc::new(InMemoryJournal::default());
        let chain = Arc::new(Chain::new(vec![], journal.clone(), registry.clone(), Duration::from_secs(60)));
        Ingress::new(
            Arc::new(config),
            journal,
            registry,
            chain,
            DataCheckClient::new("https://dc.example/"),
            Arc::new(AlwaysReachable),
        )
    }

    fn base_config() -> HandoverConfig {
        let mut cfg = HandoverConfig::default();
        cfg.release = 108;
        cfg.staging_uri = "mysql://stage@staging:3306/".to_string();
        cfg.secondary_staging_uri = "mysql://stage@staging2:3306/".to_string();
        cfg.allowed_divisions.insert("vertebrates".to_string());
        cfg.allowed_database_types.insert(DbType::Core);
        cfg.compara_species.insert("homo_sapiens".to_string());
        cfg
    }

    #[tokio::test]
    async fn rejects_when_dispatch_configuration_is_entirely_empty() {
        let ingress = test_ingress(HandoverConfig::default());
        let result = ingress
            .submit(SubmissionPayload {
                src_uri: "mysql://u@h:3306/homo_sapiens_core_108_38".to_string(),
                contact: "a@x".to_string(),
                comment: "c".to_string(),
            })
            .await;
        assert!(matches!(result, Err(IngressError::MissingDispatchConfiguration)));
    }

    #[tokio::test]
    async fn rejects_unparseable_database_name() {
        let ingress = test_ingress(base_config());
        let result = ingress
            .submit(SubmissionPayload {
                src_uri: "mysql://u@h:3306/not_a_real_database".to_string(),
                contact: "a@x".to_string(),
                comment: "c".to_string(),
            })
            .await;
        assert!(matches!(
            result,
            Err(IngressError::Parse(ParseError::InvalidDatabaseName(_)))
        ));
    }

    #[tokio::test]
    async fn bare_database_name_strips_leading_slash() {
        assert_eq!(
            bare_database_name("mysql://u@h:3306/homo_sapiens_core_108_38"),
            "homo_sapiens_core_108_38"
        );
    }
}
