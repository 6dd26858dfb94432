//! Post-ingress error taxonomy. Unlike `handover_shared::errors`,
//! these never bubble to an API caller — they are recorded in the journal
//! and notified by email, and `OrchestrationResult` is used internally by
//! C4/C5/C7.

use thiserror::Error;
use uuid::Uuid;

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("journal error: {0}")]
    Journal(String),

    #[error("restart via ingress was rejected: {0}")]
    RestartIngressRejected(String),

    #[error("stage '{stage}' invoked without a job id")]
    MissingJobId { stage: &'static str },

    #[error("dispatch decided but no target URL is configured for db_type {db_type}")]
    NoDispatchTarget { db_type: &'static str },

    #[error("no task found for handover token {handover_token}")]
    TaskNotFound { handover_token: Uuid },

    #[error("restart stage '{stage}' is not one of the allowed restart stages")]
    UnknownRestartStage { stage: String },
}
