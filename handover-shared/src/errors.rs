//! Error taxonomy for ingress-time rejections.
//!
//! Everything here is raised before a handover chain is ever handed to the
//! task runtime; once a chain is running, failures are recorded in the
//! journal and notified by email rather than returned to a caller (see
//! `handover_orchestration::errors` for the post-ingress error types).

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;
pub type IngressResult<T> = Result<T, IngressError>;

/// Errors raised by the name parser & router (C1).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("database name '{0}' does not match any known species/compara/ancestral pattern")]
    InvalidDatabaseName(String),

    #[error("release mismatch: database '{database}' parsed release {parsed}, configured release is {configured}")]
    ReleaseMismatch {
        database: String,
        parsed: u32,
        configured: u32,
    },

    #[error("division '{division}' is not in the allowed divisions list")]
    DivisionNotAllowed { division: String },

    #[error("db_type '{db_type}' is not in the allowed database types list")]
    DatabaseTypeNotAllowed { db_type: String },
}

/// Errors raised by ingress (C6) that reject a submission outright.
#[derive(Debug, Error, Clone)]
pub enum IngressError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("source database not reachable at {uri}")]
    SourceNotFound { uri: String },

    #[error("a handover for database '{database}' is already in flight (token {existing_token})")]
    AlreadyInFlight {
        database: String,
        existing_token: uuid::Uuid,
    },

    #[error("missing dispatch configuration: compara_species allow-list is empty")]
    MissingDispatchConfiguration,

    #[error("submitting the initial data-check job for {uri} failed: {reason}")]
    DataCheckSubmissionFailed { uri: String, reason: String },
}
