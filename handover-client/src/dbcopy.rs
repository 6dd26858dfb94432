//! Thin wrapper around the external database-copy service.
//! Used for both the copy stage and the dispatch stage (a second copy,
//! src → dispatch target).

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::status::PollOutcome;

const SERVICE: &str = "dbcopy";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DbCopyStatus {
    Complete,
    Failed,
    Scheduled,
    Running,
    Submitted,
}

impl DbCopyStatus {
    pub fn outcome(&self) -> PollOutcome {
        match self {
            DbCopyStatus::Complete => PollOutcome::Success,
            DbCopyStatus::Failed => PollOutcome::Failure,
            DbCopyStatus::Scheduled | DbCopyStatus::Running | DbCopyStatus::Submitted => {
                PollOutcome::NonTerminal
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbCopyJobStatus {
    pub overall_status: DbCopyStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DbCopySubmission<'a> {
    pub src_host: &'a str,
    pub src_incl_db: &'a str,
    pub tgt_host: &'a str,
    pub tgt_db_name: &'a str,
    pub overwrite: bool,
    pub user: &'a str,
}

#[derive(Clone)]
pub struct DbCopyClient {
    http: reqwest::Client,
    base_url: String,
}

impl DbCopyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn submit(&self, submission: &DbCopySubmission<'_>) -> ClientResult<String> {
        let resp = self
            .http
            .post(format!("{}jobs", self.base_url))
            .json(submission)
            .send()
            .await
            .map_err(|source| ClientError::HttpError {
                service: SERVICE,
                source,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                service: SERVICE,
                status,
                body,
            });
        }

        #[derive(Deserialize)]
        struct SubmitResponse {
            job_id: String,
        }
        let parsed: SubmitResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::HttpError {
                service: SERVICE,
                source: e,
            })?;
        Ok(parsed.job_id)
    }

    pub async fn status(&self, job_id: &str) -> ClientResult<DbCopyJobStatus> {
        let resp = self
            .http
            .get(format!("{}jobs/{job_id}", self.base_url))
            .send()
            .await
            .map_err(|source| ClientError::HttpError {
                service: SERVICE,
                source,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                service: SERVICE,
                status,
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(|source| ClientError::HttpError {
            service: SERVICE,
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::SerializationError(SERVICE, e))
    }

    /// Web UI URL an operator can follow to watch the job (grounded in the
    /// original's `cfg.copy_web_uri`).
    pub fn job_url(&self, job_id: &str) -> String {
        format!("{}{job_id}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_is_success_failed_is_failure() {
        assert_eq!(DbCopyStatus::Complete.outcome(), PollOutcome::Success);
        assert_eq!(DbCopyStatus::Failed.outcome(), PollOutcome::Failure);
    }

    #[test]
    fn in_progress_statuses_are_non_terminal() {
        for s in [
            DbCopyStatus::Scheduled,
            DbCopyStatus::Running,
            DbCopyStatus::Submitted,
        ] {
            assert_eq!(s.outcome(), PollOutcome::NonTerminal);
        }
    }

    #[test]
    fn job_status_deserializes_overall_status() {
        let json = r#"{"overall_status": "Complete"}"#;
        let parsed: DbCopyJobStatus = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.overall_status, DbCopyStatus::Complete);
    }
}
