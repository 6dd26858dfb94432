//! Thin wrapper around the external data-check runner.
//! Out of scope: the runner's internals.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::status::PollOutcome;

const SERVICE: &str = "datacheck";

/// Terminal/non-terminal statuses reported by the data-check service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataCheckStatus {
    Passed,
    Failed,
    DcRunError,
    Incomplete,
    Running,
    Submitted,
}

impl DataCheckStatus {
    pub fn outcome(&self) -> PollOutcome {
        match self {
            DataCheckStatus::Passed => PollOutcome::Success,
            DataCheckStatus::Failed | DataCheckStatus::DcRunError => PollOutcome::Failure,
            DataCheckStatus::Incomplete | DataCheckStatus::Running | DataCheckStatus::Submitted => {
                PollOutcome::NonTerminal
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataCheckJobStatus {
    pub status: DataCheckStatus,
    #[serde(default)]
    pub progress: Option<serde_json::Value>,
}

/// Argument shape differs by `db_type` (compara/ancestral vs rnaseq-family
/// vs other), grounded in the original's `submit_dc` branching.
#[derive(Debug, Clone, Serialize)]
pub struct DataCheckSubmission<'a> {
    pub uri: &'a str,
    pub db_type: &'a str,
    /// `Some(group)` for rnaseq/cdna/otherfeatures, which run a shared
    /// datacheck group rather than a per-type one.
    pub group: Option<&'a str>,
}

#[derive(Clone)]
pub struct DataCheckClient {
    http: reqwest::Client,
    base_url: String,
}

impl DataCheckClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn submit(&self, submission: &DataCheckSubmission<'_>) -> ClientResult<String> {
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

    pub async fn status(&self, job_id: &str) -> ClientResult<DataCheckJobStatus> {
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

    /// URL an operator/contact can follow to download the failed output
    /// (grounded in the original's `{dc_uri}download_datacheck_outputs/{job_id}`).
    pub fn download_output_url(&self, job_id: &str) -> String {
        format!("{}download_datacheck_outputs/{job_id}", self.base_url)
    }

    /// URL for the run-error job detail page.
    pub fn job_url(&self, job_id: &str) -> String {
        format!("{}jobs/{job_id}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passed_is_success() {
        assert_eq!(DataCheckStatus::Passed.outcome(), PollOutcome::Success);
    }

    #[test]
    fn failed_and_run_error_are_failures() {
        assert_eq!(DataCheckStatus::Failed.outcome(), PollOutcome::Failure);
        assert_eq!(DataCheckStatus::DcRunError.outcome(), PollOutcome::Failure);
    }

    #[test]
    fn incomplete_running_submitted_are_non_terminal() {
        for s in [
            DataCheckStatus::Incomplete,
            DataCheckStatus::Running,
            DataCheckStatus::Submitted,
        ] {
            assert_eq!(s.outcome(), PollOutcome::NonTerminal);
        }
    }

    #[test]
    fn download_output_url_is_built_from_base_url() {
        let client = DataCheckClient::new("https://dc.example/");
        assert_eq!(
            client.download_output_url("job-1"),
            "https://dc.example/download_datacheck_outputs/job-1"
        );
    }

    #[test]
    fn status_deserializes_from_kebab_case() {
        let json = r#"{"status": "dc-run-error"}"#;
        let parsed: DataCheckJobStatus = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, DataCheckStatus::DcRunError);
        assert!(parsed.progress.is_none());
    }
}
