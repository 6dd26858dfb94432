//! Thin wrapper around the external metadata-registration service.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::status::PollOutcome;

const SERVICE: &str = "metadata";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataStatus {
    Complete,
    Failed,
    Incomplete,
    Running,
    Submitted,
}

impl MetadataStatus {
    pub fn outcome(&self) -> PollOutcome {
        match self {
            MetadataStatus::Complete => PollOutcome::Success,
            MetadataStatus::Failed => PollOutcome::Failure,
            MetadataStatus::Incomplete | MetadataStatus::Running | MetadataStatus::Submitted => {
                PollOutcome::NonTerminal
            }
        }
    }
}

/// One metadata-registration event.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataEvent {
    pub genome: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Free-form details; `current_database_list` is read out of this when
    /// present.
    #[serde(default)]
    pub details: serde_json::Value,
}

impl MetadataEvent {
    pub fn current_database_list(&self) -> Option<Vec<String>> {
        self.details
            .get("current_database_list")
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
    }

    pub fn is_new_assembly(&self) -> bool {
        self.event_type == "new_assembly"
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MetadataOutput {
    #[serde(default)]
    pub events: Vec<MetadataEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataJobStatus {
    pub status: MetadataStatus,
    #[serde(default)]
    pub output: Option<MetadataOutput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataSubmission<'a> {
    pub uri: &'a str,
    pub contact: &'a str,
    pub comment: &'a str,
    pub source: &'a str,
}

#[derive(Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    base_url: String,
}

impl MetadataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn submit(&self, submission: &MetadataSubmission<'_>) -> ClientResult<String> {
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

    pub async fn status(&self, job_id: &str) -> ClientResult<MetadataJobStatus> {
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

    /// URL for the job detail page.
    pub fn job_url(&self, job_id: &str) -> String {
        format!("{}jobs/{job_id}", self.base_url)
    }

    /// Failure-view URL, grounded in the original's
    /// `{meta_uri}jobs/{job_id}?format=failures`.
    pub fn failure_view_url(&self, job_id: &str) -> String {
        format!("{}jobs/{job_id}?format=failures", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn complete_is_success_failed_is_failure() {
        assert_eq!(MetadataStatus::Complete.outcome(), PollOutcome::Success);
        assert_eq!(MetadataStatus::Failed.outcome(), PollOutcome::Failure);
    }

    #[test]
    fn failure_view_url_carries_format_query() {
        let client = MetadataClient::new("https://meta.example/");
        assert_eq!(
            client.failure_view_url("job-7"),
            "https://meta.example/jobs/job-7?format=failures"
        );
    }

    #[test]
    fn current_database_list_extracted_from_details() {
        let event = MetadataEvent {
            genome: Some("homo_sapiens".to_string()),
            event_type: "new_database".to_string(),
            details: json!({"current_database_list": ["homo_sapiens_core_108_38"]}),
        };
        assert_eq!(
            event.current_database_list(),
            Some(vec!["homo_sapiens_core_108_38".to_string()])
        );
    }

    #[test]
    fn missing_current_database_list_is_none() {
        let event = MetadataEvent {
            genome: None,
            event_type: "new_assembly".to_string(),
            details: json!({}),
        };
        assert_eq!(event.current_database_list(), None);
        assert!(event.is_new_assembly());
    }
}
