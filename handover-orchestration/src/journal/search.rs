//! Document-store-backed journal. Reports are indexed documents rather
//! than database rows, queried by
//! `handover_token` and by a `database` suffix match for release
//! aggregation. Grounded in the same request/response shape as the C3
//! clients in `handover_client` — a thin `reqwest` wrapper with no
//! query-building abstraction beyond what this module needs.

use async_trait::async_trait;
use handover_shared::Report;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{Journal, ReleaseBucket};
use crate::errors::{OrchestrationError, OrchestrationResult};

pub struct SearchJournal {
    http: reqwest::Client,
    base_url: String,
}

impl SearchJournal {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn journal_error(&self, context: &str, source: impl std::fmt::Display) -> OrchestrationError {
        OrchestrationError::Journal(format!("{context}: {source}"))
    }
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    hits: SearchHitsInner,
}

#[derive(Debug, Deserialize)]
struct SearchHitsInner {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: Report,
}

#[async_trait]
impl Journal for SearchJournal {
    async fn append(&self, report: Report) -> OrchestrationResult<()> {
        let resp = self
            .http
            .post(format!("{}reports", self.base_url))
            .json(&report)
            .send()
            .await
            .map_err(|e| self.journal_error("append", e))?;

        if !resp.status().is_success() {
            return Err(OrchestrationError::Journal(format!(
                "journal rejected append with status {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn latest_by_token(&self, token: Uuid) -> OrchestrationResult<Option<Report>> {
        let resp: SearchHits = self
            .http
            .post(format!("{}reports/_search", self.base_url))
            .json(&json!({
                "query": {"term": {"params.handover_token": token.to_string()}},
                "sort": [{"report_time": "desc"}],
                "size": 1,
            }))
            .send()
            .await
            .map_err(|e| self.journal_error("latest_by_token", e))?
            .json()
            .await
            .map_err(|e| self.journal_error("latest_by_token decode", e))?;

        Ok(resp.hits.hits.into_iter().next().map(|hit| hit.source))
    }

    async fn aggregate_by_release(&self, release: u32) -> OrchestrationResult<Vec<ReleaseBucket>> {
        let resp: SearchHits = self
            .http
            .post(format!("{}reports/_search", self.base_url))
            .json(&json!({
                "query": {
                    "regexp": {"params.database": format!(".*_{release}(_\\d+)?")}
                },
                "size": 10_000,
            }))
            .send()
            .await
            .map_err(|e| self.journal_error("aggregate_by_release", e))?
            .json()
            .await
            .map_err(|e| self.journal_error("aggregate_by_release decode", e))?;

        let mut buckets: Vec<ReleaseBucket> = Vec::new();
        for hit in resp.hits.hits {
            let report = hit.source;
            let Some(token) = report.handover_token() else {
                continue;
            };
            match buckets.iter_mut().find(|b| b.handover_token == token) {
                Some(existing) if report.report_time > existing.last_message => {
                    existing.last_message = report.report_time;
                    existing.latest = report;
                }
                Some(existing) if report.report_time < existing.submission_time => {
                    existing.submission_time = report.report_time;
                }
                Some(_) => {}
                None => buckets.push(ReleaseBucket {
                    handover_token: token,
                    submission_time: report.report_time,
                    last_message: report.report_time,
                    latest: report,
                }),
            }
        }
        Ok(buckets)
    }

    async fn in_flight_for_database(&self, database: &str) -> OrchestrationResult<bool> {
        let resp: SearchHits = self
            .http
            .post(format!("{}reports/_search", self.base_url))
            .json(&json!({
                "query": {"term": {"params.database": database}},
                "sort": [{"report_time": "desc"}],
                "size": 1,
            }))
            .send()
            .await
            .map_err(|e| self.journal_error("in_flight_for_database", e))?
            .json()
            .await
            .map_err(|e| self.journal_error("in_flight_for_database decode", e))?;

        Ok(resp
            .hits
            .hits
            .into_iter()
            .next()
            .map(|hit| !hit.source.is_terminal())
            .unwrap_or(false))
    }

    async fn latest_for_database(&self, database: &str) -> OrchestrationResult<Option<Report>> {
        let resp: SearchHits = self
            .http
            .post(format!("{}reports/_search", self.base_url))
            .json(&json!({
                "query": {"term": {"params.database": database}},
                "sort": [{"report_time": "desc"}],
                "size": 1,
            }))
            .send()
            .await
            .map_err(|e| self.journal_error("latest_for_database", e))?
            .json()
            .await
            .map_err(|e| self.journal_error("latest_for_database decode", e))?;

        Ok(resp.hits.hits.into_iter().next().map(|hit| hit.source))
    }

    async fn delete_by_token(&self, token: Uuid) -> OrchestrationResult<()> {
        let resp = self
            .http
            .post(format!("{}reports/_delete_by_query", self.base_url))
            .json(&json!({
                "query": {"term": {"params.handover_token": token.to_string()}}
            }))
            .send()
            .await
            .map_err(|e| self.journal_error("delete_by_token", e))?;

        if !resp.status().is_success() {
            return Err(OrchestrationError::Journal(format!(
                "journal rejected delete_by_token with status {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
