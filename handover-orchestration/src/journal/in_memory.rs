use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use handover_shared::Report;
use uuid::Uuid;

use super::{EventPublisher, Journal, NoopPublisher, ReleaseBucket};
use crate::errors::OrchestrationResult;

/// `dashmap`-backed append-only journal. Used in every C4/C5/C6/C7 unit
/// test and as a standalone deployment mode when no document store is
/// configured.
pub struct InMemoryJournal {
    reports: DashMap<Uuid, Vec<Report>>,
    publisher: Arc<dyn EventPublisher>,
}

impl InMemoryJournal {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            reports: DashMap::new(),
            publisher,
        }
    }
}

impl Default for InMemoryJournal {
    fn default() -> Self {
        Self::new(Arc::new(NoopPublisher))
    }
}

#[async_trait]
impl Journal for InMemoryJournal {
    async fn append(&self, report: Report) -> OrchestrationResult<()> {
        self.publisher.publish(&report).await;
        if let Some(token) = report.handover_token() {
            self.reports.entry(token).or_default().push(report);
        }
        Ok(())
    }

    async fn latest_by_token(&self, token: Uuid) -> OrchestrationResult<Option<Report>> {
        Ok(self
            .reports
            .get(&token)
            .and_then(|entry| entry.value().last().cloned()))
    }

    async fn aggregate_by_release(&self, release: u32) -> OrchestrationResult<Vec<ReleaseBucket>> {
        let suffix_pattern = format!("_{release}");
        let mut buckets = Vec::new();

        for entry in self.reports.iter() {
            let reports = entry.value();
            let Some(latest) = reports.last() else {
                continue;
            };
            let Some(database) = latest.database() else {
                continue;
            };
            if !database_matches_release(&database, &suffix_pattern) {
                continue;
            }

            let submission_time = reports
                .first()
                .map(|r| r.report_time)
                .unwrap_or(latest.report_time);
            buckets.push(ReleaseBucket {
                handover_token: *entry.key(),
                submission_time,
                last_message: latest.report_time,
                latest: latest.clone(),
            });
        }

        Ok(buckets)
    }

    async fn in_flight_for_database(&self, database: &str) -> OrchestrationResult<bool> {
        for entry in self.reports.iter() {
            let reports = entry.value();
            let Some(latest) = reports.last() else {
                continue;
            };
            if latest.database().as_deref() == Some(database) && !latest.is_terminal() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn latest_for_database(&self, database: &str) -> OrchestrationResult<Option<Report>> {
        for entry in self.reports.iter() {
            let reports = entry.value();
            if let Some(latest) = reports.last() {
                if latest.database() == Some(database) {
                    return Ok(Some(latest.clone()));
                }
            }
        }
        Ok(None)
    }

    async fn delete_by_token(&self, token: Uuid) -> OrchestrationResult<()> {
        self.reports.remove(&token);
        Ok(())
    }
}

/// `database` ends in `_<release>` or `_<release>_<N>` (the optional
/// per-database counter segment).
fn database_matches_release(database: &str, suffix: &str) -> bool {
    match database.rfind(suffix) {
        None => false,
        Some(idx) => {
            let rest = &database[idx + suffix.len()..];
            rest.is_empty() || (rest.starts_with('_') && rest[1..].chars().all(|c| c.is_ascii_digit()) && rest.len() > 1)
        }
    }
}
