//! C2: the append-only report journal.
//!
//! Every stage transition, retry, and terminal outcome is recorded as a
//! [`Report`] rather than mutated in place — the journal is the system's
//! source of truth, and the in-memory [`HandoverSpec`] carried through the
//! task runtime is a projection rebuilt from it on restart.

mod in_memory;
mod publisher;
mod search;

pub use in_memory::InMemoryJournal;
pub use publisher::{EventPublisher, NoopPublisher};
#[cfg(any(test, feature = "test-utils"))]
pub use publisher::test_utils::RecordingPublisher;
pub use search::SearchJournal;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use handover_shared::Report;
use uuid::Uuid;

use crate::errors::OrchestrationResult;

/// One release's worth of in-flight and historical handovers, grouped by
/// token — backs the release-wide progress dashboard.
#[derive(Debug, Clone)]
pub struct ReleaseBucket {
    pub handover_token: Uuid,
    pub submission_time: DateTime<Utc>,
    pub last_message: DateTime<Utc>,
    pub latest: Report,
}

#[async_trait]
pub trait Journal: Send + Sync {
    /// Appends a report and publishes it on the `report.<level>` topic.
    async fn append(&self, report: Report) -> OrchestrationResult<()>;

    /// The most recent report recorded for a handover token, if any.
    async fn latest_by_token(&self, token: Uuid) -> OrchestrationResult<Option<Report>>;

    /// Every token whose database name ends in `_<release>` or
    /// `_<release>_<N>`, bucketed with its latest report.
    async fn aggregate_by_release(&self, release: u32) -> OrchestrationResult<Vec<ReleaseBucket>>;

    /// Whether a non-terminal handover is already journaled for this exact
    /// database name — used by ingress to reject duplicate submissions.
    async fn in_flight_for_database(&self, database: &str) -> OrchestrationResult<bool>;

    /// The latest report for whichever token was last journaled against
    /// this exact database name, if any — used alongside
    /// `in_flight_for_database` to surface the existing token in an
    /// `AlreadyInFlight` rejection.
    async fn latest_for_database(&self, database: &str) -> OrchestrationResult<Option<Report>>;

    /// Removes every report recorded for a token; used when a stop/cancel
    /// discards a handover's history outright.
    async fn delete_by_token(&self, token: Uuid) -> OrchestrationResult<()>;
}

fn _assert_object_safe(_: &dyn Journal) {}
