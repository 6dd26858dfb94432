use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DbDivision, DbType};

/// The mutable envelope threaded through the handover pipeline.
///
/// Each stage in C5 consumes one `HandoverSpec` by value and returns an
/// updated one; the task runtime (C4) persists only the output of the last
/// completed stage, so restart (C7) can reload it verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandoverSpec {
    pub src_uri: String,
    pub tgt_uri: String,
    pub contact: String,
    pub comment: String,
    pub database: String,
    pub handover_token: Uuid,
    pub db_type: DbType,
    pub db_division: DbDivision,
    pub staging_uri: String,
    pub progress_total: u8,
    pub progress_complete: u8,

    pub dc_job_id: Option<String>,
    pub copy_job_id: Option<String>,
    pub metadata_job_id: Option<String>,
    pub dispatch_job_id: Option<String>,

    /// Current task-runtime id; rewritten each time a stage starts (C4/C5).
    pub task_id: Option<Uuid>,

    /// Transient sub-progress reported by the data-check stage; pruned once
    /// the stage completes.
    pub job_progress: Option<serde_json::Value>,

    /// Set when the source database is the legacy GRCh37 human assembly;
    /// forces a copy-only, `progress_total == 2` pipeline.
    pub grch37: bool,

    /// Genome identifier recorded once the dispatch decision selects one.
    pub genome: Option<serde_json::Value>,
}

impl HandoverSpec {
    /// `true` once `progress_complete == progress_total`.
    pub fn is_finished(&self) -> bool {
        self.progress_complete >= self.progress_total
    }

    /// Clears the stage-transient `job_progress` field, matching the
    /// original implementation's cleanup on stage completion.
    pub fn clear_job_progress(&mut self) {
        self.job_progress = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HandoverSpec {
        HandoverSpec {
            src_uri: "mysql://u@h:3306/homo_sapiens_core_108_38".into(),
            tgt_uri: "mysql://stage@staging:3306/homo_sapiens_core_108_38".into(),
            contact: "a@x".into(),
            comment: "c".into(),
            database: "homo_sapiens_core_108_38".into(),
            handover_token: Uuid::now_v7(),
            db_type: DbType::Core,
            db_division: DbDivision::Vertebrates,
            staging_uri: "mysql://stage@staging:3306/".into(),
            progress_total: 3,
            progress_complete: 0,
            dc_job_id: None,
            copy_job_id: None,
            metadata_job_id: None,
            dispatch_job_id: None,
            task_id: None,
            job_progress: Some(serde_json::json!({"percent": 42})),
            grch37: false,
            genome: None,
        }
    }

    #[test]
    fn is_finished_respects_progress_total() {
        let mut spec = sample();
        assert!(!spec.is_finished());
        spec.progress_complete = 3;
        assert!(spec.is_finished());
    }

    #[test]
    fn clear_job_progress_removes_transient_field() {
        let mut spec = sample();
        assert!(spec.job_progress.is_some());
        spec.clear_job_progress();
        assert!(spec.job_progress.is_none());
    }
}
