//! # handover-orchestration
//!
//! The genomics handover orchestrator proper: C2 journal, C4 task runtime,
//! C5 stage implementations, C6 ingress, and C7 restart/cancel, wired
//! together on top of `handover-shared`'s types and `handover-client`'s
//! downstream clients.

pub mod control;
pub mod errors;
pub mod ingress;
pub mod journal;
pub mod orchestrator;
pub mod runtime;

pub use control::Control;
pub use errors::{OrchestrationError, OrchestrationResult};
pub use ingress::{Ingress, SourceChecker, SubmissionPayload};
pub use journal::{InMemoryJournal, Journal, ReleaseBucket, SearchJournal};
pub use runtime::{Chain, Stage, StageOutcome, TaskHandle, TaskRegistry, TaskState};
