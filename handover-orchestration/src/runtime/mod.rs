//! C4: the task runtime. Stages are plain async functions over
//! `HandoverSpec`; the [`Chain`] sequences them and the [`TaskRegistry`]
//! tracks cancellable, retryable task state, replacing the Celery worker
//! pool the original system ran on.

pub(crate) mod registry;
mod stage;

pub use registry::{TaskHandle, TaskRegistry, TaskState};
pub use stage::{Chain, Stage, StageOutcome};
