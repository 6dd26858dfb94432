//! # handover-client
//!
//! Thin, typed wrappers for the four downstream services the orchestrator
//! submits jobs to and polls (C3). Internals of those
//! services are out of scope — only the `submit`/`status` shape is modeled.

pub mod datacheck;
pub mod dbcopy;
pub mod error;
pub mod event;
pub mod metadata;
pub mod status;

pub use datacheck::{DataCheckClient, DataCheckJobStatus, DataCheckStatus, DataCheckSubmission};
pub use dbcopy::{DbCopyClient, DbCopyJobStatus, DbCopyStatus, DbCopySubmission};
pub use error::{ClientError, ClientResult};
pub use event::EventClient;
pub use metadata::{MetadataClient, MetadataEvent, MetadataJobStatus, MetadataOutput, MetadataStatus, MetadataSubmission};
pub use status::PollOutcome;
