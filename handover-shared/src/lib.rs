//! # handover-shared
//!
//! Data model, name parser/router (C1), error taxonomy, and injectable
//! configuration shared by every component of the handover orchestrator.

pub mod config;
pub mod db_name;
pub mod errors;
pub mod model;

pub use config::HandoverConfig;
pub use model::{DbDivision, DbType, HandoverSpec, Report, ReportType};
