use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A single row of the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub report_type: ReportType,
    pub report_time: DateTime<Utc>,
    pub message: String,
    /// Snapshot of the relevant `HandoverSpec` fields, including
    /// `handover_token`, `task_id`, and `database`.
    pub params: Value,
    /// The URI this event concerns, typically `src_uri` or `tgt_uri`.
    pub source: String,
}

/// Severity of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportType {
    Debug,
    Info,
    Warning,
    Error,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Debug => "DEBUG",
            ReportType::Info => "INFO",
            ReportType::Warning => "WARNING",
            ReportType::Error => "ERROR",
        }
    }

    /// Lowercase form used for the `report.<level>` pub/sub routing key.
    pub fn routing_key(&self) -> String {
        format!("report.{}", self.as_str().to_lowercase())
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(ReportType::Debug),
            "INFO" => Ok(ReportType::Info),
            "WARNING" => Ok(ReportType::Warning),
            "ERROR" => Ok(ReportType::Error),
            other => Err(format!("unknown report type: {other}")),
        }
    }
}

/// An INFO/ERROR report whose message matches this is terminal for its
/// token; anything else means the token is still in flight.
static TERMINAL_MESSAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)failed|found problems|complete|successful|Revoked").unwrap());

impl Report {
    pub fn new(
        report_type: ReportType,
        message: impl Into<String>,
        params: Value,
        source: impl Into<String>,
    ) -> Self {
        Self {
            report_type,
            report_time: Utc::now(),
            message: message.into(),
            params,
            source: source.into(),
        }
    }

    /// `true` for an INFO/ERROR report whose message matches the terminal
    /// regex. DEBUG/WARNING reports are never terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self.report_type, ReportType::Info | ReportType::Error)
            && TERMINAL_MESSAGE.is_match(&self.message)
    }

    pub fn handover_token(&self) -> Option<Uuid> {
        self.params
            .get("handover_token")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn database(&self) -> Option<&str> {
        self.params.get("database").and_then(Value::as_str)
    }

    pub fn task_id(&self) -> Option<Uuid> {
        self.params
            .get("task_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Deserializes `params` back into a full `HandoverSpec`, used by the
    /// restart controller to reload a handover from its journal trail.
    /// `params` must have been produced from a real `HandoverSpec`
    /// snapshot, not an ad hoc subset.
    pub fn spec(&self) -> Option<super::HandoverSpec> {
        serde_json::from_value(self.params.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(report_type: ReportType, message: &str) -> Report {
        Report::new(report_type, message, json!({}), "mysql://h/db")
    }

    #[test]
    fn info_with_successful_is_terminal() {
        assert!(report(ReportType::Info, "Metadata load complete, Handover successful").is_terminal());
    }

    #[test]
    fn info_with_datacheck_problems_is_terminal() {
        assert!(report(
            ReportType::Error,
            "Datachecks found problems, Handover failed"
        )
        .is_terminal());
    }

    #[test]
    fn info_revoked_is_terminal() {
        assert!(report(ReportType::Info, "Handover failed, Job Revoked").is_terminal());
    }

    #[test]
    fn progress_report_is_not_terminal() {
        assert!(!report(ReportType::Info, "Datachecks in progress").is_terminal());
    }

    #[test]
    fn debug_report_never_terminal_even_if_message_matches() {
        assert!(!report(ReportType::Debug, "Handover successful").is_terminal());
    }

    #[test]
    fn warning_report_never_terminal() {
        assert!(!report(ReportType::Warning, "Handover successful").is_terminal());
    }

    #[test]
    fn routing_key_is_lowercased() {
        assert_eq!(ReportType::Error.routing_key(), "report.error");
        assert_eq!(ReportType::Debug.routing_key(), "report.debug");
    }

    #[test]
    fn handover_token_extracted_from_params() {
        let token = Uuid::now_v7();
        let r = Report::new(
            ReportType::Info,
            "Handling",
            json!({"handover_token": token.to_string(), "database": "homo_sapiens_core_108_38"}),
            "mysql://h/db",
        );
        assert_eq!(r.handover_token(), Some(token));
        assert_eq!(r.database(), Some("homo_sapiens_core_108_38"));
    }
}
