//! Client error types, matching the `ClientError` shape used elsewhere in
//! the workspace this project follows the conventions of (HTTP/serde
//! variants, an `is_recoverable` classifier so callers can distinguish a
//! transport blip from a real rejection).

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request to {service} failed: {source}")]
    HttpError {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned non-success status {status}: {body}")]
    ApiError {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to deserialize {service} response: {0}")]
    SerializationError(&'static str, #[source] serde_json::Error),

    #[error("{service} returned an unrecognized job status: {status}")]
    UnknownStatus { service: &'static str, status: String },
}

impl ClientError {
    /// Transport-level failures surface as an ERROR report and terminate
    /// the chain rather than retry, since they are not distinguishable
    /// from a permanently broken downstream service.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, ClientError::HttpError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_is_not_a_transport_failure() {
        let err = ClientError::ApiError {
            service: "datacheck",
            status: 500,
            body: "oops".into(),
        };
        assert!(!err.is_transport_failure());
    }

    #[test]
    fn display_includes_service_and_status() {
        let err = ClientError::ApiError {
            service: "metadata",
            status: 404,
            body: "not found".into(),
        };
        assert_eq!(
            format!("{err}"),
            "metadata returned non-success status 404: not found"
        );
    }
}
