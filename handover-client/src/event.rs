//! Fire-and-forget wrapper around the event-handler service. Unlike the
//! other three clients, there is no terminal/non-terminal status to poll
//! — a send either succeeds or is logged and dropped.

use serde::Serialize;
use tracing::warn;

use crate::error::ClientError;

const SERVICE: &str = "event";

#[derive(Clone)]
pub struct EventClient {
    http: reqwest::Client,
    base_url: String,
}

impl EventClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Best-effort notification; failures are logged, never propagated.
    pub async fn notify<T: Serialize>(&self, event: &T) {
        let result = self
            .http
            .post(format!("{}events", self.base_url))
            .json(event)
            .send()
            .await;

        match result {
            Ok(resp) if !resp.status().is_success() => {
                warn!(status = %resp.status(), "event notification rejected by {SERVICE} service");
            }
            Err(source) => {
                let err = ClientError::HttpError { service: SERVICE, source };
                warn!(%err, "event notification failed");
            }
            Ok(_) => {}
        }
    }
}
