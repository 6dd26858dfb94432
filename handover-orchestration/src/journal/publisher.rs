//! Fire-and-forget broadcast of each appended report onto a
//! `report.<level>` topic. AMQP in production; a recording
//! double in tests.

use async_trait::async_trait;
use handover_shared::Report;

#[async_trait]
pub trait EventPublisher: Send + Sync + std::fmt::Debug {
    async fn publish(&self, report: &Report);
}

/// Drops every report; used when no pub/sub broker is configured.
#[derive(Debug, Default, Clone)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, _report: &Report) {}
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use super::*;
    use std::sync::Mutex;

    /// Records every published report's routing key and message, for
    /// assertions in orchestrator/ingress tests.
    #[derive(Debug, Default)]
    pub struct RecordingPublisher {
        pub published: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, report: &Report) {
            self.published
                .lock()
                .unwrap()
                .push((report.report_type.routing_key(), report.message.clone()));
        }
    }
}
