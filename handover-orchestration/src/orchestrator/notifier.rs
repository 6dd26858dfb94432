//! Stands in for the SMTP transport the original system used to notify a
//! contact or the production mailbox at fatal pipeline points — real mail
//! delivery is out of scope.

use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait EmailNotifier: Send + Sync {
    async fn notify(&self, to: &str, subject: &str, body: &str);
}

/// Logs rather than sends; the default wired into production until a real
/// transport is injected.
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

#[async_trait]
impl EmailNotifier for LoggingNotifier {
    async fn notify(&self, to: &str, subject: &str, body: &str) {
        info!(%to, %subject, %body, "email notification (not actually sent)");
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl EmailNotifier for RecordingNotifier {
        async fn notify(&self, to: &str, subject: &str, body: &str) {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), body.to_string()));
        }
    }
}
