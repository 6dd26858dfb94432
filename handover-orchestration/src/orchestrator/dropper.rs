//! Dropping a staging database is a direct, destructive action the
//! metadata stage takes itself rather than a downstream
//! service call — but executing it is still delegated to an injected
//! collaborator, since the core's job is to decide *which* database to
//! drop and *when*, not to hold a database driver.

use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait DatabaseDropper: Send + Sync {
    async fn drop_database(&self, uri: &str);
}

#[derive(Debug, Default, Clone)]
pub struct LoggingDropper;

#[async_trait]
impl DatabaseDropper for LoggingDropper {
    async fn drop_database(&self, uri: &str) {
        info!(%uri, "dropping staging database (not actually executed)");
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct RecordingDropper {
        pub dropped: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DatabaseDropper for RecordingDropper {
        async fn drop_database(&self, uri: &str) {
            self.dropped.lock().unwrap().push(uri.to_string());
        }
    }
}
