use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Notify;
use uuid::Uuid;

/// Mirrors the Celery task states this runtime replaces:
/// `Pending` before the chain starts, `Started`/`Retry` while a stage is
/// running or backing off, and the three terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Started,
    Retry,
    Success,
    Failure,
    Revoked,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure | TaskState::Revoked)
    }
}

struct TaskEntry {
    task_id: Uuid,
    state: std::sync::Mutex<TaskState>,
    retry_count: AtomicU32,
    notify: Notify,
}

/// A handle into the registry for the task currently driving one handover.
/// Held by the [`Chain`](crate::runtime::Chain) while a handover's stages
/// run, so a concurrent `stop`/`restart` call can cancel its retry sleep.
pub struct TaskHandle {
    pub handover_token: Uuid,
    entry: Arc<TaskEntry>,
}

impl TaskHandle {
    pub fn task_id(&self) -> Uuid {
        self.entry.task_id
    }

    pub fn state(&self) -> TaskState {
        *self.entry.state.lock().unwrap()
    }

    pub fn retry_count(&self) -> u32 {
        self.entry.retry_count.load(Ordering::SeqCst)
    }

    pub(crate) fn set_state(&self, state: TaskState) {
        *self.entry.state.lock().unwrap() = state;
    }

    pub(crate) fn bump_retry(&self) -> u32 {
        self.entry.retry_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Waits out the retry delay, returning early (and `false`) if the
    /// task is revoked while sleeping.
    pub(crate) async fn wait_or_cancel(&self, delay: std::time::Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = self.entry.notify.notified() => false,
        }
    }
}

/// Tracks the in-flight task for every handover token,
/// replacing the Celery result backend this system's original had.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: DashMap<Uuid, Arc<TaskEntry>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh task for a handover token, replacing any
    /// previous entry (used by restart).
    pub fn register(&self, handover_token: Uuid, task_id: Uuid) -> TaskHandle {
        let entry = Arc::new(TaskEntry {
            task_id,
            state: std::sync::Mutex::new(TaskState::Pending),
            retry_count: AtomicU32::new(0),
            notify: Notify::new(),
        });
        self.tasks.insert(handover_token, entry.clone());
        TaskHandle {
            handover_token,
            entry,
        }
    }

    pub fn get_state(&self, handover_token: Uuid) -> Option<TaskState> {
        self.tasks
            .get(&handover_token)
            .map(|entry| *entry.state.lock().unwrap())
    }

    pub fn task_id(&self, handover_token: Uuid) -> Option<Uuid> {
        self.tasks.get(&handover_token).map(|entry| entry.task_id)
    }

    /// Marks a task revoked and wakes it if it's currently sleeping on a
    /// retry backoff.
    pub fn revoke(&self, handover_token: Uuid) -> bool {
        match self.tasks.get(&handover_token) {
            Some(entry) => {
                *entry.state.lock().unwrap() = TaskState::Revoked;
                entry.notify.notify_waiters();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, handover_token: Uuid) {
        self.tasks.remove(&handover_token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_starts_pending_with_zero_retries() {
        let registry = TaskRegistry::new();
        let token = Uuid::new_v4();
        let handle = registry.register(token, Uuid::new_v4());
        assert_eq!(handle.state(), TaskState::Pending);
        assert_eq!(handle.retry_count(), 0);
    }

    #[test]
    fn revoke_unknown_token_returns_false() {
        let registry = TaskRegistry::new();
        assert!(!registry.revoke(Uuid::new_v4()));
    }

    #[test]
    fn revoke_known_token_updates_state() {
        let registry = TaskRegistry::new();
        let token = Uuid::new_v4();
        registry.register(token, Uuid::new_v4());
        assert!(registry.revoke(token));
        assert_eq!(registry.get_state(token), Some(TaskState::Revoked));
    }

    #[tokio::test]
    async fn wait_or_cancel_returns_false_when_revoked_mid_sleep() {
        let registry = Arc::new(TaskRegistry::new());
        let token = Uuid::new_v4();
        let handle = registry.register(token, Uuid::new_v4());

        let registry2 = registry.clone();
        let waiter = tokio::spawn(async move { handle.wait_or_cancel(std::time::Duration::from_secs(60)).await });

        tokio::task::yield_now().await;
        registry2.revoke(token);

        let completed_without_cancel = waiter.await.unwrap();
        assert!(!completed_without_cancel);
    }

    #[test]
    fn task_state_terminal_classification() {
        assert!(TaskState::Success.is_terminal());
        assert!(TaskState::Failure.is_terminal());
        assert!(TaskState::Revoked.is_terminal());
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Started.is_terminal());
        assert!(!TaskState::Retry.is_terminal());
    }
}
