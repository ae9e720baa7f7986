// # Monitor State
//
// The one piece of mutable shared state: the last known snapshot and when
// the monitor last polled.
//
// ## Ownership
//
// - Written only by `DnsMonitor` (after each poll cycle)
// - Read by the `status` command
// - Never persisted; lost on restart
//
// Writers hold the lock only for the in-memory update, never across a DNS
// query or a notification call, so readers are never stuck behind I/O.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::snapshot::Snapshot;

/// Monitor state as of the last poll
#[derive(Debug, Clone, Default)]
pub struct MonitorState {
    /// Snapshot the next poll is compared against
    pub last_snapshot: Snapshot,
    /// When the monitor last took a snapshot (`None` before the first)
    pub last_activity: Option<DateTime<Utc>>,
    /// Completed poll cycles, the initial snapshot excluded
    pub cycles_completed: u64,
    /// Alerts the notifier accepted
    pub alerts_sent: u64,
}

/// Shared handle to [`MonitorState`]
///
/// Cloning shares the same state.
///
/// # Example
///
/// ```rust,no_run
/// use dnswatch_core::monitor::SharedState;
/// use dnswatch_core::Snapshot;
///
/// #[tokio::main]
/// async fn main() {
///     let state = SharedState::new();
///     state.replace_snapshot(Snapshot::new()).await;
///     assert!(state.last_activity().await.is_none());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<MonitorState>>,
}

impl SharedState {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent copy of the whole state
    pub async fn read(&self) -> MonitorState {
        self.inner.read().await.clone()
    }

    /// When the monitor last polled
    pub async fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.last_activity
    }

    /// Copy of the last known snapshot
    pub async fn last_snapshot(&self) -> Snapshot {
        self.inner.read().await.last_snapshot.clone()
    }

    /// Install the initial snapshot taken at `at`
    pub async fn initialize(&self, snapshot: Snapshot, at: DateTime<Utc>) {
        let mut guard = self.inner.write().await;
        guard.last_snapshot = snapshot;
        guard.last_activity = Some(at);
    }

    /// Record that a poll cycle ran at `at`
    pub async fn record_activity(&self, at: DateTime<Utc>) {
        let mut guard = self.inner.write().await;
        guard.last_activity = Some(at);
        guard.cycles_completed += 1;
    }

    /// Replace the snapshot the next poll is compared against
    pub async fn replace_snapshot(&self, snapshot: Snapshot) {
        self.inner.write().await.last_snapshot = snapshot;
    }

    /// Count one delivered alert
    pub async fn record_alert(&self) {
        self.inner.write().await.alerts_sent += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::RecordType;

    #[tokio::test]
    async fn test_clones_share_state() {
        let state = SharedState::new();
        let reader = state.clone();

        let now = Utc::now();
        state.record_activity(now).await;
        state
            .replace_snapshot(Snapshot::new().with_records(RecordType::A, ["1.2.3.4"]))
            .await;

        assert_eq!(reader.last_activity().await, Some(now));
        let copy = reader.read().await;
        assert_eq!(copy.cycles_completed, 1);
        assert_eq!(copy.last_snapshot.get(RecordType::A).unwrap(), ["1.2.3.4"]);
    }

    #[tokio::test]
    async fn test_initialize_does_not_count_a_cycle() {
        let state = SharedState::new();
        state.initialize(Snapshot::new(), Utc::now()).await;
        assert_eq!(state.read().await.cycles_completed, 0);
        assert!(state.last_activity().await.is_some());
    }
}
