//! Process-wide store of current job states.

use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use super::types::{JobKind, JobState};

/// Concurrency-safe store of one [`JobState`] slot per [`JobKind`].
///
/// The registry is the single source of truth read by the status API and
/// written by the job runners. Reads and writes exchange whole records,
/// so a reader can never observe a partially written state. No I/O
/// happens while the lock is held.
///
/// Constructed once at startup and injected as `Arc<TaskRegistry>` into
/// every component that needs it.
#[derive(Debug)]
pub struct TaskRegistry {
    slots: RwLock<HashMap<JobKind, JobState>>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    /// Creates a registry with both slots in `Idle`.
    pub fn new() -> Self {
        let mut slots = HashMap::new();
        for kind in [JobKind::Transfer, JobKind::Transcode] {
            slots.insert(kind, JobState::idle(kind));
        }
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// Returns a copy of the current state for one kind.
    pub async fn get(&self, kind: JobKind) -> JobState {
        self.slots
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| JobState::idle(kind))
    }

    /// Atomically replaces the slot for the state's kind.
    pub async fn set(&self, state: JobState) {
        self.slots.write().await.insert(state.kind, state);
    }

    /// Atomically claims a slot for a new run.
    ///
    /// Replaces the slot with `Starting` only if no job of that kind is
    /// in flight; otherwise returns the current state untouched. This is
    /// the check the supervisor relies on for its at-most-one-in-flight
    /// policy, done under a single write lock so concurrent start
    /// requests cannot both succeed.
    pub async fn try_start(&self, kind: JobKind) -> Result<(), JobState> {
        let mut slots = self.slots.write().await;
        let current = slots.get(&kind).cloned().unwrap_or_else(|| JobState::idle(kind));
        if current.phase.is_in_flight() {
            return Err(current);
        }
        slots.insert(kind, JobState::starting(kind));
        Ok(())
    }

    /// Returns a point-in-time copy of every slot, keyed by kind.
    pub async fn snapshot_all(&self) -> BTreeMap<JobKind, JobState> {
        self.slots
            .read()
            .await
            .iter()
            .map(|(kind, state)| (*kind, state.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::types::JobPhase;

    #[tokio::test]
    async fn test_new_registry_is_idle() {
        let registry = TaskRegistry::new();
        assert_eq!(registry.get(JobKind::Transfer).await.phase, JobPhase::Idle);
        assert_eq!(registry.get(JobKind::Transcode).await.phase, JobPhase::Idle);
    }

    #[tokio::test]
    async fn test_set_replaces_whole_record() {
        let registry = TaskRegistry::new();
        registry
            .set(JobState::running(JobKind::Transfer, 42.5).with_display_name("thing"))
            .await;

        let state = registry.get(JobKind::Transfer).await;
        assert_eq!(state.phase, JobPhase::Running);
        assert_eq!(state.progress_percent, 42.5);
        assert_eq!(state.display_name.as_deref(), Some("thing"));

        // The other slot is untouched.
        assert_eq!(registry.get(JobKind::Transcode).await.phase, JobPhase::Idle);
    }

    #[tokio::test]
    async fn test_try_start_from_idle_and_terminal() {
        let registry = TaskRegistry::new();
        assert!(registry.try_start(JobKind::Transfer).await.is_ok());
        assert_eq!(
            registry.get(JobKind::Transfer).await.phase,
            JobPhase::Starting
        );

        registry.set(JobState::complete(JobKind::Transfer)).await;
        assert!(registry.try_start(JobKind::Transfer).await.is_ok());

        registry
            .set(JobState::failed(JobKind::Transfer, "err"))
            .await;
        assert!(registry.try_start(JobKind::Transfer).await.is_ok());
    }

    #[tokio::test]
    async fn test_try_start_rejects_in_flight() {
        let registry = TaskRegistry::new();
        registry
            .set(JobState::running(JobKind::Transcode, 10.0))
            .await;

        let rejected = registry.try_start(JobKind::Transcode).await.unwrap_err();
        assert_eq!(rejected.phase, JobPhase::Running);
        assert_eq!(rejected.progress_percent, 10.0);

        // The in-flight job's state is unchanged by the rejection.
        let state = registry.get(JobKind::Transcode).await;
        assert_eq!(state.phase, JobPhase::Running);
        assert_eq!(state.progress_percent, 10.0);
    }

    #[tokio::test]
    async fn test_snapshot_all_has_one_entry_per_kind() {
        let registry = TaskRegistry::new();
        registry
            .set(JobState::running(JobKind::Transfer, 5.0))
            .await;

        let snapshot = registry.snapshot_all().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.get(&JobKind::Transfer).unwrap().phase,
            JobPhase::Running
        );
        assert_eq!(
            snapshot.get(&JobKind::Transcode).unwrap().phase,
            JobPhase::Idle
        );
    }
}
