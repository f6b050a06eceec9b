//! Fixed-interval autosave.
//!
//! The host event loop calls `tick` with its clock; nothing here spawns
//! threads or timers. Each elapsed interval writes the editor's snapshot if
//! it is still dirty, which retries saves that failed on change.

use crate::repo::blob_store::BlobStore;
use crate::service::editor::AssessmentEditor;
use log::debug;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    interval: Duration,
    next_due: Instant,
}

impl AutosaveScheduler {
    pub fn new(interval: Duration, started_at: Instant) -> Self {
        Self {
            interval,
            next_due: started_at + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    /// Returns whether a save was attempted on this tick.
    ///
    /// Missed intervals collapse into one attempt.
    pub fn tick<S: BlobStore>(&mut self, now: Instant, editor: &mut AssessmentEditor<S>) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval;
        if !editor.is_dirty() {
            return false;
        }
        let saved = editor.save();
        debug!(
            "event=autosave module=autosave status={} revision={}",
            if saved { "ok" } else { "error" },
            editor.revision()
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::AutosaveScheduler;
    use crate::config::BuilderConfig;
    use crate::repo::assessment_store::AssessmentStore;
    use crate::repo::blob_store::{BlobStore, StoreError, StoreResult};
    use crate::service::editor::{AssessmentEditor, EditOp};
    use serde_json::Value;
    use std::cell::Cell;
    use std::time::{Duration, Instant};

    /// Store whose writes fail until `healthy` is set.
    #[derive(Default)]
    struct FlakyStore {
        healthy: Cell<bool>,
        writes: Cell<usize>,
    }

    impl BlobStore for FlakyStore {
        fn save(&self, key: &str, _value: &Value) -> StoreResult<()> {
            if !self.healthy.get() {
                return Err(StoreError::Corrupt {
                    key: key.to_string(),
                    message: "disk unavailable".to_string(),
                });
            }
            self.writes.set(self.writes.get() + 1);
            Ok(())
        }

        fn load(&self, _key: &str) -> StoreResult<Option<Value>> {
            Ok(None)
        }

        fn remove(&self, _key: &str) -> StoreResult<bool> {
            Ok(false)
        }
    }

    #[test]
    fn retries_failed_save_once_interval_elapses() {
        let store = FlakyStore::default();
        let mut editor = AssessmentEditor::open(
            AssessmentStore::new(&store),
            &BuilderConfig::default(),
            "job-1",
        );
        let started_at = Instant::now();
        let mut scheduler = AutosaveScheduler::new(Duration::from_secs(30), started_at);

        assert!(editor.apply(EditOp::AddSection));
        assert!(editor.is_dirty());

        store.healthy.set(true);
        assert!(!scheduler.tick(started_at + Duration::from_secs(10), &mut editor));
        assert!(editor.is_dirty());

        assert!(scheduler.tick(started_at + Duration::from_secs(30), &mut editor));
        assert!(!editor.is_dirty());
        assert_eq!(store.writes.get(), 1);

        assert!(!scheduler.tick(started_at + Duration::from_secs(60), &mut editor));
        assert_eq!(store.writes.get(), 1);
    }
}
