//! Debounced save queue.
//!
//! Rapid successive edits to the same task coalesce into one write: a task
//! marked dirty becomes due for flushing 500ms after its *last* edit. The
//! clock is passed in by the caller, so the TUI drives it from its tick loop
//! and tests drive it with fabricated instants. There is no durability
//! guarantee for edits still inside the debounce window when the process
//! exits; callers flush on shutdown.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tracks per-task dirty timestamps and answers which are due to save.
#[derive(Debug, Default)]
pub struct SaveQueue {
    pending: HashMap<u64, Instant>,
}

impl SaveQueue {
    /// Debounce window before a dirty task is considered flushable.
    pub const DEBOUNCE: Duration = Duration::from_millis(500);

    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit. Re-marking an already-dirty task restarts its window.
    pub fn mark_dirty(&mut self, task_id: u64, now: Instant) {
        self.pending.insert(task_id, now);
    }

    /// Drain and return the tasks whose debounce window has elapsed.
    pub fn due(&mut self, now: Instant) -> Vec<u64> {
        let ready: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, &at)| now.duration_since(at) >= Self::DEBOUNCE)
            .map(|(&id, _)| id)
            .collect();
        for id in &ready {
            self.pending.remove(id);
        }
        ready
    }

    /// Drain everything regardless of the window (shutdown flush).
    pub fn drain_all(&mut self) -> Vec<u64> {
        let ids: Vec<u64> = self.pending.keys().copied().collect();
        self.pending.clear();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_due_before_the_window() {
        let mut q = SaveQueue::new();
        let t0 = Instant::now();
        q.mark_dirty(1, t0);
        assert!(q.due(t0 + Duration::from_millis(499)).is_empty());
        assert_eq!(q.due(t0 + Duration::from_millis(500)), vec![1]);
        assert!(q.is_empty());
    }

    #[test]
    fn remarking_restarts_the_window() {
        let mut q = SaveQueue::new();
        let t0 = Instant::now();
        q.mark_dirty(1, t0);
        q.mark_dirty(1, t0 + Duration::from_millis(400));
        assert!(q.due(t0 + Duration::from_millis(600)).is_empty());
        assert_eq!(q.due(t0 + Duration::from_millis(900)), vec![1]);
    }

    #[test]
    fn drain_all_ignores_the_window() {
        let mut q = SaveQueue::new();
        let t0 = Instant::now();
        q.mark_dirty(1, t0);
        q.mark_dirty(2, t0);
        let mut ids = q.drain_all();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
        assert!(q.is_empty());
    }
}
