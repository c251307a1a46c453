// ── Last-request-wins bookkeeping for advisory fetches ──
//
// Every fetch is tagged with a generation. Starting a new fetch aborts
// the previous task and bumps the generation, so a completion that was
// already in flight is recognised as stale and dropped.

use tokio::task::AbortHandle;

#[derive(Debug, Default)]
pub struct AdvisoryTracker {
    generation: u64,
    outstanding: Option<AbortHandle>,
}

impl AdvisoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede any outstanding fetch and return the new generation.
    pub fn begin(&mut self) -> u64 {
        self.abort_outstanding();
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Remember the task serving `generation` so it can be aborted later.
    /// Ignored if `generation` is no longer current.
    pub fn attach(&mut self, generation: u64, handle: AbortHandle) {
        if generation == self.generation {
            self.outstanding = Some(handle);
        } else {
            handle.abort();
        }
    }

    /// Whether a completion for `generation` may be applied.
    pub fn accept(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.outstanding = None;
        true
    }

    pub fn abort_outstanding(&mut self) {
        if let Some(handle) = self.outstanding.take() {
            handle.abort();
        }
    }

    pub fn current(&self) -> u64 {
        self.generation
    }

    pub fn is_outstanding(&self) -> bool {
        self.outstanding.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn only_current_generation_is_accepted() {
        let mut tracker = AdvisoryTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();

        assert!(!tracker.accept(first));
        assert!(tracker.accept(second));
        assert_eq!(tracker.current(), second);
    }

    #[test]
    fn stale_completion_arriving_last_is_rejected() {
        let mut tracker = AdvisoryTracker::new();
        let a = tracker.begin();
        let b = tracker.begin();

        assert!(tracker.accept(b));
        assert!(!tracker.accept(a));
    }

    #[tokio::test]
    async fn begin_aborts_previous_task() {
        let mut tracker = AdvisoryTracker::new();
        let generation = tracker.begin();
        let task = tokio::spawn(std::future::pending::<()>());
        tracker.attach(generation, task.abort_handle());
        assert!(tracker.is_outstanding());

        tracker.begin();

        assert!(task.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn late_attach_for_old_generation_aborts_immediately() {
        let mut tracker = AdvisoryTracker::new();
        let old = tracker.begin();
        tracker.begin();
        let task = tokio::spawn(std::future::pending::<()>());
        tracker.attach(old, task.abort_handle());

        assert!(!tracker.is_outstanding());
        assert!(task.await.unwrap_err().is_cancelled());
    }
}
