use std::collections::BTreeMap;

/// Cancellation token for a scheduled one-shot callback
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleHandle(u64);

/// Deadline queue for one-shot completions, polled from the tick loop.
///
/// Handles are never reused, so a cancelled or already fired handle can be
/// compared against live state without ambiguity.
#[derive(Debug, Default)]
pub struct OneShotScheduler {
    next_id: u64,
    pending: BTreeMap<ScheduleHandle, u64>,
}

impl OneShotScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_at: u64) -> ScheduleHandle {
        self.next_id += 1;
        let handle = ScheduleHandle(self.next_id);
        self.pending.insert(handle, due_at);
        handle
    }

    /// Returns true if the handle was still pending
    pub fn cancel(&mut self, handle: ScheduleHandle) -> bool {
        self.pending.remove(&handle).is_some()
    }

    pub fn is_pending(&self, handle: ScheduleHandle) -> bool {
        self.pending.contains_key(&handle)
    }

    pub fn due_at(&self, handle: ScheduleHandle) -> Option<u64> {
        self.pending.get(&handle).copied()
    }

    /// Remove and return every handle whose deadline has passed, in schedule order
    pub fn take_due(&mut self, now: u64) -> Vec<ScheduleHandle> {
        let due: Vec<ScheduleHandle> = self
            .pending
            .iter()
            .filter(|(_, due_at)| **due_at <= now)
            .map(|(handle, _)| *handle)
            .collect();

        for handle in &due {
            self.pending.remove(handle);
        }
        due
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_handles_fire_once() {
        let mut sched = OneShotScheduler::new();
        let h = sched.schedule(1_000);

        assert!(sched.take_due(999).is_empty());
        assert_eq!(sched.take_due(1_000), vec![h]);
        assert!(sched.take_due(5_000).is_empty());
        assert!(!sched.is_pending(h));
    }

    #[test]
    fn test_cancelled_handle_never_fires() {
        let mut sched = OneShotScheduler::new();
        let h = sched.schedule(1_000);

        assert!(sched.cancel(h));
        assert!(!sched.cancel(h));
        assert!(sched.take_due(10_000).is_empty());
    }

    #[test]
    fn test_handles_are_unique() {
        let mut sched = OneShotScheduler::new();
        let a = sched.schedule(10);
        sched.cancel(a);
        let b = sched.schedule(10);
        assert_ne!(a, b);
        assert_eq!(sched.due_at(b), Some(10));
    }

    #[test]
    fn test_take_due_leaves_future_handles() {
        let mut sched = OneShotScheduler::new();
        let early = sched.schedule(100);
        let late = sched.schedule(900);

        assert_eq!(sched.take_due(500), vec![early]);
        assert!(sched.is_pending(late));
        assert_eq!(sched.len(), 1);

        sched.cancel_all();
        assert!(sched.is_empty());
    }
}
