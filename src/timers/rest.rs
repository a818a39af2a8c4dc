use tracing::debug;

use super::{CardId, OneShotScheduler, ScheduleHandle};

/// The single rest countdown currently counting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveRest {
    pub exercise: CardId,
    pub duration_ms: u64,
    pub started_at: u64,
    pub handle: ScheduleHandle,
}

impl ActiveRest {
    /// Elapsed time clamped to `[0, duration_ms]`
    pub fn capped_elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.started_at).min(self.duration_ms)
    }

    pub fn remaining(&self, now: u64) -> u64 {
        self.duration_ms - self.capped_elapsed(now)
    }
}

/// Emitted when a countdown runs out on its own
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestCompleted {
    pub exercise: CardId,
    pub duration_ms: u64,
}

/// Global rest countdown: one active countdown plus the rest time committed
/// so far in the current session attempt.
#[derive(Debug, Default)]
pub struct RestTimerController {
    total_elapsed_ms: u64,
    active: Option<ActiveRest>,
    scheduler: OneShotScheduler,
}

impl RestTimerController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a countdown for `exercise`, replacing any active one.
    ///
    /// Durations that are not positive and finite are ignored. Huge
    /// durations saturate at the end of the clock instead of wrapping.
    pub fn start(&mut self, exercise: CardId, duration_ms: f64, now: u64) {
        if !duration_ms.is_finite() || duration_ms <= 0.0 {
            debug!(card = %exercise, duration_ms, "ignoring rest countdown with invalid duration");
            return;
        }
        let duration_ms = duration_ms.ceil() as u64;

        self.stop_active(now);

        let handle = self.scheduler.schedule(now.saturating_add(duration_ms));
        self.active = Some(ActiveRest {
            exercise,
            duration_ms,
            started_at: now,
            handle,
        });
        debug!(card = %exercise, duration_ms, "rest countdown started");
    }

    /// Cancel the active countdown, crediting the time it actually ran
    pub fn stop_active(&mut self, now: u64) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.scheduler.cancel(active.handle);
        let credited = active.capped_elapsed(now);
        self.total_elapsed_ms = self.total_elapsed_ms.saturating_add(credited);
        debug!(card = %active.exercise, credited_ms = credited, "rest countdown stopped");
    }

    /// Fire the scheduled completion if it is due.
    ///
    /// Returns the completion exactly once per countdown; the caller is
    /// responsible for notifying.
    pub fn poll(&mut self, now: u64) -> Option<RestCompleted> {
        let mut completed = None;
        for handle in self.scheduler.take_due(now) {
            match self.active {
                Some(active) if active.handle == handle => {
                    self.active = None;
                    self.total_elapsed_ms = self.total_elapsed_ms.saturating_add(active.duration_ms);
                    debug!(card = %active.exercise, duration_ms = active.duration_ms, "rest countdown completed");
                    completed = Some(RestCompleted {
                        exercise: active.exercise,
                        duration_ms: active.duration_ms,
                    });
                }
                _ => debug!(?handle, "dropping stale rest completion"),
            }
        }
        completed
    }

    pub fn total_elapsed(&self, now: u64) -> u64 {
        let running = self.active.map_or(0, |active| active.capped_elapsed(now));
        self.total_elapsed_ms.saturating_add(running)
    }

    pub fn committed_ms(&self) -> u64 {
        self.total_elapsed_ms
    }

    pub fn active(&self) -> Option<&ActiveRest> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn remaining(&self, now: u64) -> Option<u64> {
        self.active.map(|active| active.remaining(now))
    }

    /// Drop all rest state for a fresh card list
    pub fn reset(&mut self) {
        if let Some(active) = self.active.take() {
            self.scheduler.cancel(active.handle);
        }
        self.scheduler.cancel_all();
        self.total_elapsed_ms = 0;
    }
}
