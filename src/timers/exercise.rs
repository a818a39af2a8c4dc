use std::collections::BTreeMap;

use tracing::debug;

use super::CardId;

/// Stopwatch state for a single exercise card
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExerciseTimerState {
    /// time committed by earlier start/stop cycles
    pub elapsed_ms: u64,
    /// set exactly while the stopwatch is running
    pub started_at: Option<u64>,
}

impl ExerciseTimerState {
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self, now: u64) -> u64 {
        match self.started_at {
            Some(started) => self.elapsed_ms.saturating_add(now.saturating_sub(started)),
            None => self.elapsed_ms,
        }
    }

    fn commit(&mut self, now: u64) {
        if let Some(started) = self.started_at.take() {
            self.elapsed_ms = self.elapsed_ms.saturating_add(now.saturating_sub(started));
        }
    }
}

/// Per-card stopwatches with at most one running at a time.
///
/// Starting a stopwatch silently stops whichever one was running before.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: BTreeMap<CardId, ExerciseTimerState>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with a zeroed stopwatch for each card
    pub fn with_cards<I: IntoIterator<Item = CardId>>(ids: I) -> Self {
        Self {
            timers: ids
                .into_iter()
                .map(|id| (id, ExerciseTimerState::default()))
                .collect(),
        }
    }

    pub fn insert(&mut self, id: CardId) {
        self.timers.entry(id).or_default();
    }

    pub fn start(&mut self, id: CardId, now: u64) {
        match self.timers.get(&id) {
            None => return,
            Some(state) if state.is_running() => return,
            Some(_) => {}
        }

        for (other_id, other) in self.timers.iter_mut() {
            if *other_id != id && other.is_running() {
                other.commit(now);
                debug!(card = %other_id, elapsed_ms = other.elapsed_ms, "stopped by another start");
            }
        }

        if let Some(state) = self.timers.get_mut(&id) {
            state.started_at = Some(now);
            debug!(card = %id, "exercise timer started");
        }
    }

    pub fn stop(&mut self, id: CardId, now: u64) {
        if let Some(state) = self.timers.get_mut(&id) {
            if state.is_running() {
                state.commit(now);
                debug!(card = %id, elapsed_ms = state.elapsed_ms, "exercise timer stopped");
            }
        }
    }

    pub fn reset(&mut self, id: CardId) {
        if let Some(state) = self.timers.get_mut(&id) {
            *state = ExerciseTimerState::default();
        }
    }

    /// Zero every stopwatch, keeping the cards
    pub fn reset_all(&mut self) {
        for state in self.timers.values_mut() {
            *state = ExerciseTimerState::default();
        }
    }

    pub fn elapsed(&self, id: CardId, now: u64) -> u64 {
        self.timers.get(&id).map_or(0, |state| state.elapsed(now))
    }

    pub fn state(&self, id: CardId) -> Option<&ExerciseTimerState> {
        self.timers.get(&id)
    }

    pub fn is_running(&self, id: CardId) -> bool {
        self.timers.get(&id).is_some_and(ExerciseTimerState::is_running)
    }

    pub fn running_id(&self) -> Option<CardId> {
        self.timers
            .iter()
            .find(|(_, state)| state.is_running())
            .map(|(id, _)| *id)
    }

    pub fn any_running(&self) -> bool {
        self.running_id().is_some()
    }

    pub fn total_elapsed(&self, now: u64) -> u64 {
        self.timers
            .values()
            .fold(0u64, |total, state| total.saturating_add(state.elapsed(now)))
    }

    pub fn ids(&self) -> impl Iterator<Item = CardId> + '_ {
        self.timers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
