//! The logging form: exercise cards for the selected workout together with
//! the timers that belong to them.
//!
//! The form owns its `TimerRegistry` and `RestTimerController`, so their
//! lifetime is exactly the lifetime of the current card list. Rebuilding the
//! list or clearing the form discards all timing state.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::plan::{rows_for_workout, ExerciseKind, PlanRow};
use crate::session::{item_time_ms, total_session_elapsed, SessionItem, SessionRecord};
use crate::timers::{CardId, RestCompleted, RestTimerController, TimerRegistry};
use crate::util::{new_id, today_iso};

pub const MAX_PAIN: u8 = 5;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SaveError {
    #[error("pick a date first")]
    MissingDate,

    #[error("select a workout type")]
    MissingWorkout,

    #[error("nothing entered yet (fill some reps/sets/comment)")]
    NothingEntered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseCard {
    pub id: CardId,
    pub exercise: String,
    pub target: String,
    pub kind: ExerciseKind,
    pub default_rest_min: Option<f64>,
    pub reps: Vec<Option<u32>>,
    /// typed by hand; hides the value derived from the rep grid
    pub sets_done_override: Option<u32>,
    pub rest_min_input: Option<f64>,
    pub pain: u8,
    pub comment: String,
}

impl ExerciseCard {
    fn from_row(id: CardId, row: &PlanRow) -> Self {
        Self {
            id,
            exercise: row.exercise.clone(),
            target: row.target(),
            kind: row.kind,
            default_rest_min: row.rest_min,
            reps: vec![None; row.sets_planned()],
            sets_done_override: None,
            rest_min_input: None,
            pain: 0,
            comment: String::new(),
        }
    }

    pub fn sets_planned(&self) -> usize {
        self.reps.len()
    }

    pub fn filled_sets(&self) -> usize {
        self.reps.iter().filter(|r| r.is_some()).count()
    }

    pub fn sets_done(&self) -> Option<u32> {
        self.sets_done_override
            .or_else(|| Some(self.filled_sets() as u32).filter(|n| *n > 0))
    }

    pub fn rest_min(&self) -> Option<f64> {
        self.rest_min_input.or(self.default_rest_min)
    }

    fn is_meaningful(&self) -> bool {
        self.filled_sets() > 0
            || self.sets_done_override.is_some()
            || !self.comment.trim().is_empty()
            || self.rest_min_input.is_some()
            || self.pain > 0
    }

    fn clear_inputs(&mut self) {
        self.reps.iter_mut().for_each(|r| *r = None);
        self.sets_done_override = None;
        self.rest_min_input = None;
        self.pain = 0;
        self.comment.clear();
    }
}

#[derive(Debug)]
pub struct LogForm {
    pub date: String,
    pub comment: String,
    workout: Option<String>,
    cards: Vec<ExerciseCard>,
    timers: TimerRegistry,
    rest: RestTimerController,
    next_card: u64,
}

impl Default for LogForm {
    fn default() -> Self {
        Self::new()
    }
}

impl LogForm {
    pub fn new() -> Self {
        Self {
            date: today_iso(),
            comment: String::new(),
            workout: None,
            cards: Vec::new(),
            timers: TimerRegistry::new(),
            rest: RestTimerController::new(),
            next_card: 0,
        }
    }

    /// Rebuild the card list for `workout`. All timers start from zero.
    pub fn load_workout(&mut self, plan: &[PlanRow], workout: &str, now: u64) {
        self.discard_timing(now);

        self.cards = rows_for_workout(plan, workout)
            .into_iter()
            .map(|row| {
                self.next_card += 1;
                ExerciseCard::from_row(CardId(self.next_card), row)
            })
            .collect();
        self.timers = TimerRegistry::with_cards(self.cards.iter().map(|c| c.id));
        self.workout = Some(workout.to_string()).filter(|w| !w.is_empty());
        debug!(workout, cards = self.cards.len(), "exercise list rebuilt");
    }

    /// Empty every input and zero all timers, keeping the cards
    pub fn clear(&mut self, now: u64) {
        self.discard_timing(now);
        self.comment.clear();
        self.cards.iter_mut().for_each(ExerciseCard::clear_inputs);
    }

    fn discard_timing(&mut self, now: u64) {
        self.rest.stop_active(now);
        self.rest.reset();
        self.timers.reset_all();
    }

    pub fn workout(&self) -> Option<&str> {
        self.workout.as_deref()
    }

    pub fn cards(&self) -> &[ExerciseCard] {
        &self.cards
    }

    pub fn card(&self, id: CardId) -> Option<&ExerciseCard> {
        self.cards.iter().find(|c| c.id == id)
    }

    fn card_mut(&mut self, id: CardId) -> Option<&mut ExerciseCard> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    pub fn rest(&self) -> &RestTimerController {
        &self.rest
    }

    pub fn start_timer(&mut self, id: CardId, now: u64) {
        self.timers.start(id, now);
    }

    pub fn stop_timer(&mut self, id: CardId, now: u64) {
        self.timers.stop(id, now);
    }

    pub fn reset_timer(&mut self, id: CardId) {
        self.timers.reset(id);
    }

    pub fn stop_rest(&mut self, now: u64) {
        self.rest.stop_active(now);
    }

    /// Fire the rest completion if it is due
    pub fn poll(&mut self, now: u64) -> Option<RestCompleted> {
        self.rest.poll(now)
    }

    /// Record the reps of one set (0-based).
    ///
    /// Filling a previously empty set that is not the last planned one starts
    /// the rest countdown with the card's rest minutes.
    pub fn set_rep(&mut self, id: CardId, set_index: usize, value: Option<u32>, now: u64) {
        let Some(card) = self.card_mut(id) else {
            return;
        };
        let Some(slot) = card.reps.get_mut(set_index) else {
            return;
        };

        let was_empty = slot.is_none();
        *slot = value;

        let is_last = set_index + 1 == card.sets_planned();
        if was_empty && value.is_some() && !is_last {
            let duration_ms = card.rest_min().map_or(f64::NAN, |min| min * 60_000.0);
            self.rest.start(id, duration_ms, now);
        }
    }

    pub fn set_sets_done(&mut self, id: CardId, value: Option<u32>) {
        if let Some(card) = self.card_mut(id) {
            card.sets_done_override = value;
        }
    }

    pub fn set_rest_min(&mut self, id: CardId, value: Option<f64>) {
        if let Some(card) = self.card_mut(id) {
            card.rest_min_input = value.filter(|v| v.is_finite());
        }
    }

    pub fn set_pain(&mut self, id: CardId, pain: u8) {
        if let Some(card) = self.card_mut(id) {
            card.pain = pain.min(MAX_PAIN);
        }
    }

    pub fn set_comment(&mut self, id: CardId, comment: &str) {
        if let Some(card) = self.card_mut(id) {
            card.comment = comment.to_string();
        }
    }

    pub fn total_elapsed(&self, now: u64) -> u64 {
        total_session_elapsed(&self.timers, &self.rest, now)
    }

    /// Snapshot the form into a session record, stamping the time totals
    pub fn build_session(&self, now: u64) -> Result<SessionRecord, SaveError> {
        if self.date.trim().is_empty() {
            return Err(SaveError::MissingDate);
        }
        let Some(workout) = self.workout.clone() else {
            return Err(SaveError::MissingWorkout);
        };
        if !self.cards.iter().any(ExerciseCard::is_meaningful) {
            return Err(SaveError::NothingEntered);
        }

        let items = self
            .cards
            .iter()
            .map(|card| SessionItem {
                exercise: card.exercise.clone(),
                target: card.target.clone(),
                sets_planned: card.sets_planned(),
                sets_done: card.sets_done(),
                reps_by_set: card.reps.clone(),
                rest_min: card.rest_min(),
                pain_0_to_5: card.pain,
                comment: card.comment.trim().to_string(),
                time_ms: item_time_ms(self.timers.elapsed(card.id, now)),
            })
            .collect();

        let record = SessionRecord {
            id: new_id(),
            date_iso: self.date.trim().to_string(),
            workout,
            comment: self.comment.trim().to_string(),
            items,
            created_at: Utc::now().to_rfc3339(),
            total_time_ms: Some(self.total_elapsed(now)),
        };
        info!(workout = %record.workout, total_ms = ?record.total_time_ms, "session built");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::default_plan;
    use assert_matches::assert_matches;

    const UPPER: &str = "Workout 2 – Upper Body";

    fn form() -> LogForm {
        let mut form = LogForm::new();
        form.load_workout(&default_plan(), UPPER, 0);
        form
    }

    fn ids(form: &LogForm) -> Vec<CardId> {
        form.cards().iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_load_workout_builds_cards_in_order() {
        let form = form();
        let names: Vec<&str> = form.cards().iter().map(|c| c.exercise.as_str()).collect();
        assert_eq!(names[0], "Pull-up");
        assert_eq!(names.len(), 6);
        assert_eq!(form.cards()[0].sets_planned(), 5);
        assert_eq!(form.timers().len(), 6);
        assert_eq!(form.workout(), Some(UPPER));
    }

    #[test]
    fn test_rebuild_regenerates_ids_and_zeroes_timers() {
        let mut form = form();
        let old = ids(&form);
        form.start_timer(old[0], 0);
        form.set_rep(old[0], 0, Some(2), 1_000);
        assert!(form.rest().is_active());

        form.load_workout(&default_plan(), UPPER, 5_000);

        let new = ids(&form);
        assert!(new.iter().all(|id| !old.contains(id)));
        assert_eq!(form.total_elapsed(9_000), 0);
        assert!(!form.rest().is_active());
        assert!(!form.timers().any_running());

        // a stale id from the previous list does nothing
        form.start_timer(old[0], 9_000);
        assert!(!form.timers().any_running());
    }

    #[test]
    fn test_filling_a_set_starts_rest() {
        let mut form = form();
        let pull_up = ids(&form)[0];

        form.set_rep(pull_up, 0, Some(2), 1_000);

        let active = form.rest().active().copied().unwrap();
        assert_eq!(active.exercise, pull_up);
        assert_eq!(active.duration_ms, 5 * 60_000);
        assert_eq!(active.started_at, 1_000);
    }

    #[test]
    fn test_last_set_and_refills_do_not_start_rest() {
        let mut form = form();
        let pull_up = ids(&form)[0];

        form.set_rep(pull_up, 4, Some(2), 0);
        assert!(!form.rest().is_active());

        form.set_rep(pull_up, 0, Some(2), 0);
        form.stop_rest(100);
        form.set_rep(pull_up, 0, Some(3), 200);
        assert!(!form.rest().is_active());
        assert_eq!(form.rest().committed_ms(), 100);
    }

    #[test]
    fn test_rest_override_and_missing_rest() {
        let mut form = form();
        let push_up = ids(&form)[1];

        form.set_rest_min(push_up, Some(0.5));
        form.set_rep(push_up, 0, Some(12), 0);
        assert_eq!(form.rest().active().map(|a| a.duration_ms), Some(30_000));

        form.stop_rest(0);
        form.set_rest_min(push_up, Some(0.0));
        form.set_rep(push_up, 1, Some(12), 0);
        assert!(!form.rest().is_active());
    }

    #[test]
    fn test_enormous_rest_input_counts_down_without_overflow() {
        let mut form = form();
        let push_up = ids(&form)[1];
        form.start_timer(ids(&form)[0], 0);

        form.set_rest_min(push_up, Some(1e15));
        form.set_rep(push_up, 0, Some(3), 1_000);

        assert!(form.rest().is_active());
        assert!(form.poll(1_000_000).is_none());
        assert_eq!(form.total_elapsed(u64::MAX), u64::MAX);

        form.stop_rest(61_000);
        assert_eq!(form.rest().committed_ms(), 60_000);
    }

    #[test]
    fn test_sets_done_derives_from_reps_unless_overridden() {
        let mut form = form();
        let id = ids(&form)[2];

        assert_eq!(form.card(id).unwrap().sets_done(), None);
        form.set_rep(id, 0, Some(10), 0);
        form.set_rep(id, 2, Some(8), 0);
        assert_eq!(form.card(id).unwrap().sets_done(), Some(2));

        form.set_sets_done(id, Some(3));
        assert_eq!(form.card(id).unwrap().sets_done(), Some(3));
        form.set_sets_done(id, None);
        assert_eq!(form.card(id).unwrap().sets_done(), Some(2));
    }

    #[test]
    fn test_pain_is_clamped() {
        let mut form = form();
        let id = ids(&form)[0];
        form.set_pain(id, 9);
        assert_eq!(form.card(id).unwrap().pain, MAX_PAIN);
    }

    #[test]
    fn test_clear_commits_rest_then_zeroes_everything() {
        let mut form = form();
        let [a, b, ..] = ids(&form)[..] else {
            panic!("expected cards");
        };
        form.start_timer(a, 0);
        form.start_timer(b, 1_000);
        form.set_rep(a, 0, Some(2), 1_000);
        form.set_comment(a, "felt good");

        form.clear(2_000);

        assert_eq!(form.total_elapsed(10_000), 0);
        assert!(!form.rest().is_active());
        assert_eq!(form.card(a).unwrap().filled_sets(), 0);
        assert!(form.card(a).unwrap().comment.is_empty());
        assert_eq!(ids(&form)[0], a);
    }

    #[test]
    fn test_build_session_validates() {
        let mut form = LogForm::new();
        assert_matches!(form.build_session(0), Err(SaveError::MissingWorkout));

        form.load_workout(&default_plan(), UPPER, 0);
        assert_matches!(form.build_session(0), Err(SaveError::NothingEntered));

        form.date.clear();
        assert_matches!(form.build_session(0), Err(SaveError::MissingDate));
    }

    #[test]
    fn test_build_session_stamps_times() {
        let mut form = form();
        let [a, b, ..] = ids(&form)[..] else {
            panic!("expected cards");
        };

        form.start_timer(a, 0);
        form.stop_timer(a, 3_000);
        form.start_timer(b, 3_000);
        form.stop_timer(b, 5_000);
        form.set_rest_min(b, Some(0.25));
        form.set_rep(b, 0, Some(12), 5_000);
        assert!(form.poll(20_000).is_some());

        let record = form.build_session(20_000).unwrap();

        assert_eq!(record.total_time_ms, Some(20_000));
        assert_eq!(record.items[0].time_ms, Some(3_000));
        assert_eq!(record.items[1].time_ms, Some(2_000));
        assert_eq!(record.items[2].time_ms, None);
        assert_eq!(record.items[1].reps_by_set, vec![Some(12), None, None]);
        assert_eq!(record.items[1].sets_done, Some(1));
        assert_eq!(record.items.len(), 6);
        assert_eq!(record.workout, UPPER);
    }
}
