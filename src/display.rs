//! Periodic projection of timer state into display text.

use crate::format::format_duration;
use crate::log_form::LogForm;
use crate::notifier::CompletionNotifier;
use crate::timers::CardId;

/// Refresh cadence while anything is counting
pub const TICK_MS: u64 = 500;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardView {
    pub id: CardId,
    pub exercise: String,
    pub elapsed: String,
    pub running: bool,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub reset_enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestView {
    pub exercise: CardId,
    pub exercise_name: String,
    pub remaining: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplaySnapshot {
    pub cards: Vec<CardView>,
    pub rest: Option<RestView>,
    pub rest_total: String,
    pub session_total: String,
    pub banner: bool,
}

/// Keeps the refresh tick alive only while something changes on its own.
#[derive(Debug, Default)]
pub struct DisplaySync {
    active: bool,
}

impl DisplaySync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called on any timer activity
    pub fn wake(&mut self) {
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the display needs another refresh at `now`. Goes idle once no
    /// exercise timer runs, no rest counts down and no banner is showing.
    pub fn should_tick(&mut self, form: &LogForm, notifier: &CompletionNotifier, now: u64) -> bool {
        if !self.active {
            return false;
        }
        let busy = form.timers().any_running()
            || form.rest().is_active()
            || notifier.banner(now).is_some();
        if !busy {
            self.active = false;
            // one last repaint so the final values show
            return true;
        }
        true
    }

    pub fn snapshot(&self, form: &LogForm, notifier: &CompletionNotifier, now: u64) -> DisplaySnapshot {
        let timers = form.timers();
        let cards = form
            .cards()
            .iter()
            .map(|card| {
                let elapsed = timers.elapsed(card.id, now);
                let running = timers.is_running(card.id);
                CardView {
                    id: card.id,
                    exercise: card.exercise.clone(),
                    elapsed: format_duration(elapsed),
                    running,
                    start_enabled: !running,
                    stop_enabled: running,
                    reset_enabled: running || elapsed > 0,
                }
            })
            .collect();

        let rest = form.rest().active().map(|active| RestView {
            exercise: active.exercise,
            exercise_name: form
                .card(active.exercise)
                .map(|c| c.exercise.clone())
                .unwrap_or_default(),
            remaining: format_duration(active.remaining(now)),
        });

        DisplaySnapshot {
            cards,
            rest,
            rest_total: format_duration(form.rest().total_elapsed(now)),
            session_total: format_duration(form.total_elapsed(now)),
            banner: notifier.banner(now).is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompletionMode, NotificationSettings};
    use crate::notifier::{ChannelError, HapticOutput, ToneOutput};
    use crate::plan::default_plan;
    use std::time::Duration;

    struct Silent;

    impl ToneOutput for Silent {
        fn play_tone(&self, _: Duration) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    impl HapticOutput for Silent {
        fn pulse(&self, _: Duration) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    fn setup() -> (LogForm, CompletionNotifier) {
        let mut form = LogForm::new();
        form.load_workout(&default_plan(), "Workout 3 – Lower Body", 0);
        (form, CompletionNotifier::new(Box::new(Silent), Box::new(Silent)))
    }

    #[test]
    fn test_snapshot_flags_follow_timer_state() {
        let (mut form, notifier) = setup();
        let lunge = form.cards()[0].id;
        let sync = DisplaySync::new();

        let idle = sync.snapshot(&form, &notifier, 0);
        assert_eq!(idle.cards[0].elapsed, "0:00");
        assert!(idle.cards[0].start_enabled);
        assert!(!idle.cards[0].stop_enabled);
        assert!(!idle.cards[0].reset_enabled);

        form.start_timer(lunge, 0);
        let running = sync.snapshot(&form, &notifier, 61_000);
        assert_eq!(running.cards[0].elapsed, "1:01");
        assert!(running.cards[0].running);
        assert!(!running.cards[0].start_enabled);
        assert!(running.cards[0].stop_enabled);
        assert_eq!(running.session_total, "1:01");

        form.stop_timer(lunge, 61_000);
        let stopped = sync.snapshot(&form, &notifier, 90_000);
        assert!(stopped.cards[0].reset_enabled);
        assert_eq!(stopped.cards[0].elapsed, "1:01");
    }

    #[test]
    fn test_snapshot_shows_rest_countdown() {
        let (mut form, notifier) = setup();
        let lunge = form.cards()[0].id;
        let sync = DisplaySync::new();

        form.set_rep(lunge, 0, Some(20), 0);
        let snap = sync.snapshot(&form, &notifier, 60_000);

        let rest = snap.rest.unwrap();
        assert_eq!(rest.exercise, lunge);
        assert_eq!(rest.exercise_name, "Lunge");
        assert_eq!(rest.remaining, "4:00");
        assert_eq!(snap.rest_total, "1:00");
    }

    #[test]
    fn test_snapshot_is_a_pure_read() {
        let (mut form, notifier) = setup();
        let lunge = form.cards()[0].id;
        form.set_rep(lunge, 0, Some(20), 0);
        let sync = DisplaySync::new();

        // reading far past the due time neither completes nor commits the rest
        let snap = sync.snapshot(&form, &notifier, 10 * 60_000);
        assert_eq!(snap.rest.map(|r| r.remaining), Some("0:00".to_string()));
        assert!(form.rest().is_active());
        assert_eq!(form.rest().committed_ms(), 0);
    }

    #[test]
    fn test_tick_goes_idle_after_last_repaint() {
        let (mut form, mut notifier) = setup();
        let lunge = form.cards()[0].id;
        let mut sync = DisplaySync::new();

        assert!(!sync.should_tick(&form, &notifier, 0));

        form.start_timer(lunge, 0);
        sync.wake();
        assert!(sync.should_tick(&form, &notifier, 500));

        form.stop_timer(lunge, 700);
        let settings = NotificationSettings {
            completion_duration_sec: 1.0,
            completion_mode: CompletionMode::Banner,
        };
        notifier.notify(&settings, 700);
        assert!(sync.should_tick(&form, &notifier, 1_000));
        assert!(sync.snapshot(&form, &notifier, 1_000).banner);

        assert!(sync.should_tick(&form, &notifier, 2_000));
        assert!(!sync.is_active());
        assert!(!sync.should_tick(&form, &notifier, 2_500));
    }
}
