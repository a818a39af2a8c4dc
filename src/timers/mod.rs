pub mod exercise;
pub mod rest;
pub mod schedule;

use std::fmt;

pub use exercise::{ExerciseTimerState, TimerRegistry};
pub use rest::{ActiveRest, RestCompleted, RestTimerController};
pub use schedule::{OneShotScheduler, ScheduleHandle};

/// Identifier of one exercise card in the current card list.
///
/// Ids are handed out from a counter that is never rewound, so an id from a
/// list that has since been rebuilt never matches a live card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card-{}", self.0)
    }
}
