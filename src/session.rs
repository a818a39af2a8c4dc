use serde::{Deserialize, Serialize};

use crate::timers::{RestTimerController, TimerRegistry};

/// One exercise as logged in a saved session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionItem {
    pub exercise: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub sets_planned: usize,
    pub sets_done: Option<u32>,
    #[serde(default)]
    pub reps_by_set: Vec<Option<u32>>,
    pub rest_min: Option<f64>,
    #[serde(rename = "pain0to5", default)]
    pub pain_0_to_5: u8,
    #[serde(default)]
    pub comment: String,
    /// exercise stopwatch at save time, absent when nothing was recorded
    #[serde(default)]
    pub time_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default = "crate::util::new_id")]
    pub id: String,
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    pub workout: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub items: Vec<SessionItem>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub total_time_ms: Option<u64>,
}

impl SessionRecord {
    pub fn max_pain(&self) -> u8 {
        self.items.iter().map(|it| it.pain_0_to_5).max().unwrap_or(0)
    }
}

/// Exercise time plus rest time, including whatever is still counting
pub fn total_session_elapsed(timers: &TimerRegistry, rest: &RestTimerController, now: u64) -> u64 {
    timers.total_elapsed(now).saturating_add(rest.total_elapsed(now))
}

/// Zero is stored as "no time recorded"
pub fn item_time_ms(elapsed_ms: u64) -> Option<u64> {
    (elapsed_ms > 0).then_some(elapsed_ms)
}
