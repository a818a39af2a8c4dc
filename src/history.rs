use itertools::Itertools;

use crate::session::SessionRecord;
use crate::util::mean;

#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    pub sessions: usize,
    pub workouts: usize,
    pub last_date: Option<String>,
    pub avg_pain: Option<f64>,
}

/// Headline numbers for a newest-first session list
pub fn kpis(sessions: &[SessionRecord]) -> Kpis {
    let pains: Vec<f64> = sessions
        .iter()
        .flat_map(|s| s.items.iter())
        .map(|it| f64::from(it.pain_0_to_5))
        .collect();

    Kpis {
        sessions: sessions.len(),
        workouts: sessions
            .iter()
            .map(|s| s.workout.as_str())
            .filter(|w| !w.is_empty())
            .unique()
            .count(),
        last_date: sessions.first().map(|s| s.date_iso.clone()),
        avg_pain: mean(&pains),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub workout: Option<String>,
    pub query: String,
}

impl HistoryFilter {
    pub fn matches(&self, session: &SessionRecord) -> bool {
        if self.workout.as_deref().is_some_and(|w| !w.is_empty() && session.workout != w) {
            return false;
        }
        let q = self.query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        session.comment.to_lowercase().contains(&q)
            || session.items.iter().any(|it| {
                it.exercise.to_lowercase().contains(&q) || it.comment.to_lowercase().contains(&q)
            })
    }

    pub fn apply<'a>(&self, sessions: &'a [SessionRecord]) -> Vec<&'a SessionRecord> {
        sessions.iter().filter(|s| self.matches(s)).collect()
    }
}

/// `10/—/8` style rendering of a rep grid
pub fn reps_to_string(reps: &[Option<u32>]) -> String {
    reps.iter()
        .map(|r| r.map_or_else(|| "—".to_string(), |v| v.to_string()))
        .join("/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PainLevel {
    Ok,
    Warn,
    Danger,
}

impl PainLevel {
    pub fn from_max(pain: u8) -> Self {
        match pain {
            4.. => PainLevel::Danger,
            2..=3 => PainLevel::Warn,
            _ => PainLevel::Ok,
        }
    }
}
