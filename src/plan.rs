use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::new_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum ExerciseKind {
    Strength,
    #[serde(rename = "AMRAP")]
    #[strum(serialize = "AMRAP")]
    Amrap,
    #[serde(rename = "Rep Range")]
    #[strum(serialize = "Rep Range")]
    RepRange,
    #[serde(other)]
    Other,
}

/// One configured exercise of a workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRow {
    #[serde(default = "new_id")]
    pub id: String,
    pub exercise: String,
    pub workout: String,
    pub sets: Option<u32>,
    pub rep_low: Option<u32>,
    pub rep_high: Option<u32>,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: ExerciseKind,
    pub rest_min: Option<f64>,
    #[serde(default)]
    pub sort_order: Option<u32>,
}

fn default_kind() -> ExerciseKind {
    ExerciseKind::Other
}

impl PlanRow {
    pub fn new(
        exercise: &str,
        workout: &str,
        sets: u32,
        reps: Option<(u32, u32)>,
        kind: ExerciseKind,
        rest_min: f64,
    ) -> Self {
        Self {
            id: new_id(),
            exercise: exercise.to_string(),
            workout: workout.trim().to_string(),
            sets: Some(sets),
            rep_low: reps.map(|r| r.0),
            rep_high: reps.map(|r| r.1),
            kind,
            rest_min: Some(rest_min),
            sort_order: None,
        }
    }

    /// At least one set is always planned
    pub fn sets_planned(&self) -> usize {
        self.sets.unwrap_or(1).max(1) as usize
    }

    /// Short target text such as `3 × 12–15` or `2 × AMRAP`
    pub fn target(&self) -> String {
        let sets = self.sets.map_or_else(|| "?".to_string(), |s| s.to_string());
        match (self.kind, self.rep_low, self.rep_high) {
            (ExerciseKind::Amrap, _, _) => format!("{sets} × AMRAP"),
            (ExerciseKind::Strength, Some(low), _) => format!("{sets} × {low}"),
            (ExerciseKind::Strength, None, _) => format!("{sets} × ?"),
            (_, Some(low), Some(high)) if low != high => format!("{sets} × {low}–{high}"),
            (_, Some(low), Some(_)) => format!("{sets} × {low}"),
            _ => format!("{sets} sets"),
        }
    }
}

const FULL_BODY: &str = "Workout 1 – Full Body";
const UPPER_BODY: &str = "Workout 2 – Upper Body";
const LOWER_BODY: &str = "Workout 3 – Lower Body";

/// The plan a fresh install starts with
pub fn default_plan() -> Vec<PlanRow> {
    use ExerciseKind::{Amrap, RepRange, Strength};

    let rows = vec![
        PlanRow::new("Pull-up", FULL_BODY, 5, Some((2, 2)), Strength, 5.0),
        PlanRow::new("Lunge", FULL_BODY, 2, None, Amrap, 5.0),
        PlanRow::new("Push-up", FULL_BODY, 3, Some((12, 15)), RepRange, 5.0),
        PlanRow::new("Glute Bridge", FULL_BODY, 3, Some((6, 20)), RepRange, 5.0),
        PlanRow::new("TRX Lateral Raise", FULL_BODY, 3, Some((15, 20)), RepRange, 3.0),
        PlanRow::new("Calf Raise", FULL_BODY, 2, Some((6, 30)), RepRange, 3.0),
        PlanRow::new("TRX Crunch", FULL_BODY, 2, None, Amrap, 3.0),
        PlanRow::new("Pull-up", UPPER_BODY, 5, Some((2, 2)), Strength, 5.0),
        PlanRow::new("Push-up", UPPER_BODY, 3, Some((12, 15)), RepRange, 5.0),
        PlanRow::new("TRX Row", UPPER_BODY, 3, Some((12, 15)), RepRange, 5.0),
        PlanRow::new("TRX Bicep Curl", UPPER_BODY, 3, Some((15, 20)), RepRange, 3.0),
        PlanRow::new("TRX Triceps Extension", UPPER_BODY, 3, Some((15, 20)), RepRange, 3.0),
        PlanRow::new("TRX Lateral Raise", UPPER_BODY, 3, Some((15, 20)), RepRange, 3.0),
        PlanRow::new("Lunge", LOWER_BODY, 2, None, Amrap, 5.0),
        PlanRow::new("Glute Bridge", LOWER_BODY, 3, Some((6, 20)), RepRange, 5.0),
        PlanRow::new("Calf Raise", LOWER_BODY, 2, Some((6, 30)), RepRange, 3.0),
        PlanRow::new("TRX Crunch", LOWER_BODY, 2, None, Amrap, 3.0),
    ];
    renumber(rows)
}

/// Assign 1-based sort orders per workout, keeping the given row order
pub fn renumber(mut rows: Vec<PlanRow>) -> Vec<PlanRow> {
    let mut counters = std::collections::HashMap::<String, u32>::new();
    for row in rows.iter_mut() {
        row.workout = row.workout.trim().to_string();
        let n = counters.entry(row.workout.clone()).or_insert(0);
        *n += 1;
        row.sort_order = Some(*n);
    }
    rows
}

/// Distinct non-empty workout names, sorted
pub fn unique_workouts(rows: &[PlanRow]) -> Vec<String> {
    rows.iter()
        .map(|r| r.workout.trim())
        .filter(|w| !w.is_empty())
        .unique()
        .sorted()
        .map(str::to_string)
        .collect()
}

/// Rows of one workout in configured order; unordered rows go last
pub fn rows_for_workout<'a>(rows: &'a [PlanRow], workout: &str) -> Vec<&'a PlanRow> {
    rows.iter()
        .filter(|r| r.workout == workout)
        .sorted_by_key(|r| r.sort_order.unwrap_or(u32::MAX))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Swap a row with its nearest neighbour of the same workout, then renumber.
/// Returns false when the row is already at that end of its workout.
pub fn move_row(rows: &mut Vec<PlanRow>, id: &str, direction: Direction) -> bool {
    let workout = match rows.iter().find(|r| r.id == id) {
        Some(row) => row.workout.clone(),
        None => return false,
    };

    let mut ordered = display_order(std::mem::take(rows));

    let Some(idx) = ordered.iter().position(|r| r.id == id) else {
        *rows = ordered;
        return false;
    };
    let neighbour = match direction {
        Direction::Up => idx.checked_sub(1),
        Direction::Down => Some(idx + 1).filter(|i| *i < ordered.len()),
    }
    .filter(|i| ordered[*i].workout == workout);

    let moved = match neighbour {
        Some(other) => {
            ordered.swap(idx, other);
            true
        }
        None => false,
    };
    *rows = renumber(ordered);
    moved
}

/// Rows grouped by workout, each group in sort order with unordered rows last
fn display_order(rows: Vec<PlanRow>) -> Vec<PlanRow> {
    rows.into_iter()
        .sorted_by(|a, b| {
            a.workout
                .cmp(&b.workout)
                .then(a.sort_order.unwrap_or(u32::MAX).cmp(&b.sort_order.unwrap_or(u32::MAX)))
        })
        .collect()
}

/// Editable column of a plan row
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PlanField {
    Exercise,
    Workout,
    Sets,
    #[strum(serialize = "Reps low")]
    RepLow,
    #[strum(serialize = "Reps high")]
    RepHigh,
    Type,
    #[strum(serialize = "Rest (min)")]
    RestMin,
}

#[derive(Error, Debug, PartialEq)]
pub enum PlanEditError {
    #[error("exercise name is required")]
    EmptyExercise,

    #[error("not a number: {0}")]
    NotANumber(String),

    #[error("unknown type: {0} (Strength, AMRAP, Rep Range, Other)")]
    UnknownKind(String),

    #[error("no such plan row")]
    NoSuchRow,
}

impl ExerciseKind {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "strength" => Some(Self::Strength),
            "amrap" => Some(Self::Amrap),
            "rep range" | "reprange" | "range" => Some(Self::RepRange),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl PlanRow {
    /// Current value of a column as editable text
    pub fn field_text(&self, field: PlanField) -> String {
        let opt = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_default();
        match field {
            PlanField::Exercise => self.exercise.clone(),
            PlanField::Workout => self.workout.clone(),
            PlanField::Sets => opt(self.sets),
            PlanField::RepLow => opt(self.rep_low),
            PlanField::RepHigh => opt(self.rep_high),
            PlanField::Type => self.kind.to_string(),
            PlanField::RestMin => self.rest_min.map(|r| r.to_string()).unwrap_or_default(),
        }
    }

    /// Parse `text` into one column. Blank numbers clear the value, a blank
    /// workout falls back to the first default workout.
    pub fn set_field(&mut self, field: PlanField, text: &str) -> Result<(), PlanEditError> {
        let text = text.trim();
        let number = |text: &str| -> Result<Option<u32>, PlanEditError> {
            if text.is_empty() {
                return Ok(None);
            }
            text.parse()
                .map(Some)
                .map_err(|_| PlanEditError::NotANumber(text.to_string()))
        };

        match field {
            PlanField::Exercise => {
                if text.is_empty() {
                    return Err(PlanEditError::EmptyExercise);
                }
                self.exercise = text.to_string();
            }
            PlanField::Workout => {
                let workout = if text.is_empty() { FULL_BODY } else { text };
                if workout != self.workout {
                    self.workout = workout.to_string();
                    // lands at the end of its new workout
                    self.sort_order = None;
                }
            }
            PlanField::Sets => self.sets = number(text)?,
            PlanField::RepLow => self.rep_low = number(text)?,
            PlanField::RepHigh => self.rep_high = number(text)?,
            PlanField::Type => {
                self.kind = ExerciseKind::parse(text).ok_or_else(|| PlanEditError::UnknownKind(text.to_string()))?;
            }
            PlanField::RestMin => {
                self.rest_min = if text.is_empty() {
                    None
                } else {
                    match text.parse::<f64>() {
                        Ok(rest) if rest.is_finite() && rest >= 0.0 => Some(rest),
                        _ => return Err(PlanEditError::NotANumber(text.to_string())),
                    }
                };
            }
        }
        Ok(())
    }
}

/// Append a one-set exercise to the end of `workout`. Returns the new row id.
pub fn add_row(rows: &mut Vec<PlanRow>, workout: &str, exercise: &str) -> Result<String, PlanEditError> {
    let exercise = exercise.trim();
    if exercise.is_empty() {
        return Err(PlanEditError::EmptyExercise);
    }
    let workout = match workout.trim() {
        "" => FULL_BODY,
        w => w,
    };
    let next_order = rows
        .iter()
        .filter(|r| r.workout == workout)
        .filter_map(|r| r.sort_order)
        .max()
        .unwrap_or(0)
        .saturating_add(1);

    let row = PlanRow {
        id: new_id(),
        exercise: exercise.to_string(),
        workout: workout.to_string(),
        sets: Some(1),
        rep_low: None,
        rep_high: None,
        kind: ExerciseKind::RepRange,
        rest_min: None,
        sort_order: Some(next_order),
    };
    let id = row.id.clone();
    rows.push(row);
    *rows = renumber(display_order(std::mem::take(rows)));
    Ok(id)
}

/// Remove a row and close the gap in its workout's numbering
pub fn delete_row(rows: &mut Vec<PlanRow>, id: &str) -> bool {
    let before = rows.len();
    rows.retain(|r| r.id != id);
    if rows.len() == before {
        return false;
    }
    *rows = renumber(display_order(std::mem::take(rows)));
    true
}

/// Apply one column edit, then regroup and renumber
pub fn edit_row(rows: &mut Vec<PlanRow>, id: &str, field: PlanField, text: &str) -> Result<(), PlanEditError> {
    let row = rows.iter_mut().find(|r| r.id == id).ok_or(PlanEditError::NoSuchRow)?;
    row.set_field(field, text)?;
    *rows = renumber(display_order(std::mem::take(rows)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: ExerciseKind, sets: Option<u32>, low: Option<u32>, high: Option<u32>) -> PlanRow {
        PlanRow {
            id: "x".into(),
            exercise: "Push-up".into(),
            workout: "W".into(),
            sets,
            rep_low: low,
            rep_high: high,
            kind,
            rest_min: None,
            sort_order: None,
        }
    }

    #[test]
    fn test_target_text() {
        use ExerciseKind::*;
        assert_eq!(row(Amrap, Some(2), None, None).target(), "2 × AMRAP");
        assert_eq!(row(Strength, Some(5), Some(2), Some(2)).target(), "5 × 2");
        assert_eq!(row(Strength, Some(5), None, None).target(), "5 × ?");
        assert_eq!(row(RepRange, Some(3), Some(12), Some(15)).target(), "3 × 12–15");
        assert_eq!(row(RepRange, Some(3), Some(8), Some(8)).target(), "3 × 8");
        assert_eq!(row(Other, Some(4), None, Some(8)).target(), "4 sets");
    }

    #[test]
    fn test_sets_planned_is_at_least_one() {
        assert_eq!(row(ExerciseKind::Other, None, None, None).sets_planned(), 1);
        assert_eq!(row(ExerciseKind::Other, Some(0), None, None).sets_planned(), 1);
        assert_eq!(row(ExerciseKind::Other, Some(4), None, None).sets_planned(), 4);
    }

    #[test]
    fn test_default_plan_shape() {
        let plan = default_plan();
        assert_eq!(plan.len(), 17);
        assert_eq!(unique_workouts(&plan).len(), 3);

        let lower = rows_for_workout(&plan, LOWER_BODY);
        let names: Vec<&str> = lower.iter().map(|r| r.exercise.as_str()).collect();
        assert_eq!(names, ["Lunge", "Glute Bridge", "Calf Raise", "TRX Crunch"]);
        assert_eq!(lower[3].sort_order, Some(4));
    }

    #[test]
    fn test_rows_for_workout_puts_unordered_last() {
        let mut a = row(ExerciseKind::Other, Some(1), None, None);
        a.exercise = "A".into();
        let mut b = a.clone();
        b.exercise = "B".into();
        b.sort_order = Some(1);

        let rows = vec![a, b];
        let names: Vec<&str> = rows_for_workout(&rows, "W")
            .iter()
            .map(|r| r.exercise.as_str())
            .collect();
        assert_eq!(names, ["B", "A"]);
    }

    #[test]
    fn test_move_row_stays_inside_workout() {
        let mut plan = default_plan();
        let first_upper = rows_for_workout(&plan, UPPER_BODY)[0].id.clone();

        assert!(!move_row(&mut plan, &first_upper, Direction::Up));
        assert!(move_row(&mut plan, &first_upper, Direction::Down));

        let upper = rows_for_workout(&plan, UPPER_BODY);
        assert_eq!(upper[0].exercise, "Push-up");
        assert_eq!(upper[1].exercise, "Pull-up");
        assert_eq!(upper[1].sort_order, Some(2));
        assert_eq!(plan.len(), 17);
    }

    #[test]
    fn test_plan_row_json_uses_camel_case() {
        let json = serde_json::to_value(&default_plan()[0]).unwrap();
        assert_eq!(json["type"], "Strength");
        assert_eq!(json["repLow"], 2);
        assert_eq!(json["restMin"], 5.0);
        assert_eq!(json["sortOrder"], 1);

        let parsed: PlanRow = serde_json::from_str(
            r#"{"exercise":"Plank","workout":"Core","sets":3,"repLow":null,"repHigh":null,"type":"Isometric","restMin":1}"#,
        )
        .unwrap();
        assert_eq!(parsed.kind, ExerciseKind::Other);
        assert_eq!(parsed.id.len(), 32);
    }

    fn names_of(rows: &[PlanRow], workout: &str) -> Vec<String> {
        rows_for_workout(rows, workout).iter().map(|r| r.exercise.clone()).collect()
    }

    #[test]
    fn test_add_row_appends_to_workout() {
        let mut rows = default_plan();
        let id = add_row(&mut rows, LOWER_BODY, "  Step-up ").unwrap();

        let added = rows.iter().find(|r| r.id == id).unwrap();
        assert_eq!(added.exercise, "Step-up");
        assert_eq!(added.sort_order, Some(5));
        assert_eq!(added.sets, Some(1));
        assert_eq!(added.kind, ExerciseKind::RepRange);
        assert_eq!(names_of(&rows, LOWER_BODY).last().map(String::as_str), Some("Step-up"));
        assert_eq!(rows.len(), 18);

        assert_eq!(add_row(&mut rows, LOWER_BODY, "  "), Err(PlanEditError::EmptyExercise));
        let blank_workout = add_row(&mut rows, "", "Plank").unwrap();
        assert_eq!(rows.iter().find(|r| r.id == blank_workout).unwrap().workout, FULL_BODY);
    }

    #[test]
    fn test_delete_row_closes_numbering_gap() {
        let mut rows = default_plan();
        let lunge = rows_for_workout(&rows, LOWER_BODY)[0].id.clone();

        assert!(delete_row(&mut rows, &lunge));
        assert!(!delete_row(&mut rows, &lunge));

        let orders: Vec<_> = rows_for_workout(&rows, LOWER_BODY).iter().map(|r| r.sort_order).collect();
        assert_eq!(orders, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(rows.len(), 16);
    }

    #[test]
    fn test_edit_row_parses_each_column() {
        let mut rows = default_plan();
        let id = rows_for_workout(&rows, UPPER_BODY)[2].id.clone();

        edit_row(&mut rows, &id, PlanField::Sets, "4").unwrap();
        edit_row(&mut rows, &id, PlanField::RepLow, "8").unwrap();
        edit_row(&mut rows, &id, PlanField::RepHigh, "10").unwrap();
        edit_row(&mut rows, &id, PlanField::RestMin, "2.5").unwrap();
        edit_row(&mut rows, &id, PlanField::Exercise, "Inverted Row").unwrap();
        edit_row(&mut rows, &id, PlanField::Type, "amrap").unwrap();

        let row = rows.iter().find(|r| r.id == id).unwrap();
        assert_eq!(row.exercise, "Inverted Row");
        assert_eq!(row.target(), "4 × AMRAP");
        assert_eq!(row.rest_min, Some(2.5));
        assert_eq!(row.field_text(PlanField::RepHigh), "10");
        assert_eq!(row.field_text(PlanField::Type), "AMRAP");

        edit_row(&mut rows, &id, PlanField::RestMin, "").unwrap();
        assert_eq!(rows.iter().find(|r| r.id == id).unwrap().rest_min, None);
    }

    #[test]
    fn test_edit_row_rejects_bad_input_without_changes() {
        let mut rows = default_plan();
        let before = rows.clone();
        let id = rows[0].id.clone();

        assert_eq!(
            edit_row(&mut rows, &id, PlanField::Sets, "three"),
            Err(PlanEditError::NotANumber("three".into()))
        );
        assert_eq!(
            edit_row(&mut rows, &id, PlanField::RestMin, "-1"),
            Err(PlanEditError::NotANumber("-1".into()))
        );
        assert_eq!(
            edit_row(&mut rows, &id, PlanField::Type, "cardio"),
            Err(PlanEditError::UnknownKind("cardio".into()))
        );
        assert_eq!(edit_row(&mut rows, &id, PlanField::Exercise, ""), Err(PlanEditError::EmptyExercise));
        assert_eq!(edit_row(&mut rows, "missing", PlanField::Sets, "1"), Err(PlanEditError::NoSuchRow));
        assert_eq!(rows, before);
    }

    #[test]
    fn test_changing_workout_moves_row_to_end() {
        let mut rows = default_plan();
        let pull_up = rows_for_workout(&rows, FULL_BODY)[0].id.clone();

        edit_row(&mut rows, &pull_up, PlanField::Workout, LOWER_BODY).unwrap();

        let row = rows.iter().find(|r| r.id == pull_up).unwrap();
        assert_eq!(row.sort_order, Some(5));
        assert_eq!(names_of(&rows, LOWER_BODY).last().map(String::as_str), Some("Pull-up"));
        assert_eq!(rows_for_workout(&rows, FULL_BODY)[0].sort_order, Some(1));
        assert_eq!(rows_for_workout(&rows, FULL_BODY).len(), 6);
    }
}
