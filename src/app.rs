use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use liftlog::{
    backup::LocalBackup,
    clock::Clock,
    config::{CompletionMode, NotificationSettings, SettingsStore},
    display::{DisplaySnapshot, DisplaySync},
    format::format_duration,
    history::HistoryFilter,
    log_form::{LogForm, MAX_PAIN},
    notifier::CompletionNotifier,
    plan::{add_row, delete_row, edit_row, move_row, unique_workouts, Direction, PlanField, PlanRow},
    session::SessionRecord,
    store::{Store, StoreError},
    timers::CardId,
};

const DURATION_STEP_SEC: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum AppState {
    Log,
    History,
    Plan,
    Settings,
}

impl AppState {
    pub const ALL: [AppState; 4] = [AppState::Log, AppState::History, AppState::Plan, AppState::Settings];

    fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Which value a line editor is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Rep(usize),
    SetsDone,
    RestMin,
    Comment,
    SessionComment,
    Date,
    Search,
    PlanCell(PlanField),
    NewPlanRow,
}

impl Field {
    pub fn label(&self) -> String {
        match self {
            Field::Rep(i) => format!("Reps set {}", i + 1),
            Field::SetsDone => "Sets done".into(),
            Field::RestMin => "Rest (min)".into(),
            Field::Comment => "Exercise comment".into(),
            Field::SessionComment => "Session comment".into(),
            Field::Date => "Date (YYYY-MM-DD)".into(),
            Field::Search => "Search".into(),
            Field::PlanCell(field) => format!("Plan {field}"),
            Field::NewPlanRow => "New exercise".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editor {
    pub field: Field,
    pub buffer: String,
}

/// Destructive action waiting for a `y`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    ClearForm,
    DeleteSession(String),
    DeleteAllSessions,
    DeletePlanRow(String),
    ResetPlan,
}

impl Pending {
    pub fn prompt(&self) -> &'static str {
        match self {
            Pending::ClearForm => "Clear the form and all timers? (y/n)",
            Pending::DeleteSession(_) => "Delete this session? (y/n)",
            Pending::DeleteAllSessions => "Delete ALL sessions? This cannot be undone. (y/n)",
            Pending::DeletePlanRow(_) => "Delete this plan row? (y/n)",
            Pending::ResetPlan => "Reset the plan to defaults? (y/n)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub state: AppState,
    pub form: LogForm,
    pub plan: Vec<PlanRow>,
    pub workouts: Vec<String>,
    pub selected_card: usize,
    pub editor: Option<Editor>,
    pub pending: Option<Pending>,
    pub status: Option<String>,
    pub sessions: Vec<SessionRecord>,
    pub filter: HistoryFilter,
    pub history_selected: usize,
    pub plan_selected: usize,
    pub settings: NotificationSettings,
    pub notifier: CompletionNotifier,
    pub display: DisplaySync,
    pub backup: Option<LocalBackup>,
    store: Store,
    settings_store: Box<dyn SettingsStore>,
    clock: Box<dyn Clock>,
}

impl App {
    pub fn new(
        mut store: Store,
        settings_store: Box<dyn SettingsStore>,
        backup: Option<LocalBackup>,
        notifier: CompletionNotifier,
        clock: Box<dyn Clock>,
    ) -> Result<Self, StoreError> {
        store.ensure_default_plan()?;
        let plan = store.plan_rows()?;
        let sessions = store.sessions()?;
        let settings = settings_store.load();

        let mut app = Self {
            state: AppState::Log,
            form: LogForm::new(),
            workouts: unique_workouts(&plan),
            plan,
            selected_card: 0,
            editor: None,
            pending: None,
            status: None,
            sessions,
            filter: HistoryFilter::default(),
            history_selected: 0,
            plan_selected: 0,
            settings,
            notifier,
            display: DisplaySync::new(),
            backup,
            store,
            settings_store,
            clock,
        };
        if let Some(first) = app.workouts.first().cloned() {
            app.select_workout(&first);
        }
        Ok(app)
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        self.display.snapshot(&self.form, &self.notifier, self.now())
    }

    pub fn filtered_sessions(&self) -> Vec<&SessionRecord> {
        self.filter.apply(&self.sessions)
    }

    fn selected_card_id(&self) -> Option<CardId> {
        self.form.cards().get(self.selected_card).map(|c| c.id)
    }

    /// Drive scheduled work. Returns true when the screen should be redrawn.
    pub fn on_tick(&mut self) -> bool {
        let now = self.now();
        if let Some(done) = self.form.poll(now) {
            let name = self
                .form
                .card(done.exercise)
                .map(|c| c.exercise.clone())
                .unwrap_or_default();
            let outcome = self.notifier.notify(&self.settings, now);
            info!(exercise = %name, ?outcome, "rest finished");
            self.status = Some(format!("Rest over: {name}"));
            self.display.wake();
        }
        self.display.should_tick(&self.form, &self.notifier, now)
    }

    /// Handle a key, then run any scheduled work that came due meanwhile
    pub fn on_input(&mut self, key: KeyEvent) -> Flow {
        let flow = self.on_key(key);
        if flow == Flow::Continue {
            self.on_tick();
        }
        flow
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        if self.editor.is_some() {
            self.on_editor_key(key);
            return Flow::Continue;
        }
        if let Some(pending) = self.pending.take() {
            if key.code == KeyCode::Char('y') {
                self.confirm(pending);
            } else {
                self.status = Some("Cancelled".into());
            }
            return Flow::Continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Tab => self.state = self.state.next(),
            KeyCode::BackTab => self.state = self.state.prev(),
            _ => match self.state {
                AppState::Log => self.on_log_key(key),
                AppState::History => self.on_history_key(key),
                AppState::Plan => self.on_plan_key(key),
                AppState::Settings => self.on_settings_key(key),
            },
        }
        Flow::Continue
    }

    fn open_editor(&mut self, field: Field, initial: String) {
        self.editor = Some(Editor {
            field,
            buffer: initial,
        });
    }

    fn on_editor_key(&mut self, key: KeyEvent) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.editor = None,
            KeyCode::Enter => {
                if let Some(editor) = self.editor.take() {
                    self.commit_edit(editor);
                }
            }
            KeyCode::Backspace => {
                editor.buffer.pop();
            }
            KeyCode::Char(c) => editor.buffer.push(c),
            _ => {}
        }
    }

    fn commit_edit(&mut self, editor: Editor) {
        let now = self.now();
        let text = editor.buffer.trim();

        if editor.field == Field::Search {
            self.filter.query = text.to_string();
            self.history_selected = 0;
            return;
        }
        if editor.field == Field::SessionComment {
            self.form.comment = text.to_string();
            return;
        }
        if let Field::PlanCell(field) = editor.field {
            self.edit_plan_row(field, text);
            return;
        }
        if editor.field == Field::NewPlanRow {
            self.add_plan_row(text);
            return;
        }
        if editor.field == Field::Date {
            match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                Ok(date) => self.form.date = date.format("%Y-%m-%d").to_string(),
                Err(_) => self.status = Some(format!("Not a date: {text}")),
            }
            return;
        }

        let Some(id) = self.selected_card_id() else {
            return;
        };
        match editor.field {
            Field::Rep(set) => match parse_optional::<u32>(text) {
                Ok(reps) => {
                    self.form.set_rep(id, set, reps, now);
                    self.display.wake();
                }
                Err(()) => self.status = Some(format!("Not a rep count: {text}")),
            },
            Field::SetsDone => match parse_optional::<u32>(text) {
                Ok(done) => self.form.set_sets_done(id, done),
                Err(()) => self.status = Some(format!("Not a set count: {text}")),
            },
            Field::RestMin => match parse_optional::<f64>(text) {
                Ok(rest) if rest.map_or(true, |r| r >= 0.0) => self.form.set_rest_min(id, rest),
                _ => self.status = Some(format!("Not a rest time: {text}")),
            },
            Field::Comment => self.form.set_comment(id, text),
            Field::SessionComment | Field::Date | Field::Search | Field::PlanCell(_) | Field::NewPlanRow => {}
        }
    }

    pub fn select_workout(&mut self, workout: &str) {
        let now = self.now();
        self.form.load_workout(&self.plan, workout, now);
        self.selected_card = 0;
    }

    fn cycle_workout(&mut self, forward: bool) {
        if self.workouts.is_empty() {
            return;
        }
        let len = self.workouts.len();
        let next = match self.form.workout().and_then(|w| self.workouts.iter().position(|x| x == w)) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        let workout = self.workouts[next].clone();
        self.select_workout(&workout);
    }

    fn on_log_key(&mut self, key: KeyEvent) {
        let now = self.now();
        let card_count = self.form.cards().len();
        let selected = self.selected_card_id();

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.selected_card = self.selected_card.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_card = (self.selected_card + 1).min(card_count.saturating_sub(1));
            }
            KeyCode::Char('w') | KeyCode::Char(']') => self.cycle_workout(true),
            KeyCode::Char('W') | KeyCode::Char('[') => self.cycle_workout(false),
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => self.save_session(),
            KeyCode::Char('S') => self.save_session(),
            KeyCode::Char('X') => self.pending = Some(Pending::ClearForm),
            KeyCode::Char('n') => self.open_editor(Field::SessionComment, self.form.comment.clone()),
            KeyCode::Char('t') => self.open_editor(Field::Date, self.form.date.clone()),
            KeyCode::Char('e') => {
                self.form.stop_rest(now);
                self.display.wake();
            }
            KeyCode::Char('b') => self.notifier.dismiss_banner(),
            _ => {
                let Some(id) = selected else {
                    return;
                };
                self.on_card_key(key, id, now);
            }
        }
    }

    fn on_card_key(&mut self, key: KeyEvent, id: CardId, now: u64) {
        let Some(card) = self.form.card(id).cloned() else {
            return;
        };
        match key.code {
            KeyCode::Char('s') => {
                self.form.start_timer(id, now);
                self.display.wake();
            }
            KeyCode::Char('p') => {
                self.form.stop_timer(id, now);
                self.display.wake();
            }
            KeyCode::Char('r') => {
                self.form.reset_timer(id);
                self.display.wake();
            }
            KeyCode::Char(c @ '1'..='9') => {
                let set = c as usize - '1' as usize;
                if set < card.sets_planned() {
                    let current = card.reps[set].map(|r| r.to_string()).unwrap_or_default();
                    self.open_editor(Field::Rep(set), current);
                }
            }
            KeyCode::Char('d') => {
                let current = card.sets_done_override.map(|d| d.to_string()).unwrap_or_default();
                self.open_editor(Field::SetsDone, current);
            }
            KeyCode::Char('m') => {
                let current = card.rest_min().map(|r| r.to_string()).unwrap_or_default();
                self.open_editor(Field::RestMin, current);
            }
            KeyCode::Char('c') => self.open_editor(Field::Comment, card.comment.clone()),
            KeyCode::Char('+') | KeyCode::Char('=') => self.form.set_pain(id, (card.pain + 1).min(MAX_PAIN)),
            KeyCode::Char('-') => self.form.set_pain(id, card.pain.saturating_sub(1)),
            _ => {}
        }
    }

    pub fn save_session(&mut self) {
        let now = self.now();
        let record = match self.form.build_session(now) {
            Ok(record) => record,
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        };
        if let Err(e) = self.store.put_session(&record) {
            warn!("saving session failed: {e}");
            self.status = Some(format!("Save failed: {e}"));
            return;
        }
        let total = record.total_time_ms.map(format_duration).unwrap_or_default();
        self.form.clear(now);
        self.sessions_changed();
        self.status = Some(format!("Saved ✓ total {total}"));
    }

    fn sessions_changed(&mut self) {
        match self.store.sessions() {
            Ok(sessions) => self.sessions = sessions,
            Err(e) => warn!("reloading sessions failed: {e}"),
        }
        self.history_selected = self.history_selected.min(self.sessions.len().saturating_sub(1));
        self.refresh_backup();
    }

    fn refresh_backup(&mut self) {
        if let Some(backup) = &self.backup {
            if !backup.refresh(&self.store) {
                self.status = Some("Local backup failed".into());
            }
        }
    }

    fn plan_changed(&mut self) {
        if let Err(e) = self.store.replace_plan(&self.plan) {
            warn!("saving plan failed: {e}");
            self.status = Some(format!("Plan save failed: {e}"));
        }
        match self.store.plan_rows() {
            Ok(plan) => self.plan = plan,
            Err(e) => warn!("reloading plan failed: {e}"),
        }
        self.workouts = unique_workouts(&self.plan);
        self.refresh_backup();
    }

    fn select_plan_row(&mut self, id: &str) {
        let pos = self.plan.iter().position(|r| r.id == id);
        self.plan_selected = pos.unwrap_or(self.plan_selected).min(self.plan.len().saturating_sub(1));
    }

    fn edit_plan_row(&mut self, field: PlanField, text: &str) {
        let Some(id) = self.plan.get(self.plan_selected).map(|r| r.id.clone()) else {
            return;
        };
        match edit_row(&mut self.plan, &id, field, text) {
            Ok(()) => {
                self.status = Some(format!("{field} saved ✓"));
                self.plan_changed();
                self.select_plan_row(&id);
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn add_plan_row(&mut self, exercise: &str) {
        let workout = self
            .plan
            .get(self.plan_selected)
            .map(|r| r.workout.clone())
            .or_else(|| self.workouts.first().cloned())
            .unwrap_or_default();
        match add_row(&mut self.plan, &workout, exercise) {
            Ok(id) => {
                self.status = Some(format!("Added {exercise} ✓"));
                self.plan_changed();
                self.select_plan_row(&id);
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn confirm(&mut self, pending: Pending) {
        let now = self.now();
        match pending {
            Pending::ClearForm => {
                self.form.clear(now);
                self.status = Some("Cleared".into());
            }
            Pending::DeleteSession(id) => {
                match self.store.delete_session(&id) {
                    Ok(_) => self.status = Some("Deleted".into()),
                    Err(e) => self.status = Some(format!("Delete failed: {e}")),
                }
                self.sessions_changed();
            }
            Pending::DeleteAllSessions => {
                match self.store.delete_all_sessions() {
                    Ok(n) => self.status = Some(format!("Deleted {n} sessions")),
                    Err(e) => self.status = Some(format!("Delete failed: {e}")),
                }
                self.sessions_changed();
            }
            Pending::DeletePlanRow(id) => {
                if delete_row(&mut self.plan, &id) {
                    self.status = Some("Plan row deleted".into());
                    self.plan_changed();
                }
                self.select_plan_row(&id);
            }
            Pending::ResetPlan => {
                match self.store.reset_plan_to_defaults() {
                    Ok(()) => self.status = Some("Plan reset to defaults".into()),
                    Err(e) => self.status = Some(format!("Reset failed: {e}")),
                }
                if let Ok(plan) = self.store.plan_rows() {
                    self.plan = plan;
                }
                self.workouts = unique_workouts(&self.plan);
                self.plan_selected = 0;
                self.refresh_backup();
            }
        }
    }

    fn on_history_key(&mut self, key: KeyEvent) {
        let count = self.filtered_sessions().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.history_selected = self.history_selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.history_selected = (self.history_selected + 1).min(count.saturating_sub(1));
            }
            KeyCode::Char('/') => self.open_editor(Field::Search, self.filter.query.clone()),
            KeyCode::Char('w') => {
                let next = match &self.filter.workout {
                    None => self.workouts.first().cloned(),
                    Some(w) => self
                        .workouts
                        .iter()
                        .position(|x| x == w)
                        .and_then(|i| self.workouts.get(i + 1))
                        .cloned(),
                };
                self.filter.workout = next;
                self.history_selected = 0;
            }
            KeyCode::Char('d') => {
                if let Some(s) = self.filtered_sessions().get(self.history_selected) {
                    self.pending = Some(Pending::DeleteSession(s.id.clone()));
                }
            }
            KeyCode::Char('D') => self.pending = Some(Pending::DeleteAllSessions),
            _ => {}
        }
    }

    fn on_plan_key(&mut self, key: KeyEvent) {
        let count = self.plan.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.plan_selected = self.plan_selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.plan_selected = (self.plan_selected + 1).min(count.saturating_sub(1));
            }
            KeyCode::Char('K') | KeyCode::Char('J') => {
                let Some(id) = self.plan.get(self.plan_selected).map(|r| r.id.clone()) else {
                    return;
                };
                let direction = if key.code == KeyCode::Char('K') { Direction::Up } else { Direction::Down };
                if move_row(&mut self.plan, &id, direction) {
                    self.plan_changed();
                    if let Some(pos) = self.plan.iter().position(|r| r.id == id) {
                        self.plan_selected = pos;
                    }
                }
            }
            KeyCode::Char('R') => self.pending = Some(Pending::ResetPlan),
            KeyCode::Char('a') => self.open_editor(Field::NewPlanRow, String::new()),
            KeyCode::Char('x') => {
                if let Some(row) = self.plan.get(self.plan_selected) {
                    self.pending = Some(Pending::DeletePlanRow(row.id.clone()));
                }
            }
            KeyCode::Char(c) => {
                let field = match c {
                    'n' => PlanField::Exercise,
                    'o' => PlanField::Workout,
                    's' => PlanField::Sets,
                    'l' => PlanField::RepLow,
                    'h' => PlanField::RepHigh,
                    't' => PlanField::Type,
                    'm' => PlanField::RestMin,
                    _ => return,
                };
                if let Some(row) = self.plan.get(self.plan_selected) {
                    let current = row.field_text(field);
                    self.open_editor(Field::PlanCell(field), current);
                }
            }
            _ => {}
        }
    }

    fn on_settings_key(&mut self, key: KeyEvent) {
        let mut settings = self.settings.clone();
        match key.code {
            KeyCode::Char('m') => {
                settings.completion_mode = match settings.completion_mode {
                    CompletionMode::Sound => CompletionMode::Vibrate,
                    CompletionMode::Vibrate => CompletionMode::Both,
                    CompletionMode::Both => CompletionMode::Banner,
                    CompletionMode::Banner => CompletionMode::Sound,
                };
            }
            KeyCode::Char('+') | KeyCode::Char('=') => settings.completion_duration_sec += DURATION_STEP_SEC,
            KeyCode::Char('-') => {
                settings.completion_duration_sec = (settings.completion_duration_sec - DURATION_STEP_SEC).max(0.0);
            }
            KeyCode::Char('t') => {
                let now = self.now();
                self.notifier.notify(&self.settings, now);
                self.display.wake();
                return;
            }
            _ => return,
        }
        self.settings = settings;
        match self.settings_store.save(&self.settings) {
            Ok(()) => self.status = Some("Settings saved ✓".into()),
            Err(e) => self.status = Some(format!("Settings save failed: {e}")),
        }
    }
}

/// Empty input clears the value
fn parse_optional<T: std::str::FromStr>(text: &str) -> Result<Option<T>, ()> {
    if text.is_empty() {
        return Ok(None);
    }
    text.parse().map(Some).map_err(|_| ())
}
