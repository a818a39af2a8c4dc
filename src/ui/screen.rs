use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use unicode_width::UnicodeWidthStr;

use liftlog::{
    backup::BackupStatus,
    display::DisplaySnapshot,
    history::{kpis, reps_to_string, PainLevel},
    log_form::ExerciseCard,
};

use crate::app::{App, AppState};

const LINES_PER_CARD: u16 = 2;

/// A UI Screen boundary: one tab of the app
pub trait Screen {
    fn render(&self, app: &App, snapshot: &DisplaySnapshot, area: Rect, buf: &mut Buffer);

    /// Key help shown in the footer
    fn hints(&self) -> &'static str;
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn enabled_style(enabled: bool) -> Style {
    if enabled {
        Style::default().fg(Color::Cyan)
    } else {
        dim()
    }
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "—".to_string(), |v| v.to_string())
}

/// Left-align to a display width
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

/// Logging form with the live timers
pub struct LogScreen;

impl LogScreen {
    fn card_lines(card: &ExerciseCard, view: &liftlog::display::CardView, selected: bool) -> [Line<'static>; 2] {
        let marker = if selected { "▶ " } else { "  " };
        let name_style = if selected { bold().fg(Color::Cyan) } else { bold() };
        let elapsed_style = if view.running {
            bold().fg(Color::Green)
        } else {
            Style::default()
        };

        let header = Line::from(vec![
            Span::raw(marker),
            Span::styled(card.exercise.clone(), name_style),
            Span::styled(format!("  {}  ", card.target), dim()),
            Span::styled(format!("time {}", view.elapsed), elapsed_style),
            Span::raw("  "),
            Span::styled("[s]tart ", enabled_style(view.start_enabled)),
            Span::styled("[p]ause ", enabled_style(view.stop_enabled)),
            Span::styled("[r]eset", enabled_style(view.reset_enabled)),
        ]);

        let reps = card
            .reps
            .iter()
            .map(|r| or_dash(*r))
            .collect::<Vec<_>>()
            .join(" ");
        let mut detail = vec![
            Span::raw("    reps "),
            Span::styled(reps, bold()),
            Span::raw(format!(
                " · done {} · rest {} min · pain {}",
                or_dash(card.sets_done()),
                or_dash(card.rest_min()),
                card.pain
            )),
        ];
        if !card.comment.is_empty() {
            detail.push(Span::styled(
                format!(" · {}", card.comment),
                Style::default().add_modifier(Modifier::ITALIC),
            ));
        }
        [header, Line::from(detail)]
    }
}

impl Screen for LogScreen {
    fn render(&self, app: &App, snapshot: &DisplaySnapshot, area: Rect, buf: &mut Buffer) {
        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    format!("{} · {}", app.form.date, app.form.workout().unwrap_or("no workout")),
                    bold(),
                ),
                Span::raw(format!(
                    "   Session {} · Rest {}",
                    snapshot.session_total, snapshot.rest_total
                )),
            ]),
            match &snapshot.rest {
                Some(rest) => Line::from(Span::styled(
                    format!("Resting after {}: {} left", rest.exercise_name, rest.remaining),
                    bold().fg(Color::Yellow),
                )),
                None => Line::from(Span::styled("No rest countdown", dim())),
            },
        ];
        if !app.form.comment.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("Note: {}", app.form.comment),
                Style::default().add_modifier(Modifier::ITALIC),
            )));
        }
        lines.push(Line::default());

        let header_lines = lines.len() as u16;
        let visible = (area.height.saturating_sub(header_lines) / LINES_PER_CARD).max(1) as usize;
        let offset = (app.selected_card + 1).saturating_sub(visible);

        for (idx, (card, view)) in app
            .form
            .cards()
            .iter()
            .zip(snapshot.cards.iter())
            .enumerate()
            .skip(offset)
            .take(visible)
        {
            lines.extend(Self::card_lines(card, view, idx == app.selected_card));
        }

        Paragraph::new(lines).render(area, buf);
    }

    fn hints(&self) -> &'static str {
        "↑↓ select · w workout · s/p/r timer · 1-9 reps · d sets · m rest · +/- pain · c note · e end rest · S save · X clear · q quit"
    }
}

/// Saved sessions with KPIs and filters
pub struct HistoryScreen;

impl Screen for HistoryScreen {
    fn render(&self, app: &App, _snapshot: &DisplaySnapshot, area: Rect, buf: &mut Buffer) {
        let sessions = app.filtered_sessions();
        let k = kpis(&app.sessions);

        let mut lines = vec![
            Line::from(Span::styled(
                format!(
                    "Sessions {} · Workouts {} · Last {} · Avg pain {}",
                    k.sessions,
                    k.workouts,
                    or_dash(k.last_date),
                    k.avg_pain.map_or_else(|| "—".to_string(), |p| format!("{p:.2}"))
                ),
                bold(),
            )),
            Line::from(Span::styled(
                format!(
                    "Filter: {} · Search: {}",
                    app.filter.workout.as_deref().unwrap_or("all workouts"),
                    if app.filter.query.is_empty() { "—" } else { app.filter.query.as_str() }
                ),
                dim(),
            )),
            Line::default(),
        ];

        if sessions.is_empty() {
            lines.push(Line::from(Span::styled("No sessions yet.", dim())));
        }

        for (idx, session) in sessions.iter().enumerate().skip(app.history_selected) {
            let pain = session.max_pain();
            let pain_color = match PainLevel::from_max(pain) {
                PainLevel::Ok => Color::Green,
                PainLevel::Warn => Color::Yellow,
                PainLevel::Danger => Color::Red,
            };
            let header_style = if idx == app.history_selected {
                bold().fg(Color::Cyan)
            } else {
                bold()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{} · {}", session.date_iso, session.workout), header_style),
                Span::styled(format!("  pain max {pain}"), Style::default().fg(pain_color)),
                Span::styled(
                    format!(
                        "  total {}",
                        session
                            .total_time_ms
                            .map_or_else(|| "—".to_string(), liftlog::format::format_duration)
                    ),
                    dim(),
                ),
            ]));
            if !session.comment.is_empty() {
                lines.push(Line::from(Span::styled(format!("  {}", session.comment), dim())));
            }
            for item in session.items.iter().filter(|it| !it.exercise.is_empty()) {
                let mut text = format!(
                    "    {} ({}) · sets {} · reps {} · rest {} · pain {}",
                    item.exercise,
                    item.target,
                    or_dash(item.sets_done),
                    reps_to_string(&item.reps_by_set),
                    or_dash(item.rest_min),
                    item.pain_0_to_5
                );
                if !item.comment.is_empty() {
                    text.push_str(&format!(" · {}", item.comment));
                }
                lines.push(Line::from(text));
            }
            lines.push(Line::default());
        }

        Paragraph::new(lines).render(area, buf);
    }

    fn hints(&self) -> &'static str {
        "↑↓ select · w filter workout · / search · d delete · D delete all · Tab next · q quit"
    }
}

/// Exercise configuration per workout
pub struct PlanScreen;

impl Screen for PlanScreen {
    fn render(&self, app: &App, _snapshot: &DisplaySnapshot, area: Rect, buf: &mut Buffer) {
        let mut lines: Vec<Line> = Vec::new();
        let mut selected_line = 0u16;
        let mut current_workout: Option<&str> = None;

        for (idx, row) in app.plan.iter().enumerate() {
            if current_workout != Some(row.workout.as_str()) {
                if current_workout.is_some() {
                    lines.push(Line::default());
                }
                lines.push(Line::from(Span::styled(row.workout.clone(), bold().fg(Color::Magenta))));
                current_workout = Some(row.workout.as_str());
            }
            if idx == app.plan_selected {
                selected_line = lines.len() as u16;
            }
            let style = if idx == app.plan_selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!(
                    "  {:>2}. {} {} {} rest {} min",
                    or_dash(row.sort_order),
                    pad(&row.exercise, 24),
                    pad(&row.target(), 10),
                    pad(&row.kind.to_string(), 10),
                    or_dash(row.rest_min)
                ),
                style,
            )));
        }

        let scroll = (selected_line + 1).saturating_sub(area.height);
        Paragraph::new(lines).scroll((scroll, 0)).render(area, buf);
    }

    fn hints(&self) -> &'static str {
        "↑↓ select · a add · x delete · n name · o workout · s sets · l/h reps · t type · m rest · K/J move · R reset"
    }
}

/// Notification settings and backup status
pub struct SettingsScreen;

impl Screen for SettingsScreen {
    fn render(&self, app: &App, _snapshot: &DisplaySnapshot, area: Rect, buf: &mut Buffer) {
        let backup = match app.backup.as_ref().map(|b| b.status()) {
            None => "disabled".to_string(),
            Some(BackupStatus::Missing) => "no backup yet".to_string(),
            Some(BackupStatus::Corrupt) => "backup unreadable".to_string(),
            Some(BackupStatus::SavedAt(Some(at))) => format!("last backup {}", at.format("%Y-%m-%d %H:%M")),
            Some(BackupStatus::SavedAt(None)) => "backup saved".to_string(),
        };

        let lines = vec![
            Line::from(Span::styled("Rest completion", bold())),
            Line::from(format!("  Completion mode: {}", app.settings.completion_mode)),
            Line::from(format!(
                "  Duration: {:.1} s{}",
                app.settings.completion_duration_sec,
                if app.settings.completion_duration_ms().is_none() {
                    " (off)"
                } else {
                    ""
                }
            )),
            Line::default(),
            Line::from(Span::styled("Data", bold())),
            Line::from(format!("  {} sessions · {} plan rows", app.sessions.len(), app.plan.len())),
            Line::from(format!("  Local backup: {backup}")),
        ];

        Paragraph::new(lines).wrap(Wrap { trim: false }).render(area, buf);
    }

    fn hints(&self) -> &'static str {
        "m cycle mode · +/- duration · t test notification · Tab next · q quit"
    }
}

/// Helper to construct the screen for the current state
pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Log => Box::new(LogScreen),
        AppState::History => Box::new(HistoryScreen),
        AppState::Plan => Box::new(PlanScreen),
        AppState::Settings => Box::new(SettingsScreen),
    }
}
