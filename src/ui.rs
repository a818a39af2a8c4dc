pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Widget},
    Frame,
};

use crate::app::{App, AppState};
use screen::current_screen;

const HORIZONTAL_MARGIN: u16 = 1;
const BANNER_WIDTH: u16 = 30;
const BANNER_HEIGHT: u16 = 3;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snapshot = self.snapshot();
        let screen = current_screen(self.state);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        let titles: Vec<String> = AppState::ALL.iter().map(|s| s.to_string()).collect();
        let selected = AppState::ALL.iter().position(|s| *s == self.state).unwrap_or(0);
        Tabs::new(titles)
            .select(selected)
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .render(chunks[0], buf);

        screen.render(self, &snapshot, chunks[1], buf);

        status_line(self).render(chunks[2], buf);

        Paragraph::new(Span::styled(
            screen.hints(),
            Style::default().add_modifier(Modifier::DIM),
        ))
        .render(chunks[3], buf);

        if snapshot.banner {
            render_banner(area, buf);
        }
    }
}

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn status_line(app: &App) -> Paragraph<'static> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    if let Some(editor) = &app.editor {
        return Paragraph::new(Line::from(vec![
            Span::styled(format!("{}: ", editor.field.label()), bold_style.fg(Color::Cyan)),
            Span::raw(editor.buffer.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]));
    }
    if let Some(pending) = &app.pending {
        return Paragraph::new(Span::styled(pending.prompt(), bold_style.fg(Color::Red)));
    }
    Paragraph::new(Span::styled(
        app.status.clone().unwrap_or_default(),
        Style::default().fg(Color::Yellow),
    ))
}

fn render_banner(area: Rect, buf: &mut Buffer) {
    let width = BANNER_WIDTH.min(area.width);
    let height = BANNER_HEIGHT.min(area.height);
    let banner_area = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );
    Clear.render(banner_area, buf);
    Paragraph::new(Span::styled(
        "REST OVER",
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::Yellow)),
    )
    .render(banner_area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{press, test_app, type_text};
    use crossterm::event::KeyCode;
    use liftlog::clock::ManualClock;
    use liftlog::config::{CompletionMode, NotificationSettings};

    fn render(app: &App, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);

        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_log_screen_shows_cards_and_totals() {
        let clock = ManualClock::new(0);
        let (mut app, _) = test_app(&clock);
        press(&mut app, KeyCode::Char('s'));
        clock.advance(61_000);

        let content = render(&app, 100, 30);
        assert!(content.contains("Workout 1 – Full Body"));
        assert!(content.contains("Pull-up"));
        assert!(content.contains("5 × 2"));
        assert!(content.contains("1:01"));
        assert!(content.contains("Session 1:01"));
    }

    #[test]
    fn test_log_screen_shows_rest_countdown() {
        let clock = ManualClock::new(0);
        let (mut app, _) = test_app(&clock);
        press(&mut app, KeyCode::Char('1'));
        type_text(&mut app, "2");
        press(&mut app, KeyCode::Enter);
        clock.advance(30_000);

        let content = render(&app, 100, 30);
        assert!(content.contains("Resting after Pull-up: 4:30 left"));
    }

    #[test]
    fn test_editor_prompt_is_rendered() {
        let clock = ManualClock::new(0);
        let (mut app, _) = test_app(&clock);
        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "sore");

        let content = render(&app, 100, 30);
        assert!(content.contains("Exercise comment: sore"));
    }

    #[test]
    fn test_banner_overlay() {
        let clock = ManualClock::new(0);
        let (mut app, _) = test_app(&clock);
        app.settings = NotificationSettings {
            completion_duration_sec: 1.0,
            completion_mode: CompletionMode::Banner,
        };
        app.state = AppState::Settings;
        press(&mut app, KeyCode::Char('t'));

        assert!(render(&app, 80, 24).contains("REST OVER"));
        clock.advance(1_000);
        assert!(!render(&app, 80, 24).contains("REST OVER"));
    }

    #[test]
    fn test_history_screen_lists_sessions() {
        let clock = ManualClock::new(0);
        let (mut app, _) = test_app(&clock);
        press(&mut app, KeyCode::Char('1'));
        type_text(&mut app, "3");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('S'));
        press(&mut app, KeyCode::Tab);

        let content = render(&app, 100, 30);
        assert!(content.contains("Sessions 1"));
        assert!(content.contains("3/—/—/—/—"));
    }

    #[test]
    fn test_plan_and_settings_screens() {
        let clock = ManualClock::new(0);
        let (mut app, _) = test_app(&clock);

        app.state = AppState::Plan;
        let plan = render(&app, 100, 40);
        assert!(plan.contains("Workout 2 – Upper Body"));
        assert!(plan.contains("TRX Row"));

        app.state = AppState::Settings;
        let settings = render(&app, 100, 30);
        assert!(settings.contains("Completion mode: both"));
        assert!(settings.contains("2.0 s"));
    }

    #[test]
    fn test_render_tiny_area_does_not_panic() {
        let clock = ManualClock::new(0);
        let (app, _) = test_app(&clock);
        render(&app, 10, 4);
        render(&app, 1, 1);
    }
}
