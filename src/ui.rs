use crate::menu::{self, MenuView};
use crate::session::PlayerView;
use crate::text;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::time::Duration;

const PAUSED_BADGE: &str = "[PAUSED]";
const LOCKED_BADGE: &str = "[LOCKED]";
const PROGRESS_BAR_MAX: usize = 30;
const MIN_PROGRESS_BAR: usize = 5;

/// Left padding inside the border for content rows.
pub const CONTENT_X: u16 = 2;

/// Rows above the player's playlist: border, label, title, progress, rule.
pub const PLAYER_HEADER_ROWS: u16 = 5;

/// Player rows that are not playlist: header, footer, bottom border.
pub const PLAYER_CHROME_ROWS: u16 = PLAYER_HEADER_ROWS + 2;

/// Columns available to content rows in a `width`-column frame.
pub fn content_width(width: u16) -> usize {
    usize::from(width.saturating_sub(CONTENT_X * 2)).max(1)
}

pub fn player_viewport_height(rows: u16) -> usize {
    usize::from(rows.saturating_sub(PLAYER_CHROME_ROWS)).max(1)
}

pub fn draw_menu(frame: &mut Frame, view: &MenuView<'_>) {
    let area = frame.area();
    frame.render_widget(Block::default().borders(Borders::ALL), area);

    let (title_x, title) = menu::centered_line(view.title, area.width);
    put(
        frame,
        title_x,
        1,
        &title,
        Style::default().add_modifier(Modifier::BOLD),
    );
    rule(frame, 2);

    let height = usize::from(area.height.saturating_sub(menu::MENU_CHROME_ROWS));
    let item_width = content_width(area.width);
    for (row, (idx, item)) in view
        .items
        .iter()
        .enumerate()
        .skip(view.offset)
        .take(height)
        .enumerate()
    {
        let style = if idx == view.selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        put(
            frame,
            CONTENT_X,
            3 + row as u16,
            &text::truncate(item, item_width),
            style,
        );
    }

    let (help_x, help) = menu::centered_line(view.help, area.width);
    put(
        frame,
        help_x,
        area.height.saturating_sub(2),
        &help,
        Style::default(),
    );
}

pub fn draw_player(frame: &mut Frame, view: &PlayerView) {
    let area = frame.area();
    frame.render_widget(Block::default().borders(Borders::ALL), area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let reversed = Style::default().add_modifier(Modifier::REVERSED);

    put(frame, CONTENT_X, 1, "Now Playing:", bold);
    put(frame, CONTENT_X, 2, &view.now_playing, Style::default());
    put(frame, CONTENT_X, 3, &view.progress, Style::default());
    if view.paused {
        put(frame, badge_x(PAUSED_BADGE, area.width), 1, PAUSED_BADGE, reversed);
    }
    if view.locked {
        put(frame, badge_x(LOCKED_BADGE, area.width), 2, LOCKED_BADGE, reversed);
    }
    rule(frame, 4);

    for (row, item) in view.rows.iter().enumerate() {
        let style = if item.selected {
            reversed
        } else {
            Style::default()
        };
        put(
            frame,
            CONTENT_X,
            PLAYER_HEADER_ROWS + row as u16,
            &item.text,
            style,
        );
    }

    let footer_y = area.height.saturating_sub(2);
    put(frame, CONTENT_X, footer_y, &view.volume, Style::default());
    let help_x = area
        .width
        .saturating_sub(text::display_width(&view.help) as u16 + CONTENT_X);
    put(frame, help_x, footer_y, &view.help, Style::default());
}

pub fn draw_message(frame: &mut Frame, message: &str) {
    let area = frame.area();
    let max_message = usize::from(area.width.saturating_sub(8)).max(1);
    let message = text::truncate(message, max_message);

    let box_width = (text::display_width(&message) as u16 + 4)
        .max(10)
        .min(area.width);
    let box_height = 5_u16.min(area.height);
    let popup = Rect {
        x: area.x + (area.width - box_width) / 2,
        y: area.y + (area.height - box_height) / 2,
        width: box_width,
        height: box_height,
    };

    frame.render_widget(Clear, popup);
    frame.render_widget(Block::default().borders(Borders::ALL), popup);
    put(frame, popup.x + 2, popup.y + 2, &message, Style::default());
}

fn badge_x(badge: &str, width: u16) -> u16 {
    width
        .saturating_sub(text::display_width(badge) as u16 + CONTENT_X)
        .max(CONTENT_X)
}

fn rule(frame: &mut Frame, y: u16) {
    let width = frame.area().width.saturating_sub(2);
    put(
        frame,
        1,
        y,
        &"─".repeat(usize::from(width)),
        Style::default(),
    );
}

/// Writes one line of text, clipped at the right border.
fn put(frame: &mut Frame, x: u16, y: u16, line: &str, style: Style) {
    let area = frame.area();
    let right = area.right().saturating_sub(1);
    if y >= area.bottom() || x >= right {
        return;
    }
    let width = right - x;
    let fitted = text::truncate(line, usize::from(width));
    frame.render_widget(
        Paragraph::new(Span::styled(fitted, style)),
        Rect::new(x, y, width, 1),
    );
}

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

fn progress_bar(ratio: f64, width: usize) -> String {
    let clamped = ratio.clamp(0.0, 1.0);
    let filled = ((clamped * width as f64).floor() as usize).min(width);
    let mut bar = String::with_capacity(width * 3 + 2);
    bar.push('[');
    bar.push_str(&"█".repeat(filled));
    bar.push_str(&".".repeat(width - filled));
    bar.push(']');
    bar
}

/// `MM:SS / MM:SS` plus a bar when the duration is known and there is room.
pub fn progress_line(position: Duration, duration: Duration, width: u16) -> String {
    let clock = format!(
        "{} / {}",
        format_duration(position),
        format_duration(duration)
    );
    let bar_width = PROGRESS_BAR_MAX.min(
        usize::from(width).saturating_sub(text::display_width(&clock) + 10),
    );

    let line = if !duration.is_zero() && bar_width > MIN_PROGRESS_BAR {
        let ratio = position.as_secs_f64() / duration.as_secs_f64();
        format!("{clock} {}", progress_bar(ratio, bar_width))
    } else {
        clock
    };
    text::truncate(&line, content_width(width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuState;
    use crate::session::PlaylistRow;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn clock_uses_minutes_and_seconds() {
        assert_eq!(format_duration(Duration::from_secs(65)), "01:05");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "62:05");
    }

    #[test]
    fn progress_line_draws_bar_when_room() {
        let line = progress_line(Duration::from_secs(30), Duration::from_secs(60), 60);
        assert!(line.starts_with("00:30 / 01:00 ["));
        assert!(line.ends_with(']'));
        let filled = line.chars().filter(|ch| *ch == '█').count();
        let empty = line.chars().filter(|ch| *ch == '.').count();
        assert_eq!(filled, empty);
        assert!(text::display_width(&line) <= content_width(60));
    }

    #[test]
    fn progress_line_omits_bar_for_unknown_duration() {
        let line = progress_line(Duration::from_secs(3), Duration::ZERO, 80);
        assert_eq!(line, "00:03 / 00:00");
    }

    #[test]
    fn progress_line_omits_bar_when_narrow() {
        let line = progress_line(Duration::from_secs(3), Duration::from_secs(9), 28);
        assert_eq!(line, "00:03 / 00:09");
    }

    #[test]
    fn menu_highlights_selection_and_centers_title() {
        let mut menu = MenuState::new(vec![String::from("alpha"), String::from("beta")]);
        menu.select_next();
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).expect("terminal");

        terminal
            .draw(|frame| draw_menu(frame, &menu.view("Pick", "q: Back")))
            .expect("draw");

        assert_eq!(row_text(&terminal, 1).trim_matches(['│', ' ']), "Pick");
        assert!(row_text(&terminal, 3).contains("alpha"));
        let buffer = terminal.backend().buffer();
        assert_eq!(buffer[(18, 1)].symbol(), "P");
        assert!(buffer[(2, 4)].modifier.contains(Modifier::REVERSED));
        assert!(!buffer[(2, 3)].modifier.contains(Modifier::REVERSED));
        assert!(row_text(&terminal, 8).contains("q: Back"));
    }

    #[test]
    fn menu_draws_only_viewport_rows() {
        let items: Vec<String> = (0..20).map(|n| format!("row{n:02}")).collect();
        let mut menu = MenuState::new(items);
        menu.selected = 12;
        menu.scroll_into_view(MenuState::viewport_height(10));
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).expect("terminal");

        terminal
            .draw(|frame| draw_menu(frame, &menu.view("t", "h")))
            .expect("draw");

        assert!(row_text(&terminal, 3).contains("row08"));
        assert!(row_text(&terminal, 7).contains("row12"));
    }

    #[test]
    fn player_anchors_badges_to_right_edge() {
        let view = PlayerView {
            now_playing: String::from("song.mp3"),
            progress: String::from("00:01 / 00:10"),
            paused: true,
            locked: true,
            rows: vec![PlaylistRow {
                text: String::from("  > 1. song.mp3"),
                selected: true,
            }],
            volume: String::from("Volume: 50% (9/0)"),
            help: String::from("q: Exit"),
        };
        let mut terminal = Terminal::new(TestBackend::new(50, 12)).expect("terminal");

        terminal
            .draw(|frame| draw_player(frame, &view))
            .expect("draw");

        assert!(row_text(&terminal, 1).ends_with("[PAUSED] │"));
        assert!(row_text(&terminal, 2).ends_with("[LOCKED] │"));
        assert!(row_text(&terminal, 5).contains("1. song.mp3"));
        assert!(row_text(&terminal, 10).contains("Volume: 50%"));
        assert!(row_text(&terminal, 10).ends_with("q: Exit │"));
    }

    #[test]
    fn message_box_is_centered() {
        let mut terminal = Terminal::new(TestBackend::new(40, 11)).expect("terminal");
        terminal
            .draw(|frame| draw_message(frame, "Saved"))
            .expect("draw");
        assert!(row_text(&terminal, 5).contains("Saved"));
    }
}
