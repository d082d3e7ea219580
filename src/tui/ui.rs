use ratatui::{
    prelude::*,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthChar;

use super::console::Console;
use crate::core::logs::{DisplayRecord, RecordKind};

/// Draw the message panel above a three-line input box.
pub fn render(frame: &mut Frame, console: &Console) {
    let [messages_area, input_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).areas(frame.area());

    render_messages(frame, messages_area, console);
    render_input(frame, input_area, console.input());
}

fn render_messages(frame: &mut Frame, area: Rect, console: &Console) {
    let height = area.height.saturating_sub(2) as usize;
    let snapshot = console.snapshot(height);

    let lines: Vec<Line> = snapshot.records.iter().map(record_line).collect();

    let title = if snapshot.auto_scroll {
        " Messages [Auto] ".to_string()
    } else {
        format!(" Messages [{}/{}] ", snapshot.offset, snapshot.total)
    };

    let block = Block::default().borders(Borders::ALL).title(title);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn record_line(record: &DisplayRecord) -> Line<'static> {
    let style = match record.kind() {
        RecordKind::Received => Style::default(),
        RecordKind::Sent => Style::default().fg(Color::Cyan),
        RecordKind::Info => Style::default().fg(Color::Yellow),
        RecordKind::Error => Style::default().fg(Color::Red),
    };
    Line::from(vec![
        Span::styled(
            record.when().format("%H:%M:%S%.3f").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(single_line(record.text()), style),
    ])
}

/// Flatten device text onto one row, with control characters replaced by
/// visible glyphs.
fn single_line(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\r' => None,
            '\n' => Some('⏎'),
            '\t' => Some(' '),
            '\x7f' => Some('␡'),
            c if (c as u32) < 0x20 => char::from_u32(0x2400 + c as u32),
            c if c.is_control() => Some(char::REPLACEMENT_CHARACTER),
            c => Some(c),
        })
        .collect()
}

fn render_input(frame: &mut Frame, area: Rect, input: &str) {
    let width = area.width.saturating_sub(3) as usize;
    let visible = visible_tail(input, width);

    let block = Block::default().borders(Borders::ALL).title(" Send ");
    frame.render_widget(Paragraph::new(visible).block(block), area);

    let cursor_x = area.x + 1 + display_width(visible) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
}

/// Longest suffix of `text` that fits in `width` columns.
fn visible_tail(text: &str, width: usize) -> &str {
    let mut used = 0;
    for (idx, c) in text.char_indices().rev() {
        used += c.width().unwrap_or(0);
        if used > width {
            return &text[idx + c.len_utf8()..];
        }
    }
    text
}

fn display_width(text: &str) -> usize {
    text.chars().map(|c| c.width().unwrap_or(0)).sum()
}
