pub mod form;
pub mod style;
pub mod transcript;

use crate::app::App;
use crate::gateway::Backend;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Stylize},
    text::Line,
    widgets::{Block, BorderType, Paragraph, Widget},
};

pub const TITLE: &str = "Memory Systems Comparison";
pub const SUBTITLE: &str = "Compare Mem0 and Zep memory retrieval systems";

/// Text rows the error box may grow to before it clips.
const MAX_ERROR_ROWS: usize = 4;

/// Rows `text` takes when word-wrapped to `width` columns.
pub fn wrapped_rows(text: &str, width: u16) -> usize {
    let width = usize::from(width.max(1));
    let mut rows = 1;
    let mut current = 0;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if current > 0 && current + 1 + len <= width {
            current += 1 + len;
            continue;
        }
        if current > 0 {
            rows += 1;
        }
        // Words wider than the box are broken across rows
        rows += (len - 1) / width;
        current = (len - 1) % width + 1;
    }
    rows
}

/// Rows one rendered line occupies in a wrapping paragraph `width` wide.
pub fn line_rows(line: &Line<'_>, width: u16) -> usize {
    if width == 0 || line.width() <= usize::from(width) {
        return 1;
    }
    let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
    wrapped_rows(&text, width)
}

/// Height of the bordered error box for `message` across `width` columns.
pub fn error_height(message: &str, width: u16) -> u16 {
    let rows = wrapped_rows(message, width.saturating_sub(2)).min(MAX_ERROR_ROWS);
    rows as u16 + 2
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let error_rows = self
            .session
            .error()
            .map_or(0, |message| error_height(message, area.width));

        let main_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),            // Header
                Constraint::Length(3),            // Form
                Constraint::Length(error_rows),   // Error
                Constraint::Min(1),               // Columns
                Constraint::Length(3),            // Help
            ])
            .split(area);

        render_header(self, main_layout[0], buf);
        form::render_form(self, main_layout[1], buf);
        if error_rows > 0 {
            form::render_error(self, main_layout[2], buf);
        }

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(main_layout[3]);

        for (backend, column) in Backend::ALL.into_iter().zip(columns.iter()) {
            transcript::render_column(self, backend, *column, buf);
        }

        render_help(main_layout[4], buf);
    }
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    Paragraph::new(vec![
        Line::from(TITLE).bold(),
        Line::from(SUBTITLE).dim(),
    ])
    .block(
        Block::bordered()
            .title(format!(" {} ", app.base_url()))
            .title_alignment(Alignment::Right)
            .border_type(BorderType::Rounded),
    )
    .alignment(Alignment::Center)
    .fg(Color::Green)
    .render(area, buf);
}

fn render_help(area: Rect, buf: &mut Buffer) {
    Paragraph::new("Enter: submit • Tab: switch field • ↑↓/PgUp/PgDn: scroll • Esc: quit")
        .block(
            Block::bordered()
                .title("Controls")
                .border_type(BorderType::Rounded),
        )
        .fg(Color::Yellow)
        .alignment(Alignment::Center)
        .render(area, buf);
}
