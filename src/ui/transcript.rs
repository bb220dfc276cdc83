// src/ui/transcript.rs
// One backend column: status indicator plus newest-first entries

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Paragraph, Widget, Wrap},
};

use crate::app::App;
use crate::gateway::{Backend, PerformanceMetrics};
use crate::session::{ColumnState, ConversationEntry, Transcript};
use crate::ui::style::{backend_color, spinner};

pub const NO_CONVERSATIONS: &str = "No conversations yet. Enter a query to start.";
pub const NO_MEMORY: &str = "No previous memory found";
pub const PROCESSING: &str = "Processing new query...";

pub fn loading_message(backend: Backend) -> String {
    format!("Loading {} response...", backend.name())
}

/// Milliseconds with one decimal, e.g. `812.4ms`.
pub fn format_ms(value: f64) -> String {
    format!("{:.1}ms", value)
}

pub fn render_column(app: &App, backend: Backend, area: Rect, buf: &mut Buffer) {
    let transcript = app.session.transcript(backend);
    let state = app.session.column_state(backend);
    let lines = transcript_lines(backend, transcript, state, app.spinner_frame);

    let title = format!(" {} ({}) ", backend.name(), transcript.len());
    let block = Block::bordered()
        .title(title)
        .title_alignment(Alignment::Center)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(backend_color(backend)));
    app.column_area.set(block.inner(area));

    Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset, 0))
        .render(area, buf);
}

/// Everything a column shows, top to bottom.
pub fn transcript_lines(
    backend: Backend,
    transcript: &Transcript,
    state: ColumnState,
    spinner_frame: usize,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match state {
        ColumnState::Idle => {
            lines.push(Line::from(NO_CONVERSATIONS).italic().fg(Color::DarkGray));
            return lines;
        }
        ColumnState::Loading => {
            let style = Style::default().fg(Color::Yellow);
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", spinner(spinner_frame)), style),
                Span::styled(loading_message(backend), style),
            ]));
            return lines;
        }
        ColumnState::Processing => {
            let style = Style::default().fg(Color::Yellow);
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", spinner(spinner_frame)), style),
                Span::styled(PROCESSING, style.add_modifier(Modifier::DIM)),
            ]));
            lines.push(Line::from(""));
        }
        ColumnState::Ready => {}
    }

    for entry in transcript.iter() {
        push_entry(&mut lines, entry);
        lines.push(Line::from(""));
    }

    lines
}

fn label(text: &'static str) -> Span<'static> {
    Span::styled(text, Style::default().add_modifier(Modifier::BOLD))
}

fn push_entry(lines: &mut Vec<Line<'static>>, entry: &ConversationEntry) {
    lines.push(Line::from(vec![
        label("Q: "),
        Span::styled(entry.query.clone(), Style::default().fg(Color::Cyan)),
    ]));
    lines.push(Line::from(vec![
        label("A: "),
        Span::styled(entry.response_text.clone(), Style::default().fg(Color::White)),
    ]));

    match entry.memories() {
        Some(memories) => {
            lines.push(Line::from(label("Retrieved Memory:")));
            for memory in memories {
                lines.push(Line::from(vec![
                    Span::raw("  • "),
                    Span::styled(memory.clone(), Style::default().fg(Color::Green)),
                ]));
            }
        }
        None => {
            lines.push(Line::from(vec![
                label("Retrieved Memory: "),
                Span::styled(NO_MEMORY, Style::default().add_modifier(Modifier::ITALIC)),
            ]));
        }
    }

    if let Some(metrics) = &entry.performance_metrics {
        push_metrics(lines, metrics);
    }
}

fn push_metrics(lines: &mut Vec<Line<'static>>, metrics: &PerformanceMetrics) {
    lines.push(Line::from(label("Performance:")));

    let mut stages: Vec<(&'static str, f64)> = Vec::with_capacity(6);
    if let Some(ms) = metrics.user_setup_time_ms {
        stages.push(("User Setup", ms));
    }
    if let Some(ms) = metrics.thread_create_time_ms {
        stages.push(("Thread Creation", ms));
    }
    stages.push(("Search", metrics.search_time_ms));
    stages.push(("LLM", metrics.llm_invoke_time_ms));
    stages.push(("Save", metrics.save_time_ms));

    for (name, ms) in stages {
        lines.push(Line::from(format!("  {}: {}", name, format_ms(ms))).fg(Color::DarkGray));
    }
    lines.push(
        Line::from(format!("  Total: {}", format_ms(metrics.total_time_ms)))
            .bold()
            .fg(Color::Yellow),
    );
}
