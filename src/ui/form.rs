use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Block, BorderType, Paragraph, Widget, Wrap},
};

use crate::app::App;
use crate::session::{InputField, Session};
use crate::ui::style::{dim_unless_focused, spinner};

pub fn submit_label(session: &Session, spinner_frame: usize) -> String {
    if session.is_busy() {
        format!("{} Processing...", spinner(spinner_frame))
    } else {
        "Submit Query".to_string()
    }
}

pub fn render_form(app: &App, area: Rect, buf: &mut Buffer) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(50),
            Constraint::Percentage(20),
        ])
        .split(area);

    let session = &app.session;
    render_field(
        "User ID",
        &session.user_id,
        session.focus() == InputField::UserId,
        session.is_busy(),
        layout[0],
        buf,
    );
    render_field(
        "Query",
        &session.query,
        session.focus() == InputField::Query,
        session.is_busy(),
        layout[1],
        buf,
    );

    let button_style = if session.can_submit() {
        Style::default().fg(Color::Black).bg(Color::Green).bold()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Paragraph::new(submit_label(session, app.spinner_frame))
        .block(Block::bordered().border_type(BorderType::Rounded))
        .style(button_style)
        .alignment(Alignment::Center)
        .render(layout[2], buf);
}

fn render_field(
    title: &str,
    value: &str,
    focused: bool,
    disabled: bool,
    area: Rect,
    buf: &mut Buffer,
) {
    let cursor = if focused && !disabled { "▏" } else { "" };
    let style = if disabled {
        Style::default().fg(Color::DarkGray)
    } else {
        dim_unless_focused(focused, Style::default().fg(Color::Yellow))
    };

    Paragraph::new(format!("> {}{}", value, cursor))
        .block(
            Block::bordered()
                .title(title.to_string())
                .border_type(BorderType::Rounded),
        )
        .style(style)
        .render(area, buf);
}

pub fn render_error(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(message) = app.session.error() else {
        return;
    };

    Paragraph::new(message.to_string())
        .block(Block::bordered().border_type(BorderType::Rounded))
        .fg(Color::Red)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_label() {
        let mut session = Session::new("u1");
        assert_eq!(submit_label(&session, 0), "Submit Query");

        session.query = "hello".to_string();
        session.begin_submit().unwrap();
        assert!(submit_label(&session, 0).ends_with("Processing..."));
    }
}
