use ratatui::style::{Color, Style, Stylize};

use crate::gateway::Backend;

pub fn dim_unless_focused(is_focused: bool, style: Style) -> Style {
    if is_focused { style.bold() } else { style.dim() }
}

pub fn backend_color(backend: Backend) -> Color {
    match backend {
        Backend::Mem0 => Color::Magenta,
        Backend::Zep => Color::Cyan,
    }
}

pub const SPINNER_FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

pub fn spinner(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}
