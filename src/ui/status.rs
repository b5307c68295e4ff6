use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    if let Some((message, level)) = model.active_toast() {
        let (prefix, style) = match level {
            ToastLevel::Info => (
                "[info]",
                Style::default().bg(Color::DarkGray).fg(Color::White),
            ),
            ToastLevel::Warning => (
                "[warn]",
                Style::default().bg(Color::Yellow).fg(Color::Black),
            ),
            ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
        };
        let toast = Paragraph::new(format!(" {prefix} {message}")).style(style);
        frame.render_widget(toast, area);
        return;
    }

    let document = model.view.document();
    let dirty_indicator = if document.is_dirty() { " [modified]" } else { "" };
    let watch_indicator = if model.watch_enabled {
        " [watching]"
    } else {
        ""
    };
    let cursor = model.view.cursor();
    let selection_info = if model.view.selections().iter().any(|s| !s.is_empty()) {
        "  [selection]"
    } else {
        ""
    };

    let status = format!(
        " {}{}{}  Ln {}, Col {}{}  Ctrl+S:save  Ctrl+Q:quit",
        document.title(),
        dirty_indicator,
        watch_indicator,
        cursor.row + 1,
        cursor.col + 1,
        selection_info,
    );

    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}
