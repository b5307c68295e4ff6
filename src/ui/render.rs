use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

use crate::app::Model;
use crate::view::{Column, View, is_selected};

use super::status;

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let text_area = Rect {
        height: area.height.saturating_sub(1),
        ..area
    };
    let status_area = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: 1.min(area.height),
        ..area
    };

    render_text(&model.view, frame, text_area);
    status::render_status_bar(model, frame, status_area);

    if let Some((x, y)) = model.view.cursor_screen_position() {
        let gutter = gutter_width(model.view.document().row_count());
        let x = text_area.x.saturating_add(gutter).saturating_add(x);
        let y = text_area.y.saturating_add(y);
        if x < text_area.right() && y < text_area.bottom() {
            frame.set_cursor_position((x, y));
        }
    }
}

fn render_text(view: &View, frame: &mut Frame, area: Rect) {
    let row_count = view.document().row_count();
    let number_width = usize::from(line_number_width(row_count));
    let viewport = view.viewport();
    let selections = view.selections();
    let selected = Style::default().bg(Color::Blue).fg(Color::White);

    let mut layouts = view.layouts_from(viewport.top());
    let mut lines: Vec<Line> = Vec::with_capacity(usize::from(area.height));
    for row in viewport.visible_rows().take(usize::from(area.height)) {
        let Some(layout) = layouts.next() else {
            lines.push(Line::from(Span::styled(
                format!("{:>number_width$} ", "~"),
                Style::default().fg(Color::DarkGray),
            )));
            continue;
        };

        let mut spans = vec![Span::styled(
            format!("{:>number_width$} ", row + 1),
            Style::default().fg(Color::DarkGray),
        )];
        let mut run = String::new();
        let mut run_selected = false;
        for col in viewport.visible_cols() {
            let Some(column) = layout.column(col) else {
                break;
            };
            let cell_selected = is_selected(&selections, row, col);
            if cell_selected != run_selected && !run.is_empty() {
                spans.push(styled_run(std::mem::take(&mut run), run_selected, selected));
            }
            run_selected = cell_selected;
            push_glyph(&mut run, view, column, col == viewport.left());
        }
        if !run.is_empty() {
            spans.push(styled_run(run, run_selected, selected));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines), area);
}

fn styled_run(text: String, is_selected: bool, selected: Style) -> Span<'static> {
    if is_selected {
        Span::styled(text, selected)
    } else {
        Span::raw(text)
    }
}

/// Append what a rendered column draws. Trailing columns of a wide
/// character draw nothing (the terminal fills those itself).
fn push_glyph(run: &mut String, view: &View, column: &Column, first_visible: bool) {
    match column.ch {
        '\t' => run.push(' '),
        ch if ch.is_control() => run.push('?'),
        ch if column.is_char_start && column.len > ch.len_utf8() => {
            // Base character followed by combining marks.
            let (_, tail) = view.document().contents().split(column.offset);
            run.push_str(&tail.split(column.len).0.to_string());
        }
        ch if column.is_char_start => run.push(ch),
        // Left half scrolled off screen.
        _ if first_visible => run.push(' '),
        _ => {}
    }
}

/// Digits needed for the largest line number.
pub const fn line_number_width(total_lines: usize) -> u16 {
    let mut width = 1;
    let mut rest = total_lines / 10;
    while rest > 0 {
        width += 1;
        rest /= 10;
    }
    width
}

/// Line numbers plus one separating space.
pub const fn gutter_width(total_lines: usize) -> u16 {
    line_number_width(total_lines) + 1
}
