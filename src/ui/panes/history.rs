//! Run history pane

use crate::history::RunHistoryEntry;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render_history_pane(
    frame: &mut Frame,
    area: Rect,
    entries: &[RunHistoryEntry],
    selected: usize,
    is_focused: bool,
    scroll: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };
    let block = Block::default()
        .title(format!(" History ({}) ", entries.len()))
        .borders(Borders::ALL)
        .border_style(border_style);

    let mut lines: Vec<Line> = Vec::new();
    if entries.is_empty() {
        lines.push(Line::from(Span::styled(
            "(no runs yet)",
            Style::default().fg(DEFAULT_THEME.comment),
        )));
    }
    for (i, entry) in entries.iter().enumerate() {
        let first_line = entry.code.lines().next().unwrap_or("").trim();
        let label = format!(
            "{:>2}. [{}] {} ({} steps)",
            i + 1,
            entry.language,
            first_line,
            entry.steps.len()
        );
        let style = if is_focused && i == selected {
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.secondary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DEFAULT_THEME.fg)
        };
        lines.push(Line::from(Span::styled(label, style)));
    }

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    // Keep the selection visible.
    if is_focused {
        if selected < *scroll {
            *scroll = selected;
        } else if selected >= *scroll + visible_height {
            *scroll = selected + 1 - visible_height;
        }
    }
    *scroll = (*scroll).min(lines.len().saturating_sub(1));
    let visible: Vec<Line> = lines.into_iter().skip(*scroll).take(visible_height).collect();
    frame.render_widget(Paragraph::new(visible).block(block), area);
}
