//! Output pane
//!
//! Console log entries of the step under the cursor, the resolved final
//! output once the cursor reaches the last step, and any lint findings the
//! run produced.

use crate::step::{ExecutionStep, IssueKind};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render_output_pane(
    frame: &mut Frame,
    area: Rect,
    steps: &[ExecutionStep],
    current_index: isize,
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
        .title(" Output ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let mut lines: Vec<Line> = Vec::new();

    // Accumulated log up to and including the cursor.
    for (i, step) in steps.iter().enumerate() {
        if current_index < i as isize {
            break;
        }
        for entry in &step.scope().log {
            lines.push(Line::from(Span::styled(
                entry.output_string(),
                Style::default().fg(DEFAULT_THEME.fg),
            )));
        }
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "(no output yet)",
            Style::default().fg(DEFAULT_THEME.comment),
        )));
    }

    let at_end = !steps.is_empty() && current_index == steps.len() as isize - 1;
    if at_end {
        if let Some(final_output) = steps.last().and_then(|s| s.final_output()) {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                " program finished ",
                Style::default()
                    .bg(DEFAULT_THEME.success)
                    .fg(ratatui::style::Color::Black)
                    .add_modifier(Modifier::BOLD),
            )));
            if !final_output.is_empty() {
                for out_line in final_output.lines() {
                    lines.push(Line::from(Span::styled(
                        out_line.to_string(),
                        Style::default().fg(DEFAULT_THEME.success),
                    )));
                }
            }
        }
    }

    // Lint findings ride on the first step of a run.
    let issues: Vec<_> = steps.iter().flat_map(|s| s.issues().iter()).collect();
    if !issues.is_empty() {
        lines.push(Line::default());
        for issue in issues {
            let color = match issue.kind {
                IssueKind::Perf => DEFAULT_THEME.issue_perf,
                IssueKind::Security => DEFAULT_THEME.issue_security,
                IssueKind::Style => DEFAULT_THEME.issue_style,
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!(" {} ", issue.kind),
                    Style::default()
                        .bg(color)
                        .fg(ratatui::style::Color::Black)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::styled(issue.message.clone(), Style::default().fg(color)),
            ]));
        }
    }

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    // usize::MAX is the "pin to bottom" sentinel.
    if *scroll == usize::MAX || *scroll + visible_height > lines.len() {
        *scroll = lines.len().saturating_sub(visible_height);
    }
    let visible: Vec<Line> = lines.into_iter().skip(*scroll).take(visible_height).collect();
    frame.render_widget(Paragraph::new(visible).block(block), area);
}
