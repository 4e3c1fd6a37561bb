//! Variables pane
//!
//! Shows the scope snapshot of the step under the cursor, and for heuristic
//! node steps the phase and description line as a header.

use crate::step::{ExecutionStep, ScopeValue};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn value_style(value: &ScopeValue) -> Style {
    match value {
        ScopeValue::Num(_) => Style::default().fg(DEFAULT_THEME.number),
        ScopeValue::Str(_) => Style::default().fg(DEFAULT_THEME.string),
        ScopeValue::Bool(_) => Style::default().fg(DEFAULT_THEME.keyword),
        ScopeValue::Null => Style::default().fg(DEFAULT_THEME.comment),
        ScopeValue::Raw(_) => Style::default().fg(DEFAULT_THEME.comment),
    }
}

fn rendered(value: &ScopeValue) -> String {
    match value {
        ScopeValue::Str(s) => format!("\"{}\"", s),
        other => other.output_string(),
    }
}

pub fn render_variables_pane(
    frame: &mut Frame,
    area: Rect,
    step: Option<&ExecutionStep>,
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
        .title(" Variables ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let mut lines: Vec<Line> = Vec::new();
    match step {
        None => {
            lines.push(Line::from(Span::styled(
                "(no step selected)",
                Style::default().fg(DEFAULT_THEME.comment),
            )));
        }
        Some(step) => {
            if let ExecutionStep::Node(node) = step {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!(" {} ", node.context.phase),
                        Style::default()
                            .bg(DEFAULT_THEME.primary)
                            .fg(ratatui::style::Color::Black)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" "),
                    Span::styled(
                        node.context.description.clone(),
                        Style::default().fg(DEFAULT_THEME.fg),
                    ),
                ]));
                lines.push(Line::from(Span::styled(
                    node.context.code_snippet.clone(),
                    Style::default().fg(DEFAULT_THEME.comment),
                )));
                lines.push(Line::default());
            }
            if step.scope().vars.is_empty() {
                lines.push(Line::from(Span::styled(
                    "(no variables yet)",
                    Style::default().fg(DEFAULT_THEME.comment),
                )));
            }
            for (name, value) in &step.scope().vars {
                lines.push(Line::from(vec![
                    Span::styled(
                        name.clone(),
                        Style::default().fg(DEFAULT_THEME.function),
                    ),
                    Span::styled(" = ", Style::default().fg(DEFAULT_THEME.comment)),
                    Span::styled(rendered(value), value_style(value)),
                ]));
            }
        }
    }

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    *scroll = (*scroll).min(lines.len().saturating_sub(1));
    let visible: Vec<Line> = lines.into_iter().skip(*scroll).take(visible_height).collect();
    frame.render_widget(Paragraph::new(visible).block(block), area);
}
