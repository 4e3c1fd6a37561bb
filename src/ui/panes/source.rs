//! Source pane rendering with syntax highlighting
//!
//! Displays the active buffer with line numbers, per-language keyword
//! highlighting, the current step's line highlighted, and the first syntax
//! error line (if any) marked in red.

use crate::engine::ParseError;
use crate::language::Language;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn keywords(language: Language) -> &'static [&'static str] {
    match language {
        Language::Javascript => &[
            "var", "let", "const", "function", "if", "else", "while", "for", "return", "true",
            "false", "null",
        ],
        Language::Python => &[
            "def", "class", "if", "elif", "else", "for", "while", "return", "assert", "True",
            "False", "None", "import", "from", "pass",
        ],
        Language::Go => &[
            "package", "import", "func", "var", "type", "if", "else", "for", "return", "true",
            "false", "nil",
        ],
        Language::Rust => &[
            "fn", "let", "mut", "struct", "if", "else", "for", "while", "return", "true", "false",
            "pub", "use",
        ],
        Language::Cpp => &[
            "int", "float", "double", "char", "bool", "auto", "void", "class", "struct", "if",
            "else", "for", "while", "return", "true", "false", "include",
        ],
    }
}

/// Word-at-a-time highlighter, enough for a read-only view.
fn highlight_line(line: &str, language: Language) -> Line<'static> {
    let comment_prefix = if language == Language::Python { "#" } else { "//" };
    let mut spans = Vec::new();
    let mut word = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if line[char_offset(&chars, i)..].starts_with(comment_prefix) {
            flush_word(&mut spans, &mut word, language);
            spans.push(Span::styled(
                line[char_offset(&chars, i)..].to_string(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        if c == '"' || c == '\'' {
            flush_word(&mut spans, &mut word, language);
            let mut end = i + 1;
            while end < chars.len() && chars[end] != c {
                end += if chars[end] == '\\' { 2 } else { 1 };
            }
            end = (end + 1).min(chars.len());
            let text: String = chars[i..end].iter().collect();
            spans.push(Span::styled(text, Style::default().fg(DEFAULT_THEME.string)));
            i = end;
            continue;
        }

        if !c.is_alphanumeric() && c != '_' {
            if !word.is_empty() {
                let is_call = c == '(';
                push_word(&mut spans, std::mem::take(&mut word), language, is_call);
            }
            spans.push(Span::raw(c.to_string()));
            i += 1;
            continue;
        }

        word.push(c);
        i += 1;
    }
    flush_word(&mut spans, &mut word, language);
    Line::from(spans)
}

fn char_offset(chars: &[char], i: usize) -> usize {
    chars[..i].iter().map(|c| c.len_utf8()).sum()
}

fn flush_word(spans: &mut Vec<Span<'static>>, word: &mut String, language: Language) {
    if !word.is_empty() {
        push_word(spans, std::mem::take(word), language, false);
    }
}

fn push_word(spans: &mut Vec<Span<'static>>, word: String, language: Language, is_call: bool) {
    let style = if keywords(language).contains(&word.as_str()) {
        Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD)
    } else if word.chars().all(|c| c.is_ascii_digit() || c == '.') {
        Style::default().fg(DEFAULT_THEME.number)
    } else if is_call {
        Style::default().fg(DEFAULT_THEME.function)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    };
    spans.push(Span::styled(word, style));
}

#[allow(clippy::too_many_arguments)]
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source: &str,
    language: Language,
    current_line: usize,
    parse_error: Option<&ParseError>,
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
        .title(format!(" Source [{}] ", language.display_name()))
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines: Vec<&str> = source.lines().collect();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    // Keep the current line in view when stepping.
    if current_line > 0 {
        let idx = current_line - 1;
        if idx < *scroll {
            *scroll = idx;
        } else if idx >= *scroll + visible_height {
            *scroll = idx + 1 - visible_height;
        }
    }
    *scroll = (*scroll).min(lines.len().saturating_sub(1));

    let error_line = parse_error.map(|e| e.line);

    let visible: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(visible_height)
        .map(|(idx, raw)| {
            let line_no = idx + 1;
            let is_current = line_no == current_line;
            let is_error = Some(line_no) == error_line;

            let num_style = if is_error {
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD)
            } else if is_current {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };

            let mut content = highlight_line(raw, language);
            if is_error {
                for span in &mut content.spans {
                    span.style = Style::default()
                        .bg(DEFAULT_THEME.error)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD);
                }
            } else if is_current {
                for span in &mut content.spans {
                    span.style = span
                        .style
                        .patch(Style::default().bg(DEFAULT_THEME.current_line_bg));
                }
            }

            let mut spans = vec![Span::styled(format!("{:4} ", line_no), num_style)];
            spans.extend(content.spans);
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(visible).block(block), area);
}
