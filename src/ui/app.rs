//! Main TUI application state and logic

use crate::engine::Engine;
use crate::language::LANGUAGES;
use crate::sim::SimStrategy;
use crate::storage::Storage;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Output,
    Variables,
    History,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: source -> output -> variables -> history)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Output,
            FocusedPane::Output => FocusedPane::Variables,
            FocusedPane::Variables => FocusedPane::History,
            FocusedPane::History => FocusedPane::Source,
        }
    }
}

/// The main application state
pub struct App {
    /// The execution engine instance
    pub engine: Engine<Box<dyn Storage>>,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub source_scroll: usize,
    pub output_scroll: usize,
    pub variables_scroll: usize,
    pub history_scroll: usize,

    /// Selected row in the history pane
    pub history_cursor: usize,

    /// Playback speed multiplier
    pub speed: f64,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    pub fn new(engine: Engine<Box<dyn Storage>>) -> Self {
        App {
            engine,
            focused_pane: FocusedPane::Source,
            source_scroll: 0,
            output_scroll: usize::MAX,
            variables_scroll: 0,
            history_scroll: 0,
            history_cursor: 0,
            speed: 1.0,
            should_quit: false,
            status_message: String::from("Ready! Press r to run."),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.engine.timeline_mut().tick() {
                self.output_scroll = usize::MAX;
                if !self.engine.timeline().is_playing() {
                    self.status_message = "Playback complete".to_string();
                }
            }

            // Poll with a timeout so playback keeps ticking.
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let pane_area = main_chunks[0];
        let status_area = main_chunks[1];

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(pane_area);

        // Left column: Source (top) | Output (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(columns[0]);

        // Right column: Variables (top) | History (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        let current_line = self
            .engine
            .timeline()
            .current_step()
            .map(|s| s.line_number())
            .unwrap_or(0);

        super::panes::render_source_pane(
            frame,
            left_rows[0],
            self.engine.code(),
            self.engine.language(),
            current_line,
            self.engine.parse_error(),
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        super::panes::render_output_pane(
            frame,
            left_rows[1],
            self.engine.timeline().steps(),
            self.engine.timeline().current_index(),
            self.focused_pane == FocusedPane::Output,
            &mut self.output_scroll,
        );

        super::panes::render_variables_pane(
            frame,
            right_rows[0],
            self.engine.timeline().current_step(),
            self.focused_pane == FocusedPane::Variables,
            &mut self.variables_scroll,
        );

        super::panes::render_history_pane(
            frame,
            right_rows[1],
            self.engine.history().entries(),
            self.history_cursor,
            self.focused_pane == FocusedPane::History,
            &mut self.history_scroll,
        );

        super::panes::render_status_bar(
            frame,
            status_area,
            &self.status_message,
            self.engine.timeline().current_index(),
            self.engine.timeline().len(),
            self.engine.timeline().is_playing(),
            self.engine.parse_error().is_some(),
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.run_current();
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.cycle_language();
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.toggle_strategy();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.speed = (self.speed * 2.0).min(16.0);
                self.status_message = format!("Speed x{}", self.speed);
            }
            KeyCode::Char('-') => {
                self.speed = (self.speed / 2.0).max(0.25);
                self.status_message = format!("Speed x{}", self.speed);
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Left => {
                self.engine.timeline_mut().pause();
                self.engine.timeline_mut().step_backward();
                self.status_message = "Stepped backward".to_string();
                self.output_scroll = usize::MAX;
            }
            KeyCode::Right => {
                self.engine.timeline_mut().pause();
                self.engine.timeline_mut().step_forward();
                self.status_message = "Stepped forward".to_string();
                self.output_scroll = usize::MAX;
            }
            KeyCode::Char(' ') => {
                self.engine.timeline_mut().toggle_play(self.speed);
                self.status_message = if self.engine.timeline().is_playing() {
                    "Playing...".to_string()
                } else {
                    "Paused".to_string()
                };
            }
            KeyCode::Enter => {
                if self.focused_pane == FocusedPane::History {
                    self.restore_selected();
                } else {
                    self.engine.timeline_mut().pause();
                    self.engine.timeline_mut().jump_to_end();
                    self.status_message = "Jumped to end".to_string();
                    self.output_scroll = usize::MAX;
                }
            }
            KeyCode::Backspace => {
                self.engine.timeline_mut().pause();
                self.engine.timeline_mut().jump_to_start();
                self.status_message = "Jumped to start".to_string();
                self.output_scroll = usize::MAX;
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => {
                    self.source_scroll = self.source_scroll.saturating_sub(1);
                }
                FocusedPane::Output => {
                    if self.output_scroll == usize::MAX {
                        self.output_scroll = 0;
                    } else {
                        self.output_scroll = self.output_scroll.saturating_sub(1);
                    }
                }
                FocusedPane::Variables => {
                    self.variables_scroll = self.variables_scroll.saturating_sub(1);
                }
                FocusedPane::History => {
                    self.history_cursor = self.history_cursor.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => {
                    self.source_scroll = self.source_scroll.saturating_add(1);
                }
                FocusedPane::Output => {
                    if self.output_scroll != usize::MAX {
                        self.output_scroll = self.output_scroll.saturating_add(1);
                    }
                }
                FocusedPane::Variables => {
                    self.variables_scroll = self.variables_scroll.saturating_add(1);
                }
                FocusedPane::History => {
                    let count = self.engine.history().len();
                    if self.history_cursor + 1 < count {
                        self.history_cursor += 1;
                    }
                }
            },
            _ => {}
        }
    }

    fn run_current(&mut self) {
        self.engine.timeline_mut().pause();
        match self.engine.run_current() {
            Ok(()) => {
                self.status_message = format!(
                    "Ran {} ({} steps)",
                    self.engine.language().display_name(),
                    self.engine.timeline().len()
                );
                // New runs land at the top of history.
                self.history_cursor = 0;
                self.output_scroll = usize::MAX;
            }
            Err(e) => {
                self.status_message = format!("{}", e);
            }
        }
    }

    fn cycle_language(&mut self) {
        let current = self.engine.language();
        let idx = LANGUAGES
            .iter()
            .position(|&l| l == current)
            .unwrap_or(0);
        let next = LANGUAGES[(idx + 1) % LANGUAGES.len()];
        self.engine.set_language(next);
        self.status_message = format!("Language: {}", next.display_name());
    }

    fn toggle_strategy(&mut self) {
        let next = match self.engine.strategy() {
            SimStrategy::LinePattern => SimStrategy::SyntaxTree,
            SimStrategy::SyntaxTree => SimStrategy::LinePattern,
        };
        self.engine.set_strategy(next);
        self.status_message = format!("Strategy: {:?}", next);
    }

    fn restore_selected(&mut self) {
        let Some(entry) = self.engine.history().entries().get(self.history_cursor) else {
            self.status_message = "No run selected".to_string();
            return;
        };
        let id = entry.id;
        if self.engine.restore(id) {
            self.status_message = "Restored run from history".to_string();
            self.output_scroll = usize::MAX;
        }
    }
}
