//! TUI pane rendering modules
//!
//! Each pane module exports a primary `render_*` function that takes the
//! relevant slice of application state plus a mutable scroll offset.
//!
//! - [`source`]: active buffer with syntax highlighting and the current step's line
//! - [`variables`]: scope snapshot of the step under the cursor
//! - [`output`]: accumulated console output, final output, and lint findings
//! - [`history`]: previous runs, selectable for restore
//! - [`status`]: status bar with keybindings and playback state

pub mod history;
pub mod output;
pub mod source;
pub mod status;
pub mod variables;

pub use history::render_history_pane;
pub use output::render_output_pane;
pub use source::render_source_pane;
pub use status::render_status_bar;
pub use variables::render_variables_pane;
