//! # Introduction
//!
//! steplab turns small programs in a handful of guest languages into
//! scrubbable execution-step timelines.  A tolerant parser gates runs on
//! syntax errors, a tiny embedded VM instruments and executes the dynamic
//! language, and heuristic simulators approximate the others.  The resulting
//! steps are navigated forward and backward through a terminal UI built with
//! [ratatui](https://docs.rs/ratatui).
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → ParserAdapter → gate on first error
//!        → VM stepper (dynamic) | heuristic simulator (static)
//!        → lint findings → cache → timeline → TUI
//! ```
//!
//! 1. [`parse`] — tolerant per-language grammars producing a syntax tree
//!    with explicit `ERROR` nodes.
//! 2. [`vm`] — embedded interpreter for the dynamic language; source is
//!    instrumented with snapshot calls so every executed line yields a step.
//! 3. [`sim`] — line-pattern and syntax-tree heuristics for the static
//!    languages.
//! 4. [`lint`] — structural rules evaluated on the parse tree; findings
//!    attach to the run's first step.
//! 5. [`engine`] — orchestrates a run end to end: parse, execute, lint,
//!    cache, history, timeline.
//! 6. [`timeline`] — cursor plus pull-based playback over recorded steps.
//! 7. [`ui`] — ratatui-based TUI; not part of the stable library API.

pub mod cache;
pub mod engine;
pub mod history;
pub mod isolate;
pub mod language;
pub mod lint;
pub mod parse;
pub mod sim;
pub mod step;
pub mod storage;
pub mod timeline;
pub mod ui;
pub mod vm;
