//! Source parsing
//!
//! Turns source text into a concrete syntax tree per (code, language) pair:
//! - [`grammar`]: per-language grammar descriptions and statement
//!   classification
//! - [`adapter`]: the shared parser instance with its load-once grammar
//!   registry
//! - [`tree`]: the arena-backed tree and its error-detection queries
//!
//! The scanner is deliberately tolerant, tree-sitter style: any input yields
//! a tree, and syntax problems surface as `ERROR` nodes rather than parse
//! failures. Statement classification is line-oriented and heuristic, which
//! is all the timeline simulator needs.

pub mod adapter;
pub mod grammar;
pub mod tree;

pub use adapter::{ParseFailure, ParserAdapter};
