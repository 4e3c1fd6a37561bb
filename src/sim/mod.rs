//! Heuristic execution simulation
//!
//! Statically typed languages are not executed; their timelines are
//! approximations produced by one of two strategies:
//! - [`SimStrategy::LinePattern`] (the default): regex-driven line scanning
//!   with variable tracking ([`line`], [`rules`], [`eval`])
//! - [`SimStrategy::SyntaxTree`]: a two-pass walk of the parsed tree that
//!   classifies statements into execution phases ([`ast`])
//!
//! Both strategies are deterministic for a given source, which is what makes
//! heuristic runs cacheable.

use crate::language::Language;
use crate::parse::ParserAdapter;
use crate::step::ExecutionStep;
use serde::{Deserialize, Serialize};

pub mod ast;
pub mod eval;
pub mod line;
pub mod rules;

/// Which heuristic produces the timeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SimStrategy {
    #[default]
    #[value(name = "line-pattern")]
    LinePattern,
    #[value(name = "syntax-tree")]
    SyntaxTree,
}

/// Run the chosen strategy over `code`. The tree strategy parses with its
/// own adapter so it can run on any thread.
pub fn execute(
    code: &str,
    language: Language,
    strategy: SimStrategy,
) -> Result<Vec<ExecutionStep>, String> {
    match strategy {
        SimStrategy::LinePattern => Ok(line::simulate_lines(code, language)),
        SimStrategy::SyntaxTree => {
            let mut parser = ParserAdapter::new();
            let tree = parser.parse(code, language).map_err(|e| e.to_string())?;
            Ok(ast::simulate_tree(&tree, language))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategies_agree_on_step_presence() {
        let code = "fn main() {\n    let a = 1;\n}";
        let by_line = execute(code, Language::Rust, SimStrategy::LinePattern).unwrap();
        let by_tree = execute(code, Language::Rust, SimStrategy::SyntaxTree).unwrap();
        assert!(!by_line.is_empty());
        assert!(!by_tree.is_empty());
    }

    #[test]
    fn same_input_is_deterministic() {
        let code = "a = 1\nprint(a)";
        let first = execute(code, Language::Python, SimStrategy::LinePattern).unwrap();
        let second = execute(code, Language::Python, SimStrategy::LinePattern).unwrap();
        assert_eq!(first, second);
    }
}
