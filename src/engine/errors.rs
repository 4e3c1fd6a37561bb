//! Run failure taxonomy
//!
//! Everything that can stop a run maps onto one of four cases, so callers
//! and the UI only ever deal with this enum.

use crate::language::Language;
use crate::parse::ParseFailure;
use std::fmt;

/// Location and text of the first syntax error of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub start_column: usize,
    pub end_column: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    /// The language's grammar could not be loaded.
    GrammarUnavailable { language: Language },
    /// The source has a syntax error; nothing was executed.
    SyntaxInvalid(ParseError),
    /// The guest program failed while executing or being simulated.
    ExecutionFailed { message: String },
    /// Another run is still in flight.
    RunInProgress,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::GrammarUnavailable { language } => {
                write!(f, "no grammar available for {}", language)
            }
            RunError::SyntaxInvalid(e) => {
                write!(
                    f,
                    "syntax error at line {}, columns {}-{}: {}",
                    e.line, e.start_column, e.end_column, e.message
                )
            }
            RunError::ExecutionFailed { message } => write!(f, "execution failed: {}", message),
            RunError::RunInProgress => write!(f, "a run is already in progress"),
        }
    }
}

impl std::error::Error for RunError {}

impl From<ParseFailure> for RunError {
    fn from(e: ParseFailure) -> Self {
        match e {
            ParseFailure::GrammarUnavailable { language } => {
                RunError::GrammarUnavailable { language }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location() {
        let err = RunError::SyntaxInvalid(ParseError {
            line: 3,
            start_column: 5,
            end_column: 9,
            message: "x = \"oops".to_string(),
        });
        let rendered = err.to_string();
        assert!(rendered.contains("line 3"));
        assert!(rendered.contains("5-9"));
    }

    #[test]
    fn parse_failure_converts() {
        let err: RunError = ParseFailure::GrammarUnavailable {
            language: Language::Go,
        }
        .into();
        assert_eq!(
            err,
            RunError::GrammarUnavailable {
                language: Language::Go
            }
        );
    }
}
