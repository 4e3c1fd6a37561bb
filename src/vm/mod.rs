//! Embedded dynamic-language VM
//!
//! A small interpreter for the JavaScript subset the lab accepts: numbers,
//! strings, booleans, `var`/`let`/`const`, functions, `if`/`while`/`for`,
//! and `console.log`. It exists to drive the exact line-stepping strategy;
//! the pipeline is lex ([`lexer`]), parse ([`parser`] over [`ast`]),
//! evaluate ([`engine`]), and record snapshots ([`stepper`]).

pub mod ast;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod stepper;
pub mod value;

pub use stepper::run_dynamic;
