//! Runtime values of the embedded VM

use crate::step::{format_number, ScopeValue};
use crate::vm::ast::Stmt;
use std::fmt;
use std::rc::Rc;

/// A user-defined function. Shared so a value copy of the function stays
/// cheap.
#[derive(Debug, PartialEq)]
pub struct JsFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    Function(Rc<JsFunction>),
}

impl Value {
    pub fn truthy(&self) -> bool {
        match self {
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::Null | Value::Undefined => false,
            Value::Function(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Null => "object",
            Value::Undefined => "undefined",
            Value::Function(_) => "function",
        }
    }

    /// Convert into the snapshot representation. Functions are not
    /// snapshot-visible and return `None`.
    pub fn to_scope_value(&self) -> Option<ScopeValue> {
        match self {
            Value::Num(n) => Some(ScopeValue::Num(*n)),
            Value::Str(s) => Some(ScopeValue::Str(s.clone())),
            Value::Bool(b) => Some(ScopeValue::Bool(*b)),
            Value::Null => Some(ScopeValue::Null),
            Value::Undefined => Some(ScopeValue::Raw("undefined".to_string())),
            Value::Function(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => f.write_str("null"),
            Value::Undefined => f.write_str("undefined"),
            Value::Function(func) => write!(f, "function {}", func.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(Value::Num(1.0).truthy());
        assert!(!Value::Num(0.0).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(Value::Str("x".into()).truthy());
        assert!(!Value::Null.truthy());
        assert!(!Value::Undefined.truthy());
    }

    #[test]
    fn display_matches_console_output() {
        assert_eq!(Value::Num(3.0).to_string(), "3");
        assert_eq!(Value::Num(2.5).to_string(), "2.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Undefined.to_string(), "undefined");
    }
}
