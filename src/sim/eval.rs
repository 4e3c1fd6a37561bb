//! Best-effort expression evaluation for the line simulator
//!
//! The simulator never runs guest code. What it can do is substitute known
//! variable values into an expression and, when the result is plain
//! arithmetic, fold it to a number with a tiny recursive-descent evaluator.
//! Anything it cannot reduce stays behind as [`ScopeValue::Raw`] text.

use crate::step::ScopeValue;
use regex::Regex;
use std::collections::BTreeMap;

/// Replace every whole-word occurrence of a known variable with its rendered
/// value.
pub fn substitute(expr: &str, vars: &BTreeMap<String, ScopeValue>) -> String {
    let mut out = expr.to_string();
    for (name, value) in vars {
        let pattern = format!(r"\b{}\b", regex::escape(name));
        if let Ok(re) = Regex::new(&pattern) {
            out = re.replace_all(&out, value.output_string()).into_owned();
        }
    }
    out
}

/// Parse a bare literal: number, quoted string, or the language's boolean
/// words. Everything else is kept as raw text.
pub fn parse_literal(expr: &str, bools: [&str; 2]) -> ScopeValue {
    let t = expr.trim();
    if let Ok(n) = t.parse::<f64>() {
        return ScopeValue::Num(n);
    }
    if t.len() >= 2 {
        let quoted = (t.starts_with('"') && t.ends_with('"'))
            || (t.starts_with('\'') && t.ends_with('\''));
        if quoted {
            return ScopeValue::Str(t[1..t.len() - 1].to_string());
        }
    }
    if t == bools[0] {
        return ScopeValue::Bool(true);
    }
    if t == bools[1] {
        return ScopeValue::Bool(false);
    }
    ScopeValue::Raw(t.to_string())
}

/// Resolve one token: a known variable wins, then literal parsing.
pub fn resolve(token: &str, vars: &BTreeMap<String, ScopeValue>, bools: [&str; 2]) -> ScopeValue {
    let t = token.trim();
    if let Some(value) = vars.get(t) {
        return value.clone();
    }
    parse_literal(t, bools)
}

/// Evaluate the right-hand side of an assignment as far as the simulator
/// can see: substitute variables, fold arithmetic, fall back to literals.
pub fn evaluate_expression(
    expr: &str,
    vars: &BTreeMap<String, ScopeValue>,
    bools: [&str; 2],
) -> ScopeValue {
    let t = expr.trim();
    if t.contains(['+', '-', '*', '/']) {
        let substituted = substitute(t, vars);
        if is_arithmetic(&substituted) {
            if let Some(n) = eval_arithmetic(&substituted) {
                return ScopeValue::Num(n);
            }
        }
    }
    // String concatenation: every `+` operand must resolve to something
    // known, otherwise the expression stays raw.
    if t.contains('+') {
        let parts: Vec<ScopeValue> = t
            .split('+')
            .map(|part| resolve(part, vars, bools))
            .collect();
        if parts.iter().any(|p| matches!(p, ScopeValue::Str(_)))
            && !parts.iter().any(|p| matches!(p, ScopeValue::Raw(_)))
        {
            return ScopeValue::Str(
                parts.iter().map(ScopeValue::output_string).collect(),
            );
        }
    }
    resolve(t, vars, bools)
}

fn is_arithmetic(s: &str) -> bool {
    !s.trim().is_empty()
        && s.chars()
            .all(|c| c.is_ascii_digit() || " \t+-*/().".contains(c))
}

/// Fold a pure-arithmetic string to a number. `None` on any malformed input.
pub fn eval_arithmetic(s: &str) -> Option<f64> {
    let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
    let mut p = Arith { chars, pos: 0 };
    let v = p.expr()?;
    if p.pos == p.chars.len() {
        Some(v)
    } else {
        None
    }
}

struct Arith {
    chars: Vec<char>,
    pos: usize,
}

impl Arith {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expr(&mut self) -> Option<f64> {
        let mut acc = self.term()?;
        while let Some(c) = self.peek() {
            match c {
                '+' => {
                    self.pos += 1;
                    acc += self.term()?;
                }
                '-' => {
                    self.pos += 1;
                    acc -= self.term()?;
                }
                _ => break,
            }
        }
        Some(acc)
    }

    fn term(&mut self) -> Option<f64> {
        let mut acc = self.factor()?;
        while let Some(c) = self.peek() {
            match c {
                '*' => {
                    self.pos += 1;
                    acc *= self.factor()?;
                }
                '/' => {
                    self.pos += 1;
                    acc /= self.factor()?;
                }
                _ => break,
            }
        }
        Some(acc)
    }

    fn factor(&mut self) -> Option<f64> {
        match self.peek()? {
            '-' => {
                self.pos += 1;
                Some(-self.factor()?)
            }
            '(' => {
                self.pos += 1;
                let v = self.expr()?;
                if self.peek()? != ')' {
                    return None;
                }
                self.pos += 1;
                Some(v)
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_digit() || c == '.')
                {
                    self.pos += 1;
                }
                self.chars[start..self.pos]
                    .iter()
                    .collect::<String>()
                    .parse()
                    .ok()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOLS: [&str; 2] = ["true", "false"];

    fn vars() -> BTreeMap<String, ScopeValue> {
        let mut m = BTreeMap::new();
        m.insert("a".to_string(), ScopeValue::Num(10.0));
        m.insert("b".to_string(), ScopeValue::Num(4.0));
        m.insert("name".to_string(), ScopeValue::Str("lab".into()));
        m
    }

    #[test]
    fn folds_arithmetic_over_variables() {
        assert_eq!(
            evaluate_expression("a + b * 2", &vars(), BOOLS),
            ScopeValue::Num(18.0)
        );
        assert_eq!(
            evaluate_expression("(a - b) / 2", &vars(), BOOLS),
            ScopeValue::Num(3.0)
        );
    }

    #[test]
    fn unknown_identifier_stays_raw() {
        assert_eq!(
            evaluate_expression("a + missing", &vars(), BOOLS),
            ScopeValue::Raw("a + missing".into())
        );
    }

    #[test]
    fn substitution_is_whole_word() {
        // `ab` must not be touched by the variable `a`.
        assert_eq!(substitute("a + ab", &vars()), "10 + ab");
    }

    #[test]
    fn literal_parsing() {
        assert_eq!(parse_literal("42", BOOLS), ScopeValue::Num(42.0));
        assert_eq!(parse_literal("\"hi\"", BOOLS), ScopeValue::Str("hi".into()));
        assert_eq!(parse_literal("true", BOOLS), ScopeValue::Bool(true));
        assert_eq!(
            parse_literal("True", ["True", "False"]),
            ScopeValue::Bool(true)
        );
        assert_eq!(parse_literal("foo()", BOOLS), ScopeValue::Raw("foo()".into()));
    }

    #[test]
    fn variable_reference_resolves() {
        assert_eq!(resolve("name", &vars(), BOOLS), ScopeValue::Str("lab".into()));
    }
}
