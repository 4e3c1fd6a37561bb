//! Line-pattern rules per guest language
//!
//! One [`LineRules`] value per heuristic language bundles everything the
//! line simulator needs: how to spot the entry point, how to pull a variable
//! assignment out of a line, how to render a print statement, and which
//! prefixes open control flow. The rule sets are compiled once and shared.

use crate::language::Language;
use crate::sim::eval::{evaluate_expression, parse_literal, resolve};
use crate::step::ScopeValue;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// How print arguments are written in the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrintStyle {
    /// `print(a + b)`, `print("x:", x)`
    Python,
    /// `fmt.Println("sum", sum)`
    Go,
    /// `println!("total = {}", total)`
    RustFormat,
    /// `std::cout << "n = " << n << std::endl;`
    CppStream,
}

pub struct LineRules {
    language: Language,
    pub comment_prefix: &'static str,
    /// Substring that marks the entry function. `None` means top-level code
    /// executes directly.
    pub entry_marker: Option<&'static str>,
    bools: [&'static str; 2],
    control_prefixes: &'static [&'static str],
    assign_patterns: Vec<Regex>,
    print_pattern: Regex,
    print_style: PrintStyle,
}

impl LineRules {
    /// Extract `(name, value expression)` from an assignment line.
    pub fn assignment(&self, line: &str) -> Option<(String, String)> {
        for re in &self.assign_patterns {
            if let Some(caps) = re.captures(line) {
                let name = caps.get(1)?.as_str().to_string();
                let value = caps.get(2)?.as_str().trim().to_string();
                return Some((name, value));
            }
        }
        None
    }

    pub fn evaluate(&self, expr: &str, vars: &BTreeMap<String, ScopeValue>) -> ScopeValue {
        evaluate_expression(expr, vars, self.bools)
    }

    /// Render the value a print line would emit, or `None` if the line does
    /// not print.
    pub fn print_value(
        &self,
        line: &str,
        vars: &BTreeMap<String, ScopeValue>,
    ) -> Option<ScopeValue> {
        let caps = self.print_pattern.captures(line)?;
        let arg = caps.get(1)?.as_str().trim();
        Some(match self.print_style {
            PrintStyle::Python => self.render_python(arg, vars),
            PrintStyle::Go => self.render_go(arg, vars),
            PrintStyle::RustFormat => self.render_rust_format(arg, vars),
            PrintStyle::CppStream => self.render_cpp_stream(arg, vars),
        })
    }

    pub fn is_control(&self, line: &str) -> bool {
        self.control_prefixes
            .iter()
            .any(|p| line.starts_with(p) || line == p.trim_end())
    }

    /// Generic call heuristic for languages with top-level execution.
    pub fn is_bare_call(&self, line: &str) -> bool {
        self.language == Language::Python
            && line.contains('(')
            && !line.contains("print")
            && !line.contains('=')
    }

    fn render_python(&self, arg: &str, vars: &BTreeMap<String, ScopeValue>) -> ScopeValue {
        if arg.contains('+') {
            let rendered: String = arg
                .split('+')
                .map(|part| resolve(part, vars, self.bools).output_string())
                .collect();
            return ScopeValue::Str(rendered);
        }
        if let Some(value) = vars.get(arg) {
            return value.clone();
        }
        if arg.contains(',') {
            return ScopeValue::Str(self.join_comma_args(arg, vars));
        }
        parse_literal(arg, self.bools)
    }

    fn render_go(&self, arg: &str, vars: &BTreeMap<String, ScopeValue>) -> ScopeValue {
        if let Some(value) = vars.get(arg) {
            return value.clone();
        }
        if arg.contains(',') {
            return ScopeValue::Str(self.join_comma_args(arg, vars));
        }
        parse_literal(arg, self.bools)
    }

    /// Fill `{}` and `{name}` holes of the leading format string.
    fn render_rust_format(&self, arg: &str, vars: &BTreeMap<String, ScopeValue>) -> ScopeValue {
        let Some(rest) = arg.strip_prefix('"') else {
            return resolve(arg, vars, self.bools);
        };
        let Some(close) = rest.find('"') else {
            return resolve(arg, vars, self.bools);
        };
        let fmt = &rest[..close];
        let tail = rest[close + 1..].trim_start_matches(',').trim();
        let mut positional = tail
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let mut out = String::new();
        let mut chars = fmt.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '{' {
                out.push(c);
                continue;
            }
            let mut hole = String::new();
            for h in chars.by_ref() {
                if h == '}' {
                    break;
                }
                hole.push(h);
            }
            let rendered = if hole.is_empty() {
                positional
                    .next()
                    .map(|expr| evaluate_expression(expr, vars, self.bools).output_string())
            } else {
                vars.get(hole.as_str()).map(ScopeValue::output_string)
            };
            match rendered {
                Some(s) => out.push_str(&s),
                None => {
                    out.push('{');
                    out.push_str(&hole);
                    out.push('}');
                }
            }
        }
        ScopeValue::Str(out)
    }

    fn render_cpp_stream(&self, arg: &str, vars: &BTreeMap<String, ScopeValue>) -> ScopeValue {
        let rendered: String = arg
            .split("<<")
            .map(str::trim)
            .filter(|seg| !seg.is_empty() && *seg != "std::endl" && *seg != "endl")
            .map(|seg| resolve(seg, vars, self.bools).output_string())
            .collect();
        ScopeValue::Str(rendered)
    }

    fn join_comma_args(&self, arg: &str, vars: &BTreeMap<String, ScopeValue>) -> String {
        arg.split(',')
            .map(|part| resolve(part, vars, self.bools).output_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Rules for a heuristic language; `None` for the dynamically executed one.
pub fn rules_for(language: Language) -> Option<&'static LineRules> {
    static RULES: OnceLock<FxHashMap<Language, LineRules>> = OnceLock::new();
    RULES.get_or_init(build_rules).get(&language)
}

fn build_rules() -> FxHashMap<Language, LineRules> {
    let mut map = FxHashMap::default();

    map.insert(
        Language::Python,
        LineRules {
            language: Language::Python,
            comment_prefix: "#",
            entry_marker: None,
            bools: ["True", "False"],
            control_prefixes: &["if ", "elif ", "else", "for ", "while "],
            assign_patterns: vec![regex(r"^([A-Za-z_]\w*)\s*=\s*([^=].*)$")],
            print_pattern: regex(r"print\((.+)\)"),
            print_style: PrintStyle::Python,
        },
    );

    map.insert(
        Language::Go,
        LineRules {
            language: Language::Go,
            comment_prefix: "//",
            entry_marker: Some("func main()"),
            bools: ["true", "false"],
            control_prefixes: &["for ", "for{", "if "],
            assign_patterns: vec![
                regex(r"^([A-Za-z_]\w*)\s*:=\s*(.+)$"),
                regex(r"^var\s+([A-Za-z_]\w*)(?:\s+[\w\[\]]+)?\s*=\s*(.+)$"),
            ],
            print_pattern: regex(r"fmt\.Println\((.+)\)"),
            print_style: PrintStyle::Go,
        },
    );

    map.insert(
        Language::Rust,
        LineRules {
            language: Language::Rust,
            comment_prefix: "//",
            entry_marker: Some("fn main("),
            bools: ["true", "false"],
            control_prefixes: &["if ", "for ", "while "],
            assign_patterns: vec![
                regex(r"^let\s+(?:mut\s+)?([A-Za-z_]\w*)(?::[^=]+)?\s*=\s*(.+);"),
                regex(r"^([A-Za-z_]\w*)\s*=\s*([^=].*);"),
            ],
            print_pattern: regex(r"println!\((.+)\)"),
            print_style: PrintStyle::RustFormat,
        },
    );

    map.insert(
        Language::Cpp,
        LineRules {
            language: Language::Cpp,
            comment_prefix: "//",
            entry_marker: Some("int main("),
            bools: ["true", "false"],
            control_prefixes: &["if ", "if(", "for ", "for(", "while ", "while("],
            assign_patterns: vec![regex(
                r"^(?:int|float|double|char|bool|auto|std::string|string)\s+([A-Za-z_]\w*)\s*=\s*(.+);",
            )],
            print_pattern: regex(r"std::cout\s*<<\s*(.+?);?\s*$"),
            print_style: PrintStyle::CppStream,
        },
    );

    map
}

fn regex(pattern: &str) -> Regex {
    // Patterns are compile-time constants; a failure here is a programming
    // error caught by the rule tests.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid rule pattern {}: {}", pattern, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> BTreeMap<String, ScopeValue> {
        let mut m = BTreeMap::new();
        m.insert("total".to_string(), ScopeValue::Num(15.0));
        m.insert("name".to_string(), ScopeValue::Str("Ada".into()));
        m
    }

    #[test]
    fn python_assignment_and_print() {
        let r = rules_for(Language::Python).unwrap();
        assert_eq!(
            r.assignment("x = a + b"),
            Some(("x".to_string(), "a + b".to_string()))
        );
        assert_eq!(r.assignment("x == y"), None);
        assert_eq!(
            r.print_value("print(total)", &vars()),
            Some(ScopeValue::Num(15.0))
        );
        assert_eq!(
            r.print_value("print(\"Total:\", total)", &vars()),
            Some(ScopeValue::Str("Total: 15".into()))
        );
        assert_eq!(
            r.print_value("print(\"Hello, \" + name)", &vars()),
            Some(ScopeValue::Str("Hello, Ada".into()))
        );
    }

    #[test]
    fn go_short_declaration_and_println() {
        let r = rules_for(Language::Go).unwrap();
        assert_eq!(
            r.assignment("sum := a + b"),
            Some(("sum".to_string(), "a + b".to_string()))
        );
        assert_eq!(
            r.assignment("var count int = 3"),
            Some(("count".to_string(), "3".to_string()))
        );
        assert_eq!(
            r.print_value("fmt.Println(\"total is\", total)", &vars()),
            Some(ScopeValue::Str("total is 15".into()))
        );
    }

    #[test]
    fn rust_let_binding_and_format_holes() {
        let r = rules_for(Language::Rust).unwrap();
        assert_eq!(
            r.assignment("let mut total = 0;"),
            Some(("total".to_string(), "0".to_string()))
        );
        assert_eq!(
            r.print_value("println!(\"total = {}\", total);", &vars()),
            Some(ScopeValue::Str("total = 15".into()))
        );
        assert_eq!(
            r.print_value("println!(\"hi {name}\");", &vars()),
            Some(ScopeValue::Str("hi Ada".into()))
        );
    }

    #[test]
    fn cpp_declaration_and_stream() {
        let r = rules_for(Language::Cpp).unwrap();
        assert_eq!(
            r.assignment("int a = 15;"),
            Some(("a".to_string(), "15".to_string()))
        );
        assert_eq!(
            r.print_value("std::cout << \"total = \" << total << std::endl;", &vars()),
            Some(ScopeValue::Str("total = 15".into()))
        );
    }

    #[test]
    fn javascript_has_no_line_rules() {
        assert!(rules_for(Language::Javascript).is_none());
    }
}
