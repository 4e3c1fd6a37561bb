//! Per-language grammar descriptions
//!
//! A [`Grammar`] tells the tolerant scanner how a language is shaped (comment
//! prefix, brace vs. indent blocks, string quotes) and how to classify one
//! logical statement into a tree-sitter-style node kind. Kinds follow the
//! naming of the real tree-sitter grammars so downstream tables read
//! naturally (`function_item` for Rust, `function_definition` for Python...).

use crate::language::Language;
use std::fmt;

/// How a language delimits nested blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Braces,
    Indent,
}

/// Result of classifying one statement line.
#[derive(Debug, Clone)]
pub struct Classified {
    pub kind: &'static str,
    pub name: Option<String>,
}

impl Classified {
    fn plain(kind: &'static str) -> Self {
        Classified { kind, name: None }
    }

    fn named(kind: &'static str, name: Option<String>) -> Self {
        Classified { kind, name }
    }
}

/// Loaded grammar for one guest language.
pub struct Grammar {
    pub language: Language,
    pub root_kind: &'static str,
    pub block_style: BlockStyle,
    pub line_comment: &'static str,
    pub string_quotes: &'static [char],
    /// Every kind the classifier can produce; structural queries are
    /// validated against this list.
    pub known_kinds: &'static [&'static str],
    classify: fn(&str) -> Classified,
}

impl Grammar {
    pub fn classify(&self, statement: &str) -> Classified {
        (self.classify)(statement)
    }

    pub fn knows_kind(&self, kind: &str) -> bool {
        self.known_kinds.contains(&kind)
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("language", &self.language)
            .field("block_style", &self.block_style)
            .finish()
    }
}

/// Build the grammar for a language. Returns `None` when no grammar is
/// bundled (cannot happen for the closed five-language set, but the registry
/// keeps the failure path honest).
pub fn load(language: Language) -> Option<Grammar> {
    let grammar = match language {
        Language::Javascript => Grammar {
            language,
            root_kind: "program",
            block_style: BlockStyle::Braces,
            line_comment: "//",
            string_quotes: &['"', '\'', '`'],
            known_kinds: &[
                "program",
                "function_declaration",
                "variable_declaration",
                "lexical_declaration",
                "assignment_expression",
                "call_expression",
                "if_statement",
                "for_statement",
                "while_statement",
                "return_statement",
                "expression_statement",
            ],
            classify: classify_javascript,
        },
        Language::Python => Grammar {
            language,
            root_kind: "module",
            block_style: BlockStyle::Indent,
            line_comment: "#",
            string_quotes: &['"', '\''],
            known_kinds: &[
                "module",
                "function_definition",
                "class_definition",
                "assignment",
                "call",
                "assert_statement",
                "if_statement",
                "for_statement",
                "while_statement",
                "return_statement",
                "expression_statement",
            ],
            classify: classify_python,
        },
        Language::Go => Grammar {
            language,
            root_kind: "source_file",
            block_style: BlockStyle::Braces,
            line_comment: "//",
            string_quotes: &['"', '`'],
            known_kinds: &[
                "source_file",
                "package_clause",
                "import_declaration",
                "function_declaration",
                "type_declaration",
                "short_var_declaration",
                "var_declaration",
                "assignment_statement",
                "call_expression",
                "if_statement",
                "for_statement",
                "return_statement",
                "expression_statement",
            ],
            classify: classify_go,
        },
        Language::Rust => Grammar {
            language,
            root_kind: "source_file",
            block_style: BlockStyle::Braces,
            line_comment: "//",
            string_quotes: &['"'],
            known_kinds: &[
                "source_file",
                "function_item",
                "struct_item",
                "let_declaration",
                "assignment_expression",
                "call_expression",
                "if_expression",
                "for_expression",
                "while_expression",
                "return_expression",
                "expression_statement",
            ],
            classify: classify_rust,
        },
        Language::Cpp => Grammar {
            language,
            root_kind: "translation_unit",
            block_style: BlockStyle::Braces,
            line_comment: "//",
            string_quotes: &['"', '\''],
            known_kinds: &[
                "translation_unit",
                "preproc_include",
                "function_definition",
                "class_specifier",
                "declaration",
                "assignment_expression",
                "call_expression",
                "if_statement",
                "for_statement",
                "while_statement",
                "return_statement",
                "expression_statement",
            ],
            classify: classify_cpp,
        },
    };
    Some(grammar)
}

/// First identifier found after `prefix` in `text`.
fn ident_after(text: &str, prefix: &str) -> Option<String> {
    let rest = text.strip_prefix(prefix)?;
    let rest = rest.trim_start();
    let ident: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if ident.is_empty() { None } else { Some(ident) }
}

/// Identifier directly preceding the first `(`, i.e. a call target.
fn call_target(text: &str) -> Option<String> {
    let paren = text.find('(')?;
    let head = &text[..paren];
    let ident: String = head
        .chars()
        .rev()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if ident.is_empty() { None } else { Some(ident) }
}

/// Identifier on the left of a single (non-comparison) `=`.
fn assign_target(text: &str) -> Option<String> {
    let eq = text.find('=')?;
    if text.as_bytes().get(eq + 1) == Some(&b'=') {
        return None;
    }
    if eq > 0 && matches!(text.as_bytes()[eq - 1], b'!' | b'<' | b'>' | b'+' | b'-' | b'*' | b'/') {
        return None;
    }
    let head = text[..eq].trim_end();
    let ident: String = head
        .chars()
        .rev()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if ident.is_empty() { None } else { Some(ident) }
}

fn classify_javascript(s: &str) -> Classified {
    if let Some(name) = ident_after(s, "function ") {
        return Classified::named("function_declaration", Some(name));
    }
    if s.starts_with("var ") {
        return Classified::named("variable_declaration", ident_after(s, "var "));
    }
    if s.starts_with("let ") || s.starts_with("const ") {
        let name = ident_after(s, "let ").or_else(|| ident_after(s, "const "));
        return Classified::named("lexical_declaration", name);
    }
    if s.starts_with("if ") || s.starts_with("if(") {
        return Classified::plain("if_statement");
    }
    if s.starts_with("for ") || s.starts_with("for(") {
        return Classified::plain("for_statement");
    }
    if s.starts_with("while ") || s.starts_with("while(") {
        return Classified::plain("while_statement");
    }
    if s.starts_with("return") {
        return Classified::plain("return_statement");
    }
    if let Some(target) = assign_target(s) {
        return Classified::named("assignment_expression", Some(target));
    }
    if s.contains('(') {
        return Classified::named("call_expression", call_target(s));
    }
    Classified::plain("expression_statement")
}

fn classify_python(s: &str) -> Classified {
    if let Some(name) = ident_after(s, "def ") {
        return Classified::named("function_definition", Some(name));
    }
    if let Some(name) = ident_after(s, "class ") {
        return Classified::named("class_definition", Some(name));
    }
    if s.starts_with("assert ") || s == "assert" {
        return Classified::plain("assert_statement");
    }
    if s.starts_with("if ") || s.starts_with("elif ") || s == "else:" {
        return Classified::plain("if_statement");
    }
    if s.starts_with("for ") {
        return Classified::plain("for_statement");
    }
    if s.starts_with("while ") {
        return Classified::plain("while_statement");
    }
    if s.starts_with("return") {
        return Classified::plain("return_statement");
    }
    if let Some(target) = assign_target(s) {
        return Classified::named("assignment", Some(target));
    }
    if s.contains('(') {
        return Classified::named("call", call_target(s));
    }
    Classified::plain("expression_statement")
}

fn classify_go(s: &str) -> Classified {
    if s.starts_with("package ") {
        return Classified::plain("package_clause");
    }
    if s.starts_with("import") {
        return Classified::plain("import_declaration");
    }
    if s.starts_with("func ") {
        return Classified::named("function_declaration", ident_after(s, "func "));
    }
    if s.starts_with("type ") {
        return Classified::named("type_declaration", ident_after(s, "type "));
    }
    if s.starts_with("if ") {
        return Classified::plain("if_statement");
    }
    if s.starts_with("for ") || s == "for {" {
        return Classified::plain("for_statement");
    }
    if s.starts_with("return") {
        return Classified::plain("return_statement");
    }
    if let Some(pos) = s.find(":=") {
        let name: String = s[..pos]
            .trim_end()
            .chars()
            .rev()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        let name = if name.is_empty() { None } else { Some(name) };
        return Classified::named("short_var_declaration", name);
    }
    if s.starts_with("var ") {
        return Classified::named("var_declaration", ident_after(s, "var "));
    }
    if let Some(target) = assign_target(s) {
        return Classified::named("assignment_statement", Some(target));
    }
    if s.contains('(') {
        return Classified::named("call_expression", call_target(s));
    }
    Classified::plain("expression_statement")
}

fn classify_rust(s: &str) -> Classified {
    if s.starts_with("fn ") || s.starts_with("pub fn ") {
        let name = ident_after(s, "fn ").or_else(|| ident_after(s, "pub fn "));
        return Classified::named("function_item", name);
    }
    if s.starts_with("struct ") || s.starts_with("pub struct ") {
        let name = ident_after(s, "struct ").or_else(|| ident_after(s, "pub struct "));
        return Classified::named("struct_item", name);
    }
    if s.starts_with("let ") {
        let name = ident_after(s, "let mut ").or_else(|| ident_after(s, "let "));
        return Classified::named("let_declaration", name);
    }
    if s.starts_with("if ") {
        return Classified::plain("if_expression");
    }
    if s.starts_with("for ") {
        return Classified::plain("for_expression");
    }
    if s.starts_with("while ") {
        return Classified::plain("while_expression");
    }
    if s.starts_with("return") {
        return Classified::plain("return_expression");
    }
    if let Some(target) = assign_target(s) {
        return Classified::named("assignment_expression", Some(target));
    }
    if s.contains('(') {
        return Classified::named("call_expression", call_target(s));
    }
    Classified::plain("expression_statement")
}

const CPP_TYPE_KEYWORDS: [&str; 8] = [
    "int", "float", "double", "char", "bool", "auto", "void", "std::string",
];

fn cpp_leading_type(s: &str) -> Option<&str> {
    CPP_TYPE_KEYWORDS
        .iter()
        .find(|kw| {
            s.strip_prefix(*kw)
                .is_some_and(|rest| rest.starts_with(' ') || rest.starts_with('*'))
        })
        .copied()
}

fn classify_cpp(s: &str) -> Classified {
    if s.starts_with("#include") {
        return Classified::plain("preproc_include");
    }
    if s.starts_with("class ") || s.starts_with("struct ") {
        let name = ident_after(s, "class ").or_else(|| ident_after(s, "struct "));
        return Classified::named("class_specifier", name);
    }
    if s.starts_with("if ") || s.starts_with("if(") {
        return Classified::plain("if_statement");
    }
    if s.starts_with("for ") || s.starts_with("for(") {
        return Classified::plain("for_statement");
    }
    if s.starts_with("while ") || s.starts_with("while(") {
        return Classified::plain("while_statement");
    }
    if s.starts_with("return") {
        return Classified::plain("return_statement");
    }
    if let Some(kw) = cpp_leading_type(s) {
        let rest = s[kw.len()..].trim_start_matches([' ', '*']);
        let name: String = rest
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        let name = if name.is_empty() { None } else { Some(name) };
        // A parameter list with no trailing semicolon opens a function body.
        if s.contains('(') && !s.ends_with(';') {
            return Classified::named("function_definition", name);
        }
        return Classified::named("declaration", name);
    }
    if let Some(target) = assign_target(s) {
        return Classified::named("assignment_expression", Some(target));
    }
    if s.contains('(') || s.contains("<<") {
        return Classified::named("call_expression", call_target(s));
    }
    Classified::plain("expression_statement")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_classification() {
        let g = load(Language::Python).unwrap();
        assert_eq!(g.classify("def greet(name):").kind, "function_definition");
        assert_eq!(
            g.classify("def greet(name):").name.as_deref(),
            Some("greet")
        );
        assert_eq!(g.classify("x = a + b").kind, "assignment");
        assert_eq!(g.classify("print(x)").kind, "call");
        assert_eq!(g.classify("print(x)").name.as_deref(), Some("print"));
        assert_eq!(g.classify("assert x > 0").kind, "assert_statement");
        assert_eq!(g.classify("x == y").kind, "expression_statement");
    }

    #[test]
    fn rust_classification() {
        let g = load(Language::Rust).unwrap();
        assert_eq!(g.classify("fn main() {").kind, "function_item");
        assert_eq!(g.classify("fn main() {").name.as_deref(), Some("main"));
        let c = g.classify("let mut total = 0;");
        assert_eq!(c.kind, "let_declaration");
        assert_eq!(c.name.as_deref(), Some("total"));
    }

    #[test]
    fn go_short_declaration() {
        let g = load(Language::Go).unwrap();
        let c = g.classify("sum := a + b");
        assert_eq!(c.kind, "short_var_declaration");
        assert_eq!(c.name.as_deref(), Some("sum"));
    }

    #[test]
    fn cpp_function_vs_declaration() {
        let g = load(Language::Cpp).unwrap();
        assert_eq!(g.classify("int main() {").kind, "function_definition");
        assert_eq!(g.classify("int a = 15;").kind, "declaration");
        assert_eq!(g.classify("int a = 15;").name.as_deref(), Some("a"));
    }

    #[test]
    fn javascript_var_vs_lexical() {
        let g = load(Language::Javascript).unwrap();
        assert_eq!(g.classify("var a = 1;").kind, "variable_declaration");
        assert_eq!(g.classify("const b = 2;").kind, "lexical_declaration");
        assert_eq!(g.classify("eval(code)").kind, "call_expression");
        assert_eq!(g.classify("eval(code)").name.as_deref(), Some("eval"));
    }
}
