//! Advisory linter
//!
//! A fixed rule set is matched against the parsed tree. Each rule names the
//! node kind it wants plus optional constraints on the node's captured name
//! or raw text; a rule whose kind the language's grammar does not know is a
//! rule bug, and it is logged and skipped without disturbing the other
//! rules. Findings never block a run.

use crate::language::Language;
use crate::parse::grammar::Grammar;
use crate::parse::tree::SyntaxTree;
use crate::step::{IssueKind, LinterIssue};

/// Structural match over tree nodes, a fixed-shape stand-in for a full query
/// language.
struct StructuralQuery {
    node_kind: &'static str,
    name_equals: Option<&'static str>,
    text_contains: Option<&'static str>,
}

struct LintRule {
    language: Language,
    query: StructuralQuery,
    kind: IssueKind,
    message: fn(&str) -> String,
}

const RULES: &[LintRule] = &[
    LintRule {
        language: Language::Javascript,
        query: StructuralQuery {
            node_kind: "call_expression",
            name_equals: Some("eval"),
            text_contains: None,
        },
        kind: IssueKind::Security,
        message: |_| "`eval()` can be dangerous and should be avoided.".to_string(),
    },
    LintRule {
        language: Language::Javascript,
        query: StructuralQuery {
            node_kind: "variable_declaration",
            name_equals: None,
            text_contains: None,
        },
        kind: IssueKind::Style,
        message: |name| format!("Prefer 'const' or 'let' over 'var' for declaration '{}'.", name),
    },
    LintRule {
        language: Language::Python,
        query: StructuralQuery {
            node_kind: "assert_statement",
            name_equals: None,
            text_contains: None,
        },
        kind: IssueKind::Perf,
        message: |_| {
            "`assert` statements are removed in production builds; use exceptions for checks."
                .to_string()
        },
    },
    LintRule {
        language: Language::Cpp,
        query: StructuralQuery {
            node_kind: "call_expression",
            name_equals: None,
            text_contains: Some("std::endl"),
        },
        kind: IssueKind::Perf,
        message: |_| "`std::endl` flushes the stream; prefer '\\n' in hot paths.".to_string(),
    },
];

/// Match every rule for `language` against the tree.
pub fn run_linter(tree: &SyntaxTree, grammar: &Grammar, language: Language) -> Vec<LinterIssue> {
    let mut issues = Vec::new();

    for rule in RULES.iter().filter(|r| r.language == language) {
        if !grammar.knows_kind(rule.query.node_kind) {
            tracing::error!(
                language = %language,
                kind = rule.query.node_kind,
                "lint rule references a node kind unknown to the grammar; skipping"
            );
            continue;
        }
        for id in tree.walk() {
            let node = tree.node(id);
            if node.kind != rule.query.node_kind {
                continue;
            }
            if let Some(wanted) = rule.query.name_equals {
                if node.name.as_deref() != Some(wanted) {
                    continue;
                }
            }
            if let Some(needle) = rule.query.text_contains {
                if !node.text.contains(needle) {
                    continue;
                }
            }
            let capture = node.name.as_deref().unwrap_or(&node.text);
            issues.push(LinterIssue {
                kind: rule.kind,
                message: (rule.message)(capture),
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{grammar, ParserAdapter};

    fn lint(code: &str, language: Language) -> Vec<LinterIssue> {
        let tree = ParserAdapter::new().parse(code, language).unwrap();
        let g = grammar::load(language).unwrap();
        run_linter(&tree, &g, language)
    }

    #[test]
    fn flags_eval_as_security() {
        let issues = lint("eval(userInput)", Language::Javascript);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Security);
    }

    #[test]
    fn flags_var_with_name_in_message() {
        let issues = lint("var counter = 0;", Language::Javascript);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Style);
        assert!(issues[0].message.contains("'counter'"));
    }

    #[test]
    fn flags_python_assert() {
        let issues = lint("assert x > 0", Language::Python);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Perf);
    }

    #[test]
    fn flags_cpp_endl() {
        let code = "int main() {\n    std::cout << \"hi\" << std::endl;\n    return 0;\n}";
        let issues = lint(code, Language::Cpp);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Perf);
    }

    #[test]
    fn clean_code_has_no_findings() {
        assert!(lint("const a = 1;", Language::Javascript).is_empty());
        assert!(lint("x = 1\nprint(x)", Language::Python).is_empty());
    }
}
