//! Syntax-tree execution simulator
//!
//! The alternative heuristic strategy: instead of scanning raw lines it walks
//! the parsed tree in two passes. Pass one records every top-level
//! declaration (functions, types) except the entry function. Pass two finds
//! the entry point, emits a start-of-execution step, and then classifies the
//! executable statements under it into phases, tracking assigned names as
//! raw text values.

use crate::language::Language;
use crate::parse::tree::{NodeId, SyntaxTree};
use crate::step::{
    ensure_final_output, ExecutionContext, ExecutionStep, NodeStep, Phase, Scope, ScopeValue,
};
use std::collections::BTreeMap;
use std::collections::VecDeque;

struct KindTable {
    functions: &'static [&'static str],
    types: &'static [&'static str],
    assignments: &'static [&'static str],
    calls: &'static [&'static str],
    loops: &'static [&'static str],
    conditions: &'static [&'static str],
    returns: &'static [&'static str],
    other_executable: &'static [&'static str],
}

fn kind_table(language: Language) -> Option<&'static KindTable> {
    match language {
        Language::Python => Some(&KindTable {
            functions: &["function_definition"],
            types: &["class_definition"],
            assignments: &["assignment"],
            calls: &["call"],
            loops: &["for_statement", "while_statement"],
            conditions: &["if_statement"],
            returns: &["return_statement"],
            other_executable: &["expression_statement", "assert_statement"],
        }),
        Language::Go => Some(&KindTable {
            functions: &["function_declaration"],
            types: &["type_declaration"],
            assignments: &["short_var_declaration", "var_declaration", "assignment_statement"],
            calls: &["call_expression"],
            loops: &["for_statement"],
            conditions: &["if_statement"],
            returns: &["return_statement"],
            other_executable: &["expression_statement"],
        }),
        Language::Rust => Some(&KindTable {
            functions: &["function_item"],
            types: &["struct_item"],
            assignments: &["let_declaration", "assignment_expression"],
            calls: &["call_expression"],
            loops: &["for_expression", "while_expression"],
            conditions: &["if_expression"],
            returns: &["return_expression"],
            other_executable: &["expression_statement"],
        }),
        Language::Cpp => Some(&KindTable {
            functions: &["function_definition"],
            types: &["class_specifier"],
            assignments: &["declaration", "assignment_expression"],
            calls: &["call_expression"],
            loops: &["for_statement", "while_statement"],
            conditions: &["if_statement"],
            returns: &["return_statement"],
            other_executable: &["expression_statement"],
        }),
        Language::Javascript => None,
    }
}

pub fn simulate_tree(tree: &SyntaxTree, language: Language) -> Vec<ExecutionStep> {
    let Some(table) = kind_table(language) else {
        return Vec::new();
    };

    let mut steps: Vec<ExecutionStep> = Vec::new();
    let mut vars: BTreeMap<String, ScopeValue> = BTreeMap::new();

    collect_declarations(tree, language, table, &mut steps, &vars);

    if let Some(entry) = find_entry_point(tree, language, table) {
        simulate_from_entry(tree, entry, table, &mut steps, &mut vars);
    }

    ensure_final_output(&mut steps);
    steps
}

fn push_step(
    steps: &mut Vec<ExecutionStep>,
    tree: &SyntaxTree,
    id: NodeId,
    phase: Phase,
    description: String,
    vars: &BTreeMap<String, ScopeValue>,
) {
    let node = tree.node(id);
    let step = steps.len();
    steps.push(ExecutionStep::Node(NodeStep {
        step,
        node: id,
        context: ExecutionContext {
            phase,
            description,
            line_number: node.line,
            code_snippet: node.snippet().to_string(),
            variables: Scope::with_vars(vars.clone()),
        },
        issues: Vec::new(),
    }));
}

/// First pass: one declaration step per non-entry function and type.
fn collect_declarations(
    tree: &SyntaxTree,
    language: Language,
    table: &KindTable,
    steps: &mut Vec<ExecutionStep>,
    vars: &BTreeMap<String, ScopeValue>,
) {
    let verb = match language {
        Language::Go => "Declare",
        _ => "Define",
    };
    for id in tree.walk() {
        let node = tree.node(id);
        let name = node.name.as_deref().unwrap_or("<anonymous>");
        if table.functions.contains(&node.kind) {
            if name == "main" {
                continue;
            }
            push_step(
                steps,
                tree,
                id,
                Phase::Declaration,
                format!("{} function {}", verb, name),
                vars,
            );
        } else if table.types.contains(&node.kind) {
            push_step(
                steps,
                tree,
                id,
                Phase::Declaration,
                format!("{} {} {}", verb, type_noun(language), name),
                vars,
            );
        }
    }
}

fn type_noun(language: Language) -> &'static str {
    match language {
        Language::Rust => "struct",
        Language::Go => "type",
        _ => "class",
    }
}

/// The entry node: a function named `main`, or for top-level languages the
/// `__name__` guard.
fn find_entry_point(tree: &SyntaxTree, language: Language, table: &KindTable) -> Option<NodeId> {
    tree.walk().find(|&id| {
        let node = tree.node(id);
        if table.functions.contains(&node.kind) && node.name.as_deref() == Some("main") {
            return true;
        }
        language == Language::Python
            && node.kind == "if_statement"
            && node.text.contains("__name__")
    })
}

fn simulate_from_entry(
    tree: &SyntaxTree,
    entry: NodeId,
    table: &KindTable,
    steps: &mut Vec<ExecutionStep>,
    vars: &mut BTreeMap<String, ScopeValue>,
) {
    let entry_name = tree
        .node(entry)
        .name
        .clone()
        .unwrap_or_else(|| "main".to_string());
    push_step(
        steps,
        tree,
        entry,
        Phase::Execution,
        format!("Start execution of {}", entry_name),
        vars,
    );

    // Statements under the entry node, in source order.
    let mut worklist: VecDeque<NodeId> = tree.node(entry).children.iter().copied().collect();
    while let Some(id) = worklist.pop_front() {
        let node = tree.node(id);
        let kind = node.kind;

        if table.assignments.contains(&kind) {
            let name = node.name.clone().unwrap_or_else(|| "<unknown>".to_string());
            let value = assigned_value(&node.text);
            vars.insert(name.clone(), ScopeValue::Raw(value.clone()));
            push_step(
                steps,
                tree,
                id,
                Phase::Assignment,
                format!("Assign {} to {}", value, name),
                vars,
            );
        } else if table.calls.contains(&kind) {
            let target = node.name.as_deref().unwrap_or("<unknown>");
            push_step(
                steps,
                tree,
                id,
                Phase::Call,
                format!("Call function {}", target),
                vars,
            );
        } else if table.loops.contains(&kind) {
            push_step(
                steps,
                tree,
                id,
                Phase::Loop,
                "Execute loop".to_string(),
                vars,
            );
        } else if table.conditions.contains(&kind) {
            push_step(
                steps,
                tree,
                id,
                Phase::Condition,
                "Evaluate if condition".to_string(),
                vars,
            );
        } else if table.returns.contains(&kind) {
            push_step(
                steps,
                tree,
                id,
                Phase::Return,
                format!("Return from {}", entry_name),
                vars,
            );
        } else if table.other_executable.contains(&kind) {
            push_step(
                steps,
                tree,
                id,
                Phase::Execution,
                format!("Execute {}", kind),
                vars,
            );
        }

        for &child in node.children.iter().rev() {
            worklist.push_front(child);
        }
    }
}

/// Text after the first `=`, the simulator's stand-in for evaluating the
/// right-hand side.
fn assigned_value(text: &str) -> String {
    text.split_once('=')
        .map(|(_, rhs)| rhs.trim().trim_end_matches(';').trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ParserAdapter;

    fn parse(code: &str, language: Language) -> SyntaxTree {
        ParserAdapter::new().parse(code, language).unwrap()
    }

    fn phases(steps: &[ExecutionStep]) -> Vec<Phase> {
        steps
            .iter()
            .map(|s| match s {
                ExecutionStep::Node(n) => n.context.phase,
                ExecutionStep::Line(_) => panic!("expected node steps"),
            })
            .collect()
    }

    #[test]
    fn rust_main_produces_entry_and_statements() {
        let code = "fn helper() {\n    let x = 1;\n}\n\nfn main() {\n    let a = 2;\n    helper();\n}";
        let tree = parse(code, Language::Rust);
        let steps = simulate_tree(&tree, Language::Rust);
        let ph = phases(&steps);
        assert_eq!(
            ph,
            vec![
                Phase::Declaration,
                Phase::Execution,
                Phase::Assignment,
                Phase::Call
            ]
        );
        match &steps[1] {
            ExecutionStep::Node(n) => {
                assert_eq!(n.context.description, "Start execution of main");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn assignment_tracks_variable_text() {
        let code = "fn main() {\n    let total = 20 + 5;\n}";
        let tree = parse(code, Language::Rust);
        let steps = simulate_tree(&tree, Language::Rust);
        let last = steps.last().unwrap();
        assert_eq!(
            last.scope().vars.get("total"),
            Some(&ScopeValue::Raw("20 + 5".into()))
        );
        assert_eq!(last.line_number(), 2);
        match last {
            ExecutionStep::Node(n) => {
                assert_eq!(n.context.code_snippet, "let total = 20 + 5;");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn python_name_guard_is_the_entry() {
        let code = "def run():\n    pass\n\nif __name__ == \"__main__\":\n    run()";
        let tree = parse(code, Language::Python);
        let steps = simulate_tree(&tree, Language::Python);
        let ph = phases(&steps);
        assert_eq!(ph[0], Phase::Declaration);
        assert_eq!(ph[1], Phase::Execution);
        assert!(ph.contains(&Phase::Call));
    }

    #[test]
    fn python_without_entry_yields_declarations_only() {
        let code = "def run():\n    pass";
        let tree = parse(code, Language::Python);
        let steps = simulate_tree(&tree, Language::Python);
        assert_eq!(phases(&steps), vec![Phase::Declaration]);
    }

    #[test]
    fn go_declarations_use_declare_verb() {
        let code = "package main\n\nfunc helper() {\n}\n\nfunc main() {\n\tx := 1\n}";
        let tree = parse(code, Language::Go);
        let steps = simulate_tree(&tree, Language::Go);
        match &steps[0] {
            ExecutionStep::Node(n) => {
                assert_eq!(n.context.description, "Declare function helper");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn javascript_is_not_tree_simulated() {
        let tree = parse("var a = 1;", Language::Javascript);
        assert!(simulate_tree(&tree, Language::Javascript).is_empty());
    }
}
