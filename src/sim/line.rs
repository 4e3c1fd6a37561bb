//! Line-pattern execution simulator
//!
//! The default heuristic strategy: walk the source line by line, track a flat
//! variable map, and emit a [`LineStep`] for every line that looks like it
//! does something (assignment, print, call, control flow). Languages with an
//! explicit entry function only start stepping once the entry line is seen;
//! the entry line itself becomes the first step.
//!
//! Logs are incremental: a print step carries only the entries it produced,
//! while every step's `__finalOutput` reflects the output so far.

use crate::language::Language;
use crate::sim::rules::rules_for;
use crate::step::{
    ensure_final_output, join_log, ExecutionStep, LineStep, Scope, ScopeValue,
};
use std::collections::BTreeMap;

pub fn simulate_lines(code: &str, language: Language) -> Vec<ExecutionStep> {
    let Some(rules) = rules_for(language) else {
        return Vec::new();
    };

    let mut steps: Vec<ExecutionStep> = Vec::new();
    let mut vars: BTreeMap<String, ScopeValue> = BTreeMap::new();
    let mut outputs: Vec<ScopeValue> = Vec::new();
    let mut in_entry = rules.entry_marker.is_none();

    let push = |steps: &mut Vec<ExecutionStep>,
                    line: usize,
                    vars: &BTreeMap<String, ScopeValue>,
                    log: Vec<ScopeValue>,
                    final_output: Option<String>| {
        let step = steps.len();
        steps.push(ExecutionStep::Line(LineStep {
            step,
            line,
            scope: Scope {
                vars: vars.clone(),
                log,
                final_output,
            },
            issues: Vec::new(),
        }));
    };

    for (idx, raw) in code.lines().enumerate() {
        let line = raw.trim();
        let line_number = idx + 1;

        if line.is_empty() || line.starts_with(rules.comment_prefix) {
            continue;
        }

        if let Some(marker) = rules.entry_marker {
            if line.contains(marker) {
                in_entry = true;
                // The entry line itself is the first visible step.
                push(&mut steps, line_number, &vars, outputs.clone(), None);
                continue;
            }
            if !in_entry {
                continue;
            }
        }

        if let Some((name, value_expr)) = rules.assignment(line) {
            let value = rules.evaluate(&value_expr, &vars);
            vars.insert(name, value);
            push(
                &mut steps,
                line_number,
                &vars,
                Vec::new(),
                Some(join_log(&outputs)),
            );
            continue;
        }

        if let Some(value) = rules.print_value(line, &vars) {
            outputs.push(value.clone());
            push(
                &mut steps,
                line_number,
                &vars,
                vec![value],
                Some(join_log(&outputs)),
            );
            continue;
        }

        if rules.is_control(line) || rules.is_bare_call(line) {
            push(
                &mut steps,
                line_number,
                &vars,
                Vec::new(),
                Some(join_log(&outputs)),
            );
        }
    }

    ensure_final_output(&mut steps);
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_assignment_and_print() {
        let code = "a = 1\nprint(a)";
        let steps = simulate_lines(code, Language::Python);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].line_number(), 1);
        assert_eq!(steps[0].scope().vars.get("a"), Some(&ScopeValue::Num(1.0)));
        assert_eq!(steps[1].scope().log, vec![ScopeValue::Num(1.0)]);
        assert_eq!(steps[1].final_output(), Some("1"));
    }

    #[test]
    fn python_arithmetic_folds_across_lines() {
        let code = "a = 2\nb = 3\nc = a * b\nprint(c)";
        let steps = simulate_lines(code, Language::Python);
        let last = steps.last().unwrap();
        assert_eq!(last.scope().vars.get("c"), Some(&ScopeValue::Num(6.0)));
        assert_eq!(last.final_output(), Some("6"));
    }

    #[test]
    fn go_steps_only_inside_main() {
        let code = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tx := 7\n\tfmt.Println(x)\n}";
        let steps = simulate_lines(code, Language::Go);
        assert_eq!(steps.len(), 3);
        // Entry step first, pointing at the func main() line.
        assert_eq!(steps[0].line_number(), 5);
        assert_eq!(steps[1].scope().vars.get("x"), Some(&ScopeValue::Num(7.0)));
        assert_eq!(steps[2].final_output(), Some("7"));
    }

    #[test]
    fn rust_let_bindings_and_println() {
        let code = "fn main() {\n    let a = 20;\n    let b = 5;\n    let total = a + b;\n    println!(\"total = {}\", total);\n}";
        let steps = simulate_lines(code, Language::Rust);
        assert_eq!(steps.len(), 5);
        let last = steps.last().unwrap();
        assert_eq!(
            last.scope().vars.get("total"),
            Some(&ScopeValue::Num(25.0))
        );
        assert_eq!(last.final_output(), Some("total = 25"));
    }

    #[test]
    fn cpp_stream_output() {
        let code = "#include <iostream>\n\nint main() {\n    int n = 3;\n    std::cout << \"n = \" << n << std::endl;\n    return 0;\n}";
        let steps = simulate_lines(code, Language::Cpp);
        let last = steps.last().unwrap();
        assert_eq!(last.final_output(), Some("n = 3"));
    }

    #[test]
    fn comments_and_blanks_produce_no_steps() {
        let code = "# intro\n\n# more\nx = 1";
        let steps = simulate_lines(code, Language::Python);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].line_number(), 4);
    }

    #[test]
    fn control_lines_step_without_output() {
        let code = "x = 5\nif x > 3:\n    print(x)";
        let steps = simulate_lines(code, Language::Python);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1].line_number(), 2);
        assert!(steps[1].scope().log.is_empty());
    }

    #[test]
    fn javascript_is_not_simulated() {
        assert!(simulate_lines("var a = 1;", Language::Javascript).is_empty());
    }
}
