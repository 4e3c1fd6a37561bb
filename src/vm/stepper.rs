//! Line-level stepping on top of the embedded VM
//!
//! The dynamic strategy never walks a syntax tree. The source is instrumented
//! textually: after every non-blank line a `__snapshot(N)` call is appended,
//! where N is the 1-based line number. The host registers `__snapshot` and a
//! `console.log` override as native hooks; each invocation records one
//! [`LineStep`] with a shallow dump of the globals at that moment. Console
//! writes record a step with line 0 carrying the logged values.
//!
//! On success the raw steps are normalized so the whole log lands on the last
//! step together with the joined `__finalOutput`. On any VM error the partial
//! steps are discarded and the error is returned whole.

use crate::step::{finalize_vm_steps, ExecutionStep, LineStep, Scope, ScopeValue};
use crate::vm::engine::Vm;
use crate::vm::error::VmError;
use crate::vm::value::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Append a snapshot call after every non-blank source line.
pub fn instrument(code: &str) -> String {
    let mut out = String::with_capacity(code.len() * 2);
    for (idx, line) in code.lines().enumerate() {
        out.push_str(line);
        out.push('\n');
        if !line.trim().is_empty() {
            out.push_str(&format!("__snapshot({});\n", idx + 1));
        }
    }
    out
}

/// Execute `code` under the VM and return its normalized step timeline.
pub fn run_dynamic(code: &str) -> Result<Vec<ExecutionStep>, VmError> {
    let steps: Rc<RefCell<Vec<ExecutionStep>>> = Rc::new(RefCell::new(Vec::new()));
    let counter: Rc<Cell<usize>> = Rc::new(Cell::new(0));

    let mut vm = Vm::new();

    let snap_steps = steps.clone();
    let snap_counter = counter.clone();
    vm.register_native(
        "__snapshot",
        Box::new(move |globals, args| {
            let line = match args.first() {
                Some(Value::Num(n)) => *n as usize,
                _ => 0,
            };
            let step = snap_counter.get();
            snap_counter.set(step + 1);
            snap_steps.borrow_mut().push(ExecutionStep::Line(LineStep {
                step,
                line,
                scope: Scope::with_vars(globals.clone()),
                issues: Vec::new(),
            }));
            Value::Undefined
        }),
    );

    let log_steps = steps.clone();
    let log_counter = counter.clone();
    vm.register_native(
        "console.log",
        Box::new(move |globals, args| {
            let entry = render_log_entry(args);
            let step = log_counter.get();
            log_counter.set(step + 1);
            let mut scope = Scope::with_vars(globals.clone());
            scope.log.push(entry);
            log_steps.borrow_mut().push(ExecutionStep::Line(LineStep {
                step,
                line: 0,
                scope,
                issues: Vec::new(),
            }));
            Value::Undefined
        }),
    );

    if let Err(e) = vm.eval(&instrument(code)) {
        // A failed run contributes no partial timeline.
        return Err(e);
    }
    drop(vm);

    let mut steps = Rc::try_unwrap(steps)
        .map(RefCell::into_inner)
        .unwrap_or_default();
    finalize_vm_steps(&mut steps);
    Ok(steps)
}

/// A single-argument log keeps its value type; multiple arguments collapse
/// into one space-joined string, console style.
fn render_log_entry(args: &[Value]) -> ScopeValue {
    if args.len() == 1 {
        if let Some(sv) = args[0].to_scope_value() {
            return sv;
        }
    }
    ScopeValue::Str(
        args.iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(" "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_skips_blank_lines() {
        let out = instrument("var a = 1;\n\nvar b = 2;");
        assert_eq!(out, "var a = 1;\n__snapshot(1);\n\nvar b = 2;\n__snapshot(3);\n");
    }

    #[test]
    fn one_line_two_statements_yields_two_steps() {
        let steps = run_dynamic("x = 1; console.log(x)").unwrap();
        assert_eq!(steps.len(), 2);
        // The console write lands first, addressed to line 0.
        assert_eq!(steps[0].line_number(), 0);
        assert_eq!(steps[1].line_number(), 1);
        let last = steps.last().unwrap();
        assert_eq!(last.final_output(), Some("1"));
        assert_eq!(last.scope().log, vec![ScopeValue::Num(1.0)]);
        assert_eq!(last.scope().vars.get("x"), Some(&ScopeValue::Num(1.0)));
    }

    #[test]
    fn snapshot_per_line_tracks_variable_growth() {
        let steps = run_dynamic("var a = 1;\nvar b = a + 1;").unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].line_number(), 1);
        assert_eq!(steps[0].scope().vars.len(), 1);
        assert_eq!(steps[1].line_number(), 2);
        assert_eq!(steps[1].scope().vars.get("b"), Some(&ScopeValue::Num(2.0)));
    }

    #[test]
    fn loop_produces_a_step_per_iteration() {
        let steps =
            run_dynamic("var t = 0;\nfor (var i = 0; i < 3; i++) {\nt += i;\n}").unwrap();
        // Line 1 once, then the body line snapshots on every iteration.
        assert!(steps.len() > 3);
        let last = steps.last().unwrap();
        assert_eq!(last.scope().vars.get("t"), Some(&ScopeValue::Num(3.0)));
    }

    #[test]
    fn runtime_error_discards_partial_steps() {
        let err = run_dynamic("var a = 1;\nmissing();").unwrap_err();
        assert!(matches!(err, VmError::NotCallable { .. }));
    }

    #[test]
    fn multi_arg_log_joins_with_spaces() {
        let steps = run_dynamic("console.log('a', 1, true)").unwrap();
        let last = steps.last().unwrap();
        assert_eq!(last.final_output(), Some("a 1 true"));
    }
}
