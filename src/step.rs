//! The execution step model shared by both timeline strategies
//!
//! A run produces an ordered sequence of [`ExecutionStep`]s, all of the same
//! variant: [`LineStep`] for the dynamic VM (exact, line-addressed snapshots)
//! or [`NodeStep`] for the heuristic simulator (approximate, addressed into
//! the syntax tree). The final step of every run carries a resolved
//! `__finalOutput` string.

use crate::parse::tree::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value captured in a scope snapshot or a log entry.
///
/// `Raw` holds text the simulator could not reduce to a literal (an
/// unevaluated expression, an unknown identifier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScopeValue {
    Num(f64),
    Str(String),
    Bool(bool),
    Raw(String),
    Null,
}

impl ScopeValue {
    /// Render the value the way it appears in program output: strings are
    /// emitted verbatim, everything else is JSON-stringified.
    pub fn output_string(&self) -> String {
        match self {
            ScopeValue::Str(s) => s.clone(),
            ScopeValue::Num(n) => format_number(*n),
            ScopeValue::Bool(b) => b.to_string(),
            ScopeValue::Raw(s) => s.clone(),
            ScopeValue::Null => "null".to_string(),
        }
    }
}

impl fmt::Display for ScopeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.output_string())
    }
}

/// Format an f64 the way JSON does: integral values print without a
/// fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        // serde_json keeps the shortest round-trippable representation
        serde_json::Number::from_f64(n)
            .map(|v| v.to_string())
            .unwrap_or_else(|| n.to_string())
    }
}

/// A variable snapshot plus the reserved output channels.
///
/// Serialized with the reserved keys `__log` and `__finalOutput` so persisted
/// runs keep the shape collaborators expect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub vars: BTreeMap<String, ScopeValue>,
    #[serde(rename = "__log", default)]
    pub log: Vec<ScopeValue>,
    #[serde(rename = "__finalOutput", default, skip_serializing_if = "Option::is_none")]
    pub final_output: Option<String>,
}

impl Scope {
    pub fn with_vars(vars: BTreeMap<String, ScopeValue>) -> Self {
        Scope {
            vars,
            log: Vec::new(),
            final_output: None,
        }
    }
}

/// Advisory issue category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    Perf,
    Security,
    Style,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Perf => f.write_str("Perf"),
            IssueKind::Security => f.write_str("Security"),
            IssueKind::Style => f.write_str("Style"),
        }
    }
}

/// A linter finding. Purely advisory; never blocks execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinterIssue {
    pub kind: IssueKind,
    pub message: String,
}

/// Simulated execution phase for a heuristic step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Declaration,
    Initialization,
    Execution,
    Call,
    Return,
    Condition,
    Loop,
    Assignment,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Declaration => "declaration",
            Phase::Initialization => "initialization",
            Phase::Execution => "execution",
            Phase::Call => "call",
            Phase::Return => "return",
            Phase::Condition => "condition",
            Phase::Loop => "loop",
            Phase::Assignment => "assignment",
        };
        f.write_str(s)
    }
}

/// Exact step produced by the dynamic VM: 1-based source line (0 for
/// non-line events such as console writes) and a shallow global-scope dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStep {
    pub step: usize,
    pub line: usize,
    pub scope: Scope,
    pub issues: Vec<LinterIssue>,
}

/// What the heuristic simulator believes a node is doing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub phase: Phase,
    pub description: String,
    pub line_number: usize,
    pub code_snippet: String,
    pub variables: Scope,
}

/// Approximate step produced by the AST strategy, referencing a node of the
/// syntax tree that was walked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStep {
    pub step: usize,
    pub node: NodeId,
    pub context: ExecutionContext,
    pub issues: Vec<LinterIssue>,
}

/// One snapshot of program state in the timeline.
///
/// Within a single run all steps are the same variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionStep {
    Line(LineStep),
    Node(NodeStep),
}

impl ExecutionStep {
    pub fn index(&self) -> usize {
        match self {
            ExecutionStep::Line(s) => s.step,
            ExecutionStep::Node(s) => s.step,
        }
    }

    /// 1-based source line this step points at (0 for non-line events).
    pub fn line_number(&self) -> usize {
        match self {
            ExecutionStep::Line(s) => s.line,
            ExecutionStep::Node(s) => s.context.line_number,
        }
    }

    pub fn scope(&self) -> &Scope {
        match self {
            ExecutionStep::Line(s) => &s.scope,
            ExecutionStep::Node(s) => &s.context.variables,
        }
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        match self {
            ExecutionStep::Line(s) => &mut s.scope,
            ExecutionStep::Node(s) => &mut s.context.variables,
        }
    }

    pub fn issues(&self) -> &[LinterIssue] {
        match self {
            ExecutionStep::Line(s) => &s.issues,
            ExecutionStep::Node(s) => &s.issues,
        }
    }

    pub fn issues_mut(&mut self) -> &mut Vec<LinterIssue> {
        match self {
            ExecutionStep::Line(s) => &mut s.issues,
            ExecutionStep::Node(s) => &mut s.issues,
        }
    }

    pub fn final_output(&self) -> Option<&str> {
        self.scope().final_output.as_deref()
    }
}

/// Join log entries into the terminal output string, one entry per line.
pub fn join_log(entries: &[ScopeValue]) -> String {
    entries
        .iter()
        .map(ScopeValue::output_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalize a VM-produced run: every step's `__log` is concatenated into one
/// ordered list that replaces the last step's log, and the joined string
/// becomes the last step's `__finalOutput`.
pub fn finalize_vm_steps(steps: &mut [ExecutionStep]) {
    if steps.is_empty() {
        return;
    }
    let all_logs: Vec<ScopeValue> = steps
        .iter()
        .flat_map(|s| s.scope().log.iter().cloned())
        .collect();
    let final_output = join_log(&all_logs);
    if let Some(last) = steps.last_mut() {
        let scope = last.scope_mut();
        scope.log = all_logs;
        scope.final_output = Some(final_output);
    }
}

/// Normalize a heuristic run: per-step logs stay incremental, but contiguous
/// duplicate entries are collapsed and the last step gains a `__finalOutput`
/// computed from the aggregate when it does not already carry one.
pub fn ensure_final_output(steps: &mut [ExecutionStep]) {
    if steps.is_empty() {
        return;
    }
    for step in steps.iter_mut() {
        let log = &mut step.scope_mut().log;
        let mut deduped: Vec<ScopeValue> = Vec::with_capacity(log.len());
        for entry in log.drain(..) {
            if deduped
                .last()
                .is_some_and(|prev| prev.output_string() == entry.output_string())
            {
                continue;
            }
            deduped.push(entry);
        }
        *log = deduped;
    }
    let all_logs: Vec<ScopeValue> = steps
        .iter()
        .flat_map(|s| s.scope().log.iter().cloned())
        .collect();
    if let Some(last) = steps.last_mut() {
        let scope = last.scope_mut();
        if scope.final_output.is_none() {
            scope.final_output = Some(join_log(&all_logs));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_step(step: usize, log: Vec<ScopeValue>) -> ExecutionStep {
        ExecutionStep::Line(LineStep {
            step,
            line: step + 1,
            scope: Scope {
                vars: BTreeMap::new(),
                log,
                final_output: None,
            },
            issues: Vec::new(),
        })
    }

    #[test]
    fn number_formatting_matches_json() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn vm_finalize_aggregates_logs_onto_last_step() {
        let mut steps = vec![
            line_step(0, vec![ScopeValue::Num(1.0)]),
            line_step(1, vec![]),
            line_step(2, vec![ScopeValue::Str("done".into())]),
        ];
        finalize_vm_steps(&mut steps);
        let last = steps.last().unwrap();
        assert_eq!(last.scope().log.len(), 2);
        assert_eq!(last.final_output(), Some("1\ndone"));
    }

    #[test]
    fn heuristic_finalize_keeps_incremental_logs() {
        let mut steps = vec![
            line_step(0, vec![ScopeValue::Str("a".into())]),
            line_step(1, vec![ScopeValue::Str("b".into())]),
        ];
        ensure_final_output(&mut steps);
        assert_eq!(steps[0].scope().log.len(), 1);
        assert_eq!(steps[1].scope().log.len(), 1);
        assert_eq!(steps[1].final_output(), Some("a\nb"));
    }

    #[test]
    fn heuristic_finalize_dedupes_contiguous_entries() {
        let mut steps = vec![line_step(
            0,
            vec![
                ScopeValue::Str("x".into()),
                ScopeValue::Str("x".into()),
                ScopeValue::Str("y".into()),
            ],
        )];
        ensure_final_output(&mut steps);
        assert_eq!(steps[0].scope().log.len(), 2);
        assert_eq!(steps[0].final_output(), Some("x\ny"));
    }

    #[test]
    fn existing_final_output_is_preserved() {
        let mut steps = vec![line_step(0, vec![])];
        steps[0].scope_mut().final_output = Some("kept".into());
        ensure_final_output(&mut steps);
        assert_eq!(steps[0].final_output(), Some("kept"));
    }
}
