//! Tree-walking evaluator for the embedded VM
//!
//! Executes a parsed program statement by statement. Host hooks are plain
//! closures registered by dotted name (`console.log`) or bare name
//! (`__snapshot`); each hook receives a snapshot of the visible globals plus
//! the evaluated call arguments, which is everything the stepper needs to
//! record timeline state.

use crate::step::ScopeValue;
use crate::vm::ast::{AssignOp, BinOp, Expr, Stmt, UnOp};
use crate::vm::error::VmError;
use crate::vm::parser::Parser;
use crate::vm::value::{JsFunction, Value};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Hard cap on evaluated operations so a runaway loop in guest code cannot
/// hang the host.
const MAX_OPS: u64 = 1_000_000;

pub type NativeFn = Box<dyn FnMut(&BTreeMap<String, ScopeValue>, &[Value]) -> Value>;

enum Flow {
    Normal,
    Return(Value),
}

pub struct Vm {
    globals: BTreeMap<String, Value>,
    natives: FxHashMap<String, NativeFn>,
    frames: Vec<FxHashMap<String, Value>>,
    ops: u64,
}

impl Vm {
    pub fn new() -> Self {
        Vm {
            globals: BTreeMap::new(),
            natives: FxHashMap::default(),
            frames: Vec::new(),
            ops: 0,
        }
    }

    /// Register a host hook under a bare or dotted name.
    pub fn register_native(&mut self, name: &str, f: NativeFn) {
        self.natives.insert(name.to_string(), f);
    }

    /// Shallow dump of the global scope, function values excluded.
    pub fn dump_globals(&self) -> BTreeMap<String, ScopeValue> {
        self.globals
            .iter()
            .filter_map(|(k, v)| v.to_scope_value().map(|sv| (k.clone(), sv)))
            .collect()
    }

    /// Parse and execute a whole program.
    pub fn eval(&mut self, source: &str) -> Result<(), VmError> {
        let program = Parser::new(source)?.parse_program()?;
        for stmt in &program {
            if let Flow::Return(_) = self.exec(stmt)? {
                break;
            }
        }
        Ok(())
    }

    fn tick(&mut self, line: usize) -> Result<(), VmError> {
        self.ops += 1;
        if self.ops > MAX_OPS {
            return Err(VmError::Type {
                message: "maximum execution steps exceeded".to_string(),
                line,
            });
        }
        Ok(())
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow, VmError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval_expr(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::VarDecl { name, init, line } => {
                self.tick(*line)?;
                let value = match init {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Undefined,
                };
                self.declare(name.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                if self.eval_expr(cond)?.truthy() {
                    self.exec_block(then_body)
                } else if let Some(body) = else_body {
                    self.exec_block(body)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { cond, body } => {
                while self.eval_expr(cond)?.truthy() {
                    if let Flow::Return(v) = self.exec_block(body)? {
                        return Ok(Flow::Return(v));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.exec(init)?;
                }
                loop {
                    if let Some(cond) = cond {
                        if !self.eval_expr(cond)?.truthy() {
                            break;
                        }
                    }
                    if let Flow::Return(v) = self.exec_block(body)? {
                        return Ok(Flow::Return(v));
                    }
                    if let Some(update) = update {
                        self.eval_expr(update)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::FunctionDecl { name, params, body } => {
                let func = Value::Function(Rc::new(JsFunction {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                }));
                self.declare(name.clone(), func);
                Ok(Flow::Normal)
            }
            Stmt::Return { value, line } => {
                self.tick(*line)?;
                let v = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(v))
            }
        }
    }

    fn exec_block(&mut self, body: &[Stmt]) -> Result<Flow, VmError> {
        for stmt in body {
            if let Flow::Return(v) = self.exec(stmt)? {
                return Ok(Flow::Return(v));
            }
        }
        Ok(Flow::Normal)
    }

    fn declare(&mut self, name: String, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.insert(name, value);
            }
            None => {
                self.globals.insert(name, value);
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        for frame in self.frames.iter().rev() {
            if let Some(v) = frame.get(name) {
                return Some(v);
            }
        }
        self.globals.get(name)
    }

    fn assign(&mut self, name: &str, value: Value) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return;
            }
        }
        // Undeclared assignment creates a global, sloppy-mode style.
        self.globals.insert(name.to_string(), value);
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, VmError> {
        self.tick(expr.line())?;
        match expr {
            Expr::Number(n) => Ok(Value::Num(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Ident { name, line } => {
                self.lookup(name)
                    .cloned()
                    .ok_or_else(|| VmError::UndefinedVariable {
                        name: name.clone(),
                        line: *line,
                    })
            }
            Expr::Member { object, property, line } => {
                // Bare member reads only make sense for native namespaces.
                let _ = (object, property);
                Err(VmError::Type {
                    message: "property access is only supported on call targets".to_string(),
                    line: *line,
                })
            }
            Expr::Call { callee, args, line } => self.eval_call(callee, args, *line),
            Expr::Unary { op, expr, line } => {
                let v = self.eval_expr(expr)?;
                match op {
                    UnOp::Neg => match v {
                        Value::Num(n) => Ok(Value::Num(-n)),
                        other => Err(VmError::Type {
                            message: format!("cannot negate a {}", other.type_name()),
                            line: *line,
                        }),
                    },
                    UnOp::Not => Ok(Value::Bool(!v.truthy())),
                }
            }
            Expr::Binary { op, lhs, rhs, line } => {
                // Short-circuit forms evaluate the right side lazily.
                match op {
                    BinOp::And => {
                        let l = self.eval_expr(lhs)?;
                        if !l.truthy() {
                            return Ok(l);
                        }
                        return self.eval_expr(rhs);
                    }
                    BinOp::Or => {
                        let l = self.eval_expr(lhs)?;
                        if l.truthy() {
                            return Ok(l);
                        }
                        return self.eval_expr(rhs);
                    }
                    _ => {}
                }
                let l = self.eval_expr(lhs)?;
                let r = self.eval_expr(rhs)?;
                self.binary(*op, l, r, *line)
            }
            Expr::Assign {
                target,
                op,
                value,
                line,
            } => {
                let rhs = self.eval_expr(value)?;
                let new = match op {
                    AssignOp::Assign => rhs,
                    AssignOp::AddAssign
                    | AssignOp::SubAssign
                    | AssignOp::MulAssign
                    | AssignOp::DivAssign => {
                        let current = self
                            .lookup(target)
                            .cloned()
                            .ok_or_else(|| VmError::UndefinedVariable {
                                name: target.clone(),
                                line: *line,
                            })?;
                        let bin = match op {
                            AssignOp::AddAssign => BinOp::Add,
                            AssignOp::SubAssign => BinOp::Sub,
                            AssignOp::MulAssign => BinOp::Mul,
                            _ => BinOp::Div,
                        };
                        self.binary(bin, current, rhs, *line)?
                    }
                };
                self.assign(target, new.clone());
                Ok(new)
            }
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], line: usize) -> Result<Value, VmError> {
        let native_key = match callee {
            Expr::Ident { name, .. } => Some(name.clone()),
            Expr::Member { object, property, .. } => match &**object {
                Expr::Ident { name, .. } => Some(format!("{}.{}", name, property)),
                _ => None,
            },
            _ => None,
        };

        // User-defined functions shadow natives of the same bare name.
        if let Expr::Ident { name, .. } = callee {
            if let Some(Value::Function(func)) = self.lookup(name).cloned() {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg)?);
                }
                return self.call_function(&func, values);
            }
        }

        if let Some(key) = native_key {
            if self.natives.contains_key(&key) {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg)?);
                }
                let globals = self.dump_globals();
                // Take the hook out so it can borrow the VM-free snapshot
                // while we still hold &mut self.
                if let Some(mut f) = self.natives.remove(&key) {
                    let result = f(&globals, &values);
                    self.natives.insert(key, f);
                    return Ok(result);
                }
            }
            return Err(VmError::NotCallable { name: key, line });
        }

        Err(VmError::NotCallable {
            name: "<expression>".to_string(),
            line,
        })
    }

    fn call_function(&mut self, func: &JsFunction, args: Vec<Value>) -> Result<Value, VmError> {
        let mut frame = FxHashMap::default();
        for (i, param) in func.params.iter().enumerate() {
            frame.insert(
                param.clone(),
                args.get(i).cloned().unwrap_or(Value::Undefined),
            );
        }
        self.frames.push(frame);
        let mut result = Value::Undefined;
        for stmt in &func.body {
            match self.exec(stmt) {
                Ok(Flow::Return(v)) => {
                    result = v;
                    break;
                }
                Ok(Flow::Normal) => {}
                Err(e) => {
                    self.frames.pop();
                    return Err(e);
                }
            }
        }
        self.frames.pop();
        Ok(result)
    }

    fn binary(&self, op: BinOp, l: Value, r: Value, line: usize) -> Result<Value, VmError> {
        match op {
            BinOp::Add => match (&l, &r) {
                (Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
                // String concatenation wins if either side is a string.
                _ if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) => {
                    Ok(Value::Str(format!("{}{}", l, r)))
                }
                _ => Err(self.type_mismatch("+", &l, &r, line)),
            },
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => match (&l, &r) {
                (Value::Num(a), Value::Num(b)) => Ok(Value::Num(match op {
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    _ => a % b,
                })),
                _ => Err(self.type_mismatch(op_symbol(op), &l, &r, line)),
            },
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let ord = match (&l, &r) {
                    (Value::Num(a), Value::Num(b)) => a.partial_cmp(b),
                    (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                    _ => return Err(self.type_mismatch(op_symbol(op), &l, &r, line)),
                };
                let result = match (op, ord) {
                    (_, None) => false,
                    (BinOp::Lt, Some(o)) => o == std::cmp::Ordering::Less,
                    (BinOp::Le, Some(o)) => o != std::cmp::Ordering::Greater,
                    (BinOp::Gt, Some(o)) => o == std::cmp::Ordering::Greater,
                    (_, Some(o)) => o != std::cmp::Ordering::Less,
                };
                Ok(Value::Bool(result))
            }
            BinOp::StrictEq => Ok(Value::Bool(l == r)),
            BinOp::StrictNe => Ok(Value::Bool(l != r)),
            BinOp::Eq => Ok(Value::Bool(loose_eq(&l, &r))),
            BinOp::Ne => Ok(Value::Bool(!loose_eq(&l, &r))),
            BinOp::And | BinOp::Or => unreachable!("short-circuited above"),
        }
    }

    fn type_mismatch(&self, op: &str, l: &Value, r: &Value, line: usize) -> VmError {
        VmError::Type {
            message: format!(
                "cannot apply '{}' to {} and {}",
                op,
                l.type_name(),
                r.type_name()
            ),
            line,
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Vm::new()
    }
}

fn op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        _ => "?",
    }
}

/// Loose equality with number/string coercion, just enough for the usual
/// comparisons guest snippets make.
fn loose_eq(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Num(a), Value::Str(b)) | (Value::Str(b), Value::Num(a)) => {
            b.trim().parse::<f64>().map(|p| p == *a).unwrap_or(false)
        }
        (Value::Null, Value::Undefined) | (Value::Undefined, Value::Null) => true,
        _ => l == r,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn run_and_dump(src: &str) -> BTreeMap<String, ScopeValue> {
        let mut vm = Vm::new();
        vm.eval(src).unwrap();
        vm.dump_globals()
    }

    #[test]
    fn arithmetic_and_assignment() {
        let globals = run_and_dump("var a = 2 + 3 * 4; a += 1;");
        assert_eq!(globals.get("a"), Some(&ScopeValue::Num(15.0)));
    }

    #[test]
    fn string_concatenation() {
        let globals = run_and_dump("var s = 'n=' + 4;");
        assert_eq!(globals.get("s"), Some(&ScopeValue::Str("n=4".into())));
    }

    #[test]
    fn while_loop_accumulates() {
        let globals = run_and_dump("var i = 0; var total = 0; while (i < 5) { total += i; i++; }");
        assert_eq!(globals.get("total"), Some(&ScopeValue::Num(10.0)));
    }

    #[test]
    fn function_call_with_locals() {
        let globals = run_and_dump(
            "function double(x) { var local = x * 2; return local; }\nvar y = double(21);",
        );
        assert_eq!(globals.get("y"), Some(&ScopeValue::Num(42.0)));
        // Function locals never leak into the global dump.
        assert!(!globals.contains_key("local"));
        assert!(!globals.contains_key("double"));
    }

    #[test]
    fn undefined_variable_errors() {
        let mut vm = Vm::new();
        let err = vm.eval("var a = missing + 1;").unwrap_err();
        assert!(matches!(err, VmError::UndefinedVariable { ref name, .. } if name == "missing"));
        assert_eq!(
            err.to_string(),
            "ReferenceError: missing is not defined (line 1)"
        );
    }

    #[test]
    fn native_hook_receives_args_and_globals() {
        let seen: std::rc::Rc<RefCell<Vec<String>>> = Default::default();
        let sink = seen.clone();
        let mut vm = Vm::new();
        vm.register_native(
            "console.log",
            Box::new(move |globals, args| {
                let rendered = args.iter().map(Value::to_string).collect::<Vec<_>>().join(" ");
                sink.borrow_mut()
                    .push(format!("{} [globals={}]", rendered, globals.len()));
                Value::Undefined
            }),
        );
        vm.eval("var a = 1; console.log('a is', a);").unwrap();
        assert_eq!(seen.borrow().as_slice(), ["a is 1 [globals=1]"]);
    }

    #[test]
    fn runaway_loop_is_cut_off() {
        let mut vm = Vm::new();
        let err = vm.eval("while (true) {}").unwrap_err();
        assert!(matches!(err, VmError::Type { .. }));
    }
}
