/*!
 * Script Interpreter
 * Tree-walking evaluation of units and closures
 */

use super::ast::*;
use super::scope::{Env, Scope, ScopeArena};
use super::value::{Closure, Function, ScriptError, ScriptResult, Value};
use std::cell::Cell;
use std::sync::{Arc, Weak};

thread_local! {
    static CALL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Tracks nested calls on this thread; released on drop
struct DepthGuard;

impl DepthGuard {
    fn enter(max_depth: usize) -> ScriptResult<Self> {
        CALL_DEPTH.with(|depth| {
            let next = depth.get() + 1;
            if next > max_depth {
                return Err(ScriptError::runtime(format!(
                    "maximum call depth of {} exceeded",
                    max_depth
                )));
            }
            depth.set(next);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        CALL_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

enum Flow {
    Normal,
    Return(Value),
}

/// Evaluator bound to a call-depth limit
#[derive(Debug, Clone)]
pub struct Interpreter {
    max_depth: usize,
    arena: Weak<ScopeArena>,
}

impl Interpreter {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            arena: Weak::new(),
        }
    }

    /// Record every scope a closure captures in `arena`
    pub fn with_arena(mut self, arena: &Arc<ScopeArena>) -> Self {
        self.arena = Arc::downgrade(arena);
        self
    }

    /// Run a unit's top level in `env`; a top-level `return` ends the unit early
    pub fn run(&self, program: &Program, env: &Env) -> ScriptResult<()> {
        self.exec_block(&program.body, env)?;
        Ok(())
    }

    fn exec_block(&self, body: &[Stmt], env: &Env) -> ScriptResult<Flow> {
        // Declarations are visible to the whole block
        for stmt in body {
            if let StmtKind::Function(decl) = &stmt.kind {
                env.define(decl.name.clone().unwrap_or_default(), self.closure(decl, env));
            }
        }
        for stmt in body {
            match self.exec(stmt, env).map_err(|e| at_line(e, stmt.line))? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn closure(&self, decl: &Arc<FunctionDecl>, env: &Env) -> Value {
        if let Some(arena) = self.arena.upgrade() {
            arena.capture(env);
        }
        Value::Function(Arc::new(Function::Closure(Closure {
            decl: Arc::clone(decl),
            env: Arc::clone(env),
            max_depth: self.max_depth,
            arena: self.arena.clone(),
        })))
    }

    fn exec(&self, stmt: &Stmt, env: &Env) -> ScriptResult<Flow> {
        match &stmt.kind {
            StmtKind::Let { name, init } => {
                let value = match init {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Null,
                };
                env.define(name.clone(), value);
            }
            StmtKind::Assign { target, value } => {
                let value = self.eval(value, env)?;
                self.assign(target, value, env)?;
            }
            StmtKind::Function(_) => {}
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(condition, env)?.is_truthy() {
                    return self.exec_block(then_branch, &Scope::child(env));
                } else if let Some(else_branch) = else_branch {
                    return self.exec_block(else_branch, &Scope::child(env));
                }
            }
            StmtKind::While { condition, body } => {
                while self.eval(condition, env)?.is_truthy() {
                    if let Flow::Return(value) = self.exec_block(body, &Scope::child(env))? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Null,
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::Throw(expr) => return Err(ScriptError::Thrown(self.eval(expr, env)?)),
            StmtKind::Expr(expr) => {
                self.eval(expr, env)?;
            }
            StmtKind::Block(body) => return self.exec_block(body, &Scope::child(env)),
        }
        Ok(Flow::Normal)
    }

    fn assign(&self, target: &Expr, value: Value, env: &Env) -> ScriptResult<()> {
        match target {
            Expr::Ident(name) => {
                if env.assign(name, value) {
                    Ok(())
                } else {
                    Err(ScriptError::runtime(format!(
                        "assignment to undeclared variable '{}'",
                        name
                    )))
                }
            }
            Expr::Member { object, name } => {
                let object = self.eval(object, env)?;
                set_member(&object, name, value)
            }
            Expr::Index { object, index } => {
                let object = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                match (&object, &index) {
                    (Value::List(items), Value::Number(n)) => {
                        let mut items = items.write();
                        let slot = list_index(*n)?;
                        if slot < items.len() {
                            items[slot] = value;
                        } else if slot == items.len() {
                            items.push(value);
                        } else {
                            return Err(ScriptError::runtime(format!(
                                "index {} out of bounds for list of length {}",
                                slot,
                                items.len()
                            )));
                        }
                        Ok(())
                    }
                    (_, Value::Str(key)) => set_member(&object, key, value),
                    _ => Err(ScriptError::runtime(format!(
                        "cannot index {} with {}",
                        object.type_name(),
                        index.type_name()
                    ))),
                }
            }
            _ => Err(ScriptError::runtime("invalid assignment target")),
        }
    }

    pub fn eval(&self, expr: &Expr, env: &Env) -> ScriptResult<Value> {
        Ok(match expr {
            Expr::Null => Value::Null,
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Number(n) => Value::Number(*n),
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::Ident(name) => env
                .lookup(name)
                .ok_or_else(|| ScriptError::runtime(format!("'{}' is not defined", name)))?,
            Expr::List(items) => Value::list(
                items
                    .iter()
                    .map(|item| self.eval(item, env))
                    .collect::<ScriptResult<Vec<_>>>()?,
            ),
            Expr::Object(entries) => {
                let object = Value::empty_object();
                for (key, expr) in entries {
                    let value = self.eval(expr, env)?;
                    set_member(&object, key, value)?;
                }
                object
            }
            Expr::Function(decl) => self.closure(decl, env),
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand, env)?;
                match op {
                    UnaryOp::Not => Value::Bool(!operand.is_truthy()),
                    UnaryOp::Neg => match operand {
                        Value::Number(n) => Value::Number(-n),
                        other => {
                            return Err(ScriptError::runtime(format!(
                                "cannot negate {}",
                                other.type_name()
                            )))
                        }
                    },
                }
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left, env)?;
                match (op, left.is_truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => left,
                    _ => self.eval(right, env)?,
                }
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                binary(*op, &left, &right)?
            }
            Expr::Call { callee, args } => {
                let callee = self.eval(callee, env)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, env))
                    .collect::<ScriptResult<Vec<_>>>()?;
                call(&callee, args)?
            }
            Expr::Member { object, name } => {
                let object = self.eval(object, env)?;
                get_member(&object, name)?
            }
            Expr::Index { object, index } => {
                let object = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                get_index(&object, &index)?
            }
        })
    }
}

/// Call a function value with positional arguments
pub fn call(callee: &Value, args: Vec<Value>) -> ScriptResult<Value> {
    match callee {
        Value::Function(function) => function.call(args),
        other => Err(ScriptError::runtime(format!(
            "{} is not a function",
            other.type_name()
        ))),
    }
}

impl Function {
    pub fn call(&self, args: Vec<Value>) -> ScriptResult<Value> {
        match self {
            Function::Native(native) => (native.func)(args),
            Function::Closure(closure) => {
                let _guard = DepthGuard::enter(closure.max_depth)?;
                let env = Scope::child(&closure.env);
                let mut args = args.into_iter();
                for param in &closure.decl.params {
                    env.define(param.clone(), args.next().unwrap_or_default());
                }
                let interpreter = Interpreter {
                    max_depth: closure.max_depth,
                    arena: closure.arena.clone(),
                };
                match interpreter.exec_block(&closure.decl.body, &env)? {
                    Flow::Return(value) => Ok(value),
                    Flow::Normal => Ok(Value::Null),
                }
            }
        }
    }
}

fn at_line(err: ScriptError, line: usize) -> ScriptError {
    match err {
        ScriptError::Runtime(message) if !message.starts_with("line ") => {
            ScriptError::Runtime(format!("line {}: {}", line, message))
        }
        other => other,
    }
}

fn list_index(n: f64) -> ScriptResult<usize> {
    if n >= 0.0 && n.fract() == 0.0 {
        Ok(n as usize)
    } else {
        Err(ScriptError::runtime(format!("invalid list index {}", n)))
    }
}

fn set_member(object: &Value, name: &str, value: Value) -> ScriptResult<()> {
    match object {
        Value::Object(map) => {
            map.write().insert(name.to_string(), value);
            Ok(())
        }
        other => Err(ScriptError::runtime(format!(
            "cannot set member '{}' on {}",
            name,
            other.type_name()
        ))),
    }
}

fn get_member(object: &Value, name: &str) -> ScriptResult<Value> {
    match (object, name) {
        (Value::Object(map), _) => Ok(map.read().get(name).cloned().unwrap_or_default()),
        (Value::Str(s), "length") => Ok(Value::Number(s.chars().count() as f64)),
        (Value::List(items), "length") => Ok(Value::Number(items.read().len() as f64)),
        (Value::List(items), "push") => {
            let items = Arc::clone(items);
            Ok(Value::native("push", move |args| {
                let mut items = items.write();
                items.extend(args);
                Ok(Value::Number(items.len() as f64))
            }))
        }
        (other, _) => Err(ScriptError::runtime(format!(
            "cannot read member '{}' of {}",
            name,
            other.type_name()
        ))),
    }
}

fn get_index(object: &Value, index: &Value) -> ScriptResult<Value> {
    match (object, index) {
        (Value::List(items), Value::Number(n)) => {
            let slot = list_index(*n)?;
            Ok(items.read().get(slot).cloned().unwrap_or_default())
        }
        (Value::Str(s), Value::Number(n)) => {
            let slot = list_index(*n)?;
            Ok(s.chars()
                .nth(slot)
                .map(|c| Value::Str(c.to_string()))
                .unwrap_or_default())
        }
        (_, Value::Str(key)) => get_member(object, key),
        _ => Err(ScriptError::runtime(format!(
            "cannot index {} with {}",
            object.type_name(),
            index.type_name()
        ))),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> ScriptResult<Value> {
    use BinaryOp::*;

    match op {
        Eq => return Ok(Value::Bool(left.same(right))),
        NotEq => return Ok(Value::Bool(!left.same(right))),
        Add => {
            if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                return Ok(Value::Str(format!("{}{}", left, right)));
            }
        }
        _ => {}
    }

    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(match op {
            Add => Value::Number(a + b),
            Sub => Value::Number(a - b),
            Mul => Value::Number(a * b),
            Div => Value::Number(a / b),
            Rem => Value::Number(a % b),
            Less => Value::Bool(a < b),
            LessEq => Value::Bool(a <= b),
            Greater => Value::Bool(a > b),
            GreaterEq => Value::Bool(a >= b),
            Eq => Value::Bool(a == b),
            NotEq => Value::Bool(a != b),
        }),
        (Value::Str(a), Value::Str(b)) if matches!(op, Less | LessEq | Greater | GreaterEq) => {
            Ok(Value::Bool(match op {
                Less => a < b,
                LessEq => a <= b,
                Greater => a > b,
                _ => a >= b,
            }))
        }
        _ => Err(ScriptError::runtime(format!(
            "unsupported operand types for {:?}: {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))),
    }
}
