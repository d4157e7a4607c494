/*!
 * Script Values
 * Runtime values shared between units, host bindings, and the module cache
 */

use super::ast::FunctionDecl;
use super::scope::{Env, ScopeArena};
use crate::core::LoaderError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};
use thiserror::Error;

/// Nesting depth past which rendering stops
const RENDER_DEPTH: usize = 32;

pub type ListRef = Arc<RwLock<Vec<Value>>>;
pub type ObjectRef = Arc<RwLock<BTreeMap<String, Value>>>;
pub type NativeFn = Arc<dyn Fn(Vec<Value>) -> ScriptResult<Value> + Send + Sync>;

/// Reasons a unit stops running
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("{0}")]
    Runtime(String),

    #[error("Uncaught {0}")]
    Thrown(Value),

    #[error("exit({0})")]
    Exit(i32),

    /// Typed loader failure raised by a host binding such as `require`
    #[error("{0}")]
    Host(Box<LoaderError>),
}

impl ScriptError {
    pub fn runtime(message: impl Into<String>) -> Self {
        ScriptError::Runtime(message.into())
    }
}

impl From<LoaderError> for ScriptError {
    fn from(err: LoaderError) -> Self {
        match err {
            LoaderError::Exit { code } => ScriptError::Exit(code),
            other => ScriptError::Host(Box::new(other)),
        }
    }
}

pub type ScriptResult<T> = Result<T, ScriptError>;

/// Closure over the scope it was created in
pub struct Closure {
    pub decl: Arc<FunctionDecl>,
    pub env: Env,
    pub max_depth: usize,
    /// Arena that scopes captured inside this closure's calls are recorded in
    pub arena: Weak<ScopeArena>,
}

/// Function implemented by the host
pub struct NativeFunction {
    pub name: String,
    pub func: NativeFn,
}

pub enum Function {
    Closure(Closure),
    Native(NativeFunction),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Closure(closure) => closure.decl.name.as_deref().unwrap_or("anonymous"),
            Function::Native(native) => &native.name,
        }
    }
}

/// A Lotus script value
///
/// Lists, objects and functions are shared references: cloning a value
/// clones the handle, and identity is preserved through the module cache.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(ListRef),
    Object(ObjectRef),
    Function(Arc<Function>),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(RwLock::new(items)))
    }

    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(Arc::new(RwLock::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    pub fn empty_object() -> Self {
        Value::Object(Arc::new(RwLock::new(BTreeMap::new())))
    }

    pub fn native<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Vec<Value>) -> ScriptResult<Value> + Send + Sync + 'static,
    {
        Value::Function(Arc::new(Function::Native(NativeFunction {
            name: name.into(),
            func: Arc::new(func),
        })))
    }

    pub fn str(text: impl Into<String>) -> Self {
        Value::Str(text.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Member lookup on objects; `None` for other values or missing keys
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Value::Object(map) => map.read().get(key).cloned(),
            _ => None,
        }
    }

    /// Same value: primitives by content, shared values by identity
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Plain data view for reporting; functions render as their name
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_at(&mut Vec::new())
    }

    /// Shared address of a list or object, used to spot cycles while rendering
    fn container_ptr(&self) -> Option<*const ()> {
        match self {
            Value::List(items) => Some(Arc::as_ptr(items) as *const ()),
            Value::Object(map) => Some(Arc::as_ptr(map) as *const ()),
            _ => None,
        }
    }

    /// `ancestors` holds the containers currently being rendered
    fn to_json_at(&self, ancestors: &mut Vec<*const ()>) -> serde_json::Value {
        use serde_json::Value as Json;

        if let Some(ptr) = self.container_ptr() {
            if ancestors.contains(&ptr) {
                return Json::String("[circular]".into());
            }
            if ancestors.len() > RENDER_DEPTH {
                return Json::String("...".into());
            }
            ancestors.push(ptr);
        }
        let json = match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Str(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(
                items
                    .read_recursive()
                    .iter()
                    .map(|item| item.to_json_at(ancestors))
                    .collect(),
            ),
            Value::Object(map) => Json::Object(
                map.read_recursive()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_at(ancestors)))
                    .collect(),
            ),
            Value::Function(func) => Json::String(format!("[function {}]", func.name())),
        };
        if self.container_ptr().is_some() {
            ancestors.pop();
        }
        json
    }

    fn render(
        &self,
        f: &mut fmt::Formatter<'_>,
        ancestors: &mut Vec<*const ()>,
        nested: bool,
    ) -> fmt::Result {
        let Some(ptr) = self.container_ptr() else {
            return self.render_scalar(f, nested);
        };
        if ancestors.contains(&ptr) {
            return f.write_str("[circular]");
        }
        if ancestors.len() > RENDER_DEPTH {
            return f.write_str("...");
        }
        ancestors.push(ptr);
        let rendered = self.render_container(f, ancestors);
        ancestors.pop();
        rendered
    }

    fn render_scalar(&self, f: &mut fmt::Formatter<'_>, nested: bool) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write_number(f, *n),
            Value::Str(s) if nested => write!(f, "{:?}", s),
            Value::Str(s) => f.write_str(s),
            Value::Function(func) => write!(f, "[function {}]", func.name()),
            Value::List(_) | Value::Object(_) => Ok(()),
        }
    }

    fn render_container(
        &self,
        f: &mut fmt::Formatter<'_>,
        ancestors: &mut Vec<*const ()>,
    ) -> fmt::Result {
        match self {
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.read_recursive().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.render(f, ancestors, true)?;
                }
                f.write_str("]")
            }
            Value::Object(map) => {
                let map = map.read_recursive();
                if map.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    value.render(f, ancestors, true)?;
                }
                f.write_str(" }")
            }
            scalar => scalar.render_scalar(f, true),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, &mut Vec::new(), false)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, &mut Vec::new(), true)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
