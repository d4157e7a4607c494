/*!
 * Lexical Scopes
 * Variable environments chained to their enclosing scope
 */

use super::value::Value;
use ahash::RandomState;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

pub type Env = Arc<Scope>;

pub struct Scope {
    vars: RwLock<HashMap<String, Value, RandomState>>,
    parent: Option<Env>,
}

impl Scope {
    /// Outermost scope of one execution
    pub fn root() -> Env {
        Arc::new(Self {
            vars: RwLock::new(HashMap::with_hasher(RandomState::new())),
            parent: None,
        })
    }

    pub fn child(parent: &Env) -> Env {
        Arc::new(Self {
            vars: RwLock::new(HashMap::with_hasher(RandomState::new())),
            parent: Some(Arc::clone(parent)),
        })
    }

    /// Bind in this scope, shadowing outer bindings
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.vars.write().insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.vars.read().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.lookup(name))
    }

    /// Rebind the nearest existing binding; false if none exists
    pub fn assign(&self, name: &str, value: Value) -> bool {
        {
            let mut vars = self.vars.write();
            if let Some(slot) = vars.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.vars.read().contains_key(name)
    }

    /// Drop every binding held directly by this scope
    pub fn clear(&self) {
        let vars = std::mem::take(&mut *self.vars.write());
        drop(vars);
    }
}

/// Scopes captured by closures over one executor's lifetime
///
/// A closure keeps its defining scope alive, and that scope usually binds the
/// closure. Releasing the arena clears every captured scope that is still
/// alive, which breaks those cycles.
#[derive(Default)]
pub struct ScopeArena {
    captured: Mutex<Vec<Weak<Scope>>>,
}

impl ScopeArena {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn capture(&self, env: &Env) {
        let mut captured = self.captured.lock();
        if captured
            .last()
            .is_some_and(|last| std::ptr::eq(last.as_ptr(), Arc::as_ptr(env)))
        {
            return;
        }
        if captured.len() == captured.capacity() {
            captured.retain(|scope| scope.strong_count() > 0);
        }
        captured.push(Arc::downgrade(env));
    }

    /// Captured scopes still alive
    pub fn live(&self) -> usize {
        self.captured
            .lock()
            .iter()
            .filter(|scope| scope.strong_count() > 0)
            .count()
    }

    pub fn release(&self) {
        let captured = std::mem::take(&mut *self.captured.lock());
        for scope in captured.iter().filter_map(Weak::upgrade) {
            scope.clear();
        }
    }
}

impl Drop for ScopeArena {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ScopeArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeArena")
            .field("live", &self.live())
            .finish()
    }
}
