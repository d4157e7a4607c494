/*!
 * Script Executor
 * Isolated execution of Lotus script units
 */

use super::capabilities::CapabilityContext;
use super::script::{parse, Interpreter, Scope, ScopeArena, ScriptError, Value};
use super::traits::UnitExecutor;
use crate::core::{LoaderError, LoaderResult, DEFAULT_MAX_CALL_DEPTH};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info_span};
use uuid::Uuid;

/// Default executor: interprets each unit in a fresh scope chain
///
/// Scopes captured by closures are released when the last clone of the
/// executor is dropped, so export values must not be called after that.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    max_call_depth: usize,
    arena: Arc<ScopeArena>,
}

impl ScriptExecutor {
    pub fn new(max_call_depth: usize) -> Self {
        Self {
            max_call_depth,
            arena: ScopeArena::new(),
        }
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Closure scopes still held by units this executor ran
    pub fn captured_scopes(&self) -> usize {
        self.arena.live()
    }
}

impl Default for ScriptExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CALL_DEPTH)
    }
}

impl UnitExecutor for ScriptExecutor {
    fn execute(
        &self,
        source: &str,
        context: CapabilityContext,
        source_name: &Path,
    ) -> LoaderResult<Value> {
        let execution_id = Uuid::new_v4();
        let span = info_span!("unit", path = %source_name.display(), %execution_id);
        let _entered = span.enter();
        let started = Instant::now();

        let program = parse(source).map_err(|e| {
            error!(error = %e, "Unit failed to parse");
            LoaderError::ExecutionFault {
                path: source_name.to_path_buf(),
                message: format!("syntax error at {}", e),
            }
        })?;

        let (bindings, require, file_name) = context.into_parts();
        let global = Scope::root();
        for (name, value) in bindings {
            global.define(name, value);
        }

        let unit = Scope::child(&global);
        unit.define("require", require);
        unit.define("exports", Value::empty_object());
        unit.define("fileName", Value::str(file_name.display().to_string()));

        Interpreter::new(self.max_call_depth)
            .with_arena(&self.arena)
            .run(&program, &unit)
            .map_err(|e| surface(e, source_name))?;

        debug!(
            elapsed_us = started.elapsed().as_micros() as u64,
            "Unit executed"
        );
        Ok(unit.lookup("exports").unwrap_or_default())
    }
}

/// Convert a script failure into the loader error it surfaces as
///
/// Host errors already logged where they arose pass through unchanged.
pub fn surface(err: ScriptError, path: &Path) -> LoaderError {
    match err {
        ScriptError::Host(inner) => *inner,
        ScriptError::Exit(code) => {
            debug!(code, "Unit requested exit");
            LoaderError::Exit { code }
        }
        fault => {
            let message = fault.to_string();
            error!(path = %path.display(), %message, "Unit raised an error");
            LoaderError::ExecutionFault {
                path: path.to_path_buf(),
                message,
            }
        }
    }
}
