/*!
 * Native Modules
 * Host-provided modules reachable through `require_native`
 */

use crate::core::{LoaderError, LoaderResult};
use crate::sandbox::{ScriptError, ScriptResult, Value};
use crate::vfs::{Encoding, FileResource, Resource};
use ahash::RandomState;
use dashmap::DashMap;
use std::path::{Component, Path};
use std::sync::Arc;
use tracing::debug;

/// Produces a native module's export value
pub type NativeFactory = Arc<dyn Fn() -> LoaderResult<Value> + Send + Sync>;

/// Registry of native modules by logical name (a relative path under `native/`)
#[derive(Clone, Default)]
pub struct NativeModules {
    factories: Arc<DashMap<String, NativeFactory, RandomState>>,
}

impl NativeModules {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in `fs` module
    pub fn with_builtins() -> Self {
        let modules = Self::new();
        modules.register("fs", || Ok(fs_module()));
        modules
    }

    pub fn register<F>(&self, name: &str, factory: F)
    where
        F: Fn() -> LoaderResult<Value> + Send + Sync + 'static,
    {
        let key = Self::normalize(name);
        debug!(module = %key, "Native module registered");
        self.factories.insert(key, Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&Self::normalize(name))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Run the factory for `name`; `None` when nothing is registered
    pub fn instantiate(&self, name: &str) -> Option<LoaderResult<Value>> {
        let factory = self
            .factories
            .get(&Self::normalize(name))
            .map(|entry| Arc::clone(entry.value()))?;
        Some(factory())
    }

    /// Cleaned, `/`-separated form of a module name
    pub fn normalize(name: &str) -> String {
        let cleaned = path_clean::clean(Path::new(name.trim()));
        cleaned
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                Component::ParentDir => Some("..".to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl std::fmt::Debug for NativeModules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeModules")
            .field("modules", &self.names())
            .finish()
    }
}

fn string_arg(args: &[Value], index: usize, function: &str) -> ScriptResult<String> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(s.clone()),
        other => Err(ScriptError::runtime(format!(
            "{}: argument {} must be a string, got {}",
            function,
            index + 1,
            other.map(Value::type_name).unwrap_or("nothing")
        ))),
    }
}

fn encoding_arg(args: &[Value], index: usize) -> ScriptResult<Encoding> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(Encoding::Utf8),
        Some(Value::Str(name)) => match name.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "ascii" => Ok(Encoding::Ascii),
            "latin1" | "binary" => Ok(Encoding::Latin1),
            other => Err(ScriptError::runtime(format!("unknown encoding '{}'", other))),
        },
        Some(other) => Err(ScriptError::runtime(format!(
            "encoding must be a string, got {}",
            other.type_name()
        ))),
    }
}

/// `fs`: text file access through [`FileResource`]
fn fs_module() -> Value {
    Value::object([
        (
            "read",
            Value::native("read", |args| {
                let path = string_arg(&args, 0, "fs.read")?;
                let encoding = encoding_arg(&args, 1)?;
                Ok(Value::Str(FileResource::new(path).read(encoding)?))
            }),
        ),
        (
            "write",
            Value::native("write", |args| {
                let path = string_arg(&args, 0, "fs.write")?;
                let text = string_arg(&args, 1, "fs.write")?;
                let encoding = encoding_arg(&args, 2)?;
                FileResource::make(path)?.write(&text, encoding)?;
                Ok(Value::Null)
            }),
        ),
        (
            "append",
            Value::native("append", |args| {
                let path = string_arg(&args, 0, "fs.append")?;
                let text = string_arg(&args, 1, "fs.append")?;
                let encoding = encoding_arg(&args, 2)?;
                FileResource::make(path)?.append(&text, encoding)?;
                Ok(Value::Null)
            }),
        ),
        (
            "exists",
            Value::native("exists", |args| {
                let path = string_arg(&args, 0, "fs.exists")?;
                Ok(Value::Bool(Path::new(&path).exists()))
            }),
        ),
    ])
}

/// Error for a name with no registered factory
pub fn not_found(module: &str, path: &Path) -> LoaderError {
    LoaderError::NativeModuleNotFound {
        module: module.to_string(),
        path: path.to_path_buf(),
    }
}
