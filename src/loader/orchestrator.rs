/*!
 * Loader
 * Single entry point classifying requests and running units once
 */

use super::cache::{CacheStats, ModuleCache};
use super::config::LoaderConfig;
use super::context::{trace_import, ContextBuilder, ContextRequest, NativeBridge, RequireType};
use super::event_loop::EventLoop;
use super::file_resolver::FileResolver;
use super::host::{HostEnvironment, HostStreams};
use super::native::{self, NativeModules};
use crate::core::{LoaderError, LoaderResult, NATIVE_DIR};
use crate::manifest::ManifestResolver;
use crate::monitoring::RequireSpan;
use crate::permissions::{AdvisoryGate, GateRequest, PermissionGate};
use crate::sandbox::{ScriptError, ScriptExecutor, UnitExecutor, Value};
use crate::vfs::{Encoding, FileResource, PathUtility, Resource};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::{error, info};

/// Builder for Loader
pub struct LoaderBuilder {
    config: LoaderConfig,
    executor: Option<Arc<dyn UnitExecutor>>,
    gate: Option<Arc<dyn PermissionGate>>,
    natives: Option<NativeModules>,
    host: Option<HostEnvironment>,
    streams: Option<HostStreams>,
}

impl LoaderBuilder {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            executor: None,
            gate: None,
            natives: None,
            host: None,
            streams: None,
        }
    }

    /// Replace the script interpreter with another executor
    pub fn with_executor(mut self, executor: Arc<dyn UnitExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Enforce loads through a permission gate instead of allowing everything
    pub fn with_gate(mut self, gate: Arc<dyn PermissionGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_native_modules(mut self, natives: NativeModules) -> Self {
        self.natives = Some(natives);
        self
    }

    pub fn with_host(mut self, host: HostEnvironment) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_streams(mut self, streams: HostStreams) -> Self {
        self.streams = Some(streams);
        self
    }

    pub fn build(self) -> Loader {
        let config = self.config;
        let paths = PathUtility::new(config.path_root(), config.dialect());

        let mut features = Vec::new();
        if self.executor.is_some() {
            features.push("custom-executor");
        }
        if self.gate.is_some() {
            features.push("permission-gate");
        }
        if config.print_imports() {
            features.push("import-tracing");
        }

        let executor = self
            .executor
            .unwrap_or_else(|| Arc::new(ScriptExecutor::new(config.max_call_depth())));
        let gate = self.gate.unwrap_or_else(|| Arc::new(AdvisoryGate));
        let events = Arc::new(EventLoop::new());
        let host = Arc::new(self.host.unwrap_or_else(HostEnvironment::capture));
        let contexts = ContextBuilder::new(
            host,
            self.streams.unwrap_or_else(HostStreams::inherit),
            Arc::clone(&events),
            config.app_id().map(String::from),
        );

        info!(
            library_root = %config.library_root().display(),
            extensions = ?config.extensions(),
            "Loader initialized with: {}",
            if features.is_empty() { "defaults".to_string() } else { features.join(", ") }
        );

        Loader {
            inner: Arc::new(LoaderInner {
                files: FileResolver::new(
                    paths.clone(),
                    config.extensions().to_vec(),
                    config.index_file(),
                ),
                manifests: ManifestResolver::new(config.library_root(), paths.clone()),
                paths,
                cache: ModuleCache::new(),
                executor,
                gate,
                natives: self.natives.unwrap_or_else(NativeModules::with_builtins),
                contexts,
                events,
                require_depth: AtomicUsize::new(0),
                config,
            }),
        }
    }
}

/// Resolves, executes and memoizes units
///
/// Cloning is cheap and clones share one cache. Multiple independent loaders
/// may coexist in a process.
#[derive(Clone)]
pub struct Loader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    config: LoaderConfig,
    paths: PathUtility,
    files: FileResolver,
    manifests: ManifestResolver,
    cache: ModuleCache,
    executor: Arc<dyn UnitExecutor>,
    gate: Arc<dyn PermissionGate>,
    natives: NativeModules,
    contexts: ContextBuilder,
    events: Arc<EventLoop>,
    require_depth: AtomicUsize,
}

/// Releases one level of require nesting on drop
struct RequireDepth<'a>(&'a AtomicUsize);

impl Drop for RequireDepth<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        LoaderBuilder::new(config).build()
    }

    pub fn builder(config: LoaderConfig) -> LoaderBuilder {
        LoaderBuilder::new(config)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    pub fn paths(&self) -> &PathUtility {
        &self.inner.paths
    }

    /// Resolve `requested` from the unit at `current` and return its export value
    pub fn require(&self, current: &Path, requested: &str) -> LoaderResult<Value> {
        self.inner.require(current, requested, None)
    }

    /// As [`require`](Self::require), forwarding a library's native bridge
    pub fn require_with(
        &self,
        current: &Path,
        requested: &str,
        bridge: Option<&NativeBridge>,
    ) -> LoaderResult<Value> {
        self.inner.require(current, requested, bridge)
    }

    /// Execute a concrete file (once) with the given `fileName` and require type
    pub fn run(
        &self,
        target: &Path,
        file_name: &Path,
        require_type: RequireType,
    ) -> LoaderResult<Value> {
        self.inner
            .run(target, file_name, require_type, None, BTreeMap::new())
    }

    /// As [`run`](Self::run), with extra globals bound over the defaults
    ///
    /// Extras only reach the unit on its first execution; later calls return
    /// the cached export value.
    pub fn run_with(
        &self,
        target: &Path,
        file_name: &Path,
        require_type: RequireType,
        extras: BTreeMap<String, Value>,
    ) -> LoaderResult<Value> {
        self.inner.run(target, file_name, require_type, None, extras)
    }

    /// Run an application entry point
    pub fn run_entry(&self, entry: &Path) -> LoaderResult<Value> {
        self.run(entry, entry, RequireType::Unknown)
    }

    /// Require, terminating the process with the error's exit status on failure
    pub fn require_or_exit(&self, current: &Path, requested: &str) -> Value {
        match self.require(current, requested) {
            Ok(value) => value,
            Err(err) => {
                error!(error = %err, "Require failed, exiting");
                std::process::exit(err.exit_code())
            }
        }
    }

    /// Drain queued timer callbacks; returns how many ran
    pub fn run_event_loop(&self) -> LoaderResult<usize> {
        self.inner.events.run()
    }

    pub fn pending_tasks(&self) -> usize {
        self.inner.events.pending()
    }

    /// Export value of an already executed unit
    pub fn cached(&self, path: &Path) -> Option<Value> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.inner.cache.get(&key)
    }

    pub fn cached_paths(&self) -> Vec<PathBuf> {
        self.inner.cache.paths()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    pub fn native_modules(&self) -> &NativeModules {
        &self.inner.natives
    }
}

impl LoaderInner {
    fn require(
        self: &Arc<Self>,
        current: &Path,
        requested: &str,
        bridge: Option<&NativeBridge>,
    ) -> LoaderResult<Value> {
        let span = RequireSpan::new(requested, current);
        let print = self.config.print_imports();
        trace_import(print, "Currently at:", &current.display().to_string());
        trace_import(print, "requesting:", requested);

        let limit = self.config.max_require_depth();
        let _depth = RequireDepth(&self.require_depth);
        if self.require_depth.fetch_add(1, Ordering::Relaxed) >= limit {
            error!(requested, limit, "Require chain too deep");
            let err = LoaderError::ImportFailure {
                path: current.to_path_buf(),
                reason: format!("require chain deeper than {} units", limit),
            };
            span.record_error(&err);
            return Err(err);
        }

        let result = if self.paths.is_path(requested) {
            self.files.resolve(current, requested).and_then(|path| {
                trace_import(print, "found at:", &path.display().to_string());
                span.record_resolved(&path);
                self.run(
                    &path,
                    &path,
                    RequireType::File,
                    bridge.cloned(),
                    BTreeMap::new(),
                )
            })
        } else {
            self.require_library(requested, print, &span)
        };

        match &result {
            Ok(_) => span.record_success(),
            Err(err) => span.record_error(err),
        }
        result
    }

    fn require_library(
        self: &Arc<Self>,
        identifier: &str,
        print: bool,
        span: &RequireSpan,
    ) -> LoaderResult<Value> {
        let target = self.manifests.resolve(identifier)?;
        self.gate.enforce(&GateRequest::Library {
            identifier: identifier.to_string(),
            manifest: target.manifest_path.clone(),
            requires_native: target.manifest.requires_native,
        })?;

        trace_import(print, "found at:", &target.target.display().to_string());
        span.record_resolved(&target.target);

        let bridge = NativeBridge {
            library: target.library.clone(),
            manifest: target.manifest_path.clone(),
            requires_native: target.manifest.requires_native,
        };
        self.run(
            &target.target,
            &target.entry_point,
            RequireType::Library,
            Some(bridge),
            BTreeMap::new(),
        )
    }

    fn run(
        self: &Arc<Self>,
        target: &Path,
        file_name: &Path,
        require_type: RequireType,
        bridge: Option<NativeBridge>,
        extras: BTreeMap<String, Value>,
    ) -> LoaderResult<Value> {
        let import_failure = |reason: &str| {
            error!(path = %target.display(), reason, "Import failed");
            LoaderError::ImportFailure {
                path: target.to_path_buf(),
                reason: reason.to_string(),
            }
        };
        if !target.exists() {
            return Err(import_failure("File doesn't exist"));
        }
        if !target.is_file() {
            return Err(import_failure("Path specified is not a file"));
        }
        let key = fs::canonicalize(target).map_err(|e| import_failure(&e.to_string()))?;

        self.cache.get_or_create(&key, || {
            let source = FileResource::new(&key).read(Encoding::Utf8)?;
            // Library units report the entry point through Context.fileName
            let context_file = if require_type == RequireType::Library {
                file_name
            } else {
                key.as_path()
            };
            let context = self.contexts.build(ContextRequest {
                unit_path: &key,
                file_name: context_file,
                require_type,
                require: self.bound_require(&key, bridge.clone()),
                require_native: bridge.clone().map(|bridge| self.native_bridge(bridge)),
                extras,
            });
            self.executor.execute(&source, context, &key)
        })
    }

    /// `require` closed over the executing unit's own path
    fn bound_require(self: &Arc<Self>, unit: &Path, bridge: Option<NativeBridge>) -> Value {
        let loader: Weak<LoaderInner> = Arc::downgrade(self);
        let unit = unit.to_path_buf();
        Value::native("require", move |args| {
            let requested = match args.first() {
                Some(Value::Str(requested)) => requested.clone(),
                other => {
                    return Err(ScriptError::runtime(format!(
                        "require expects a string, got {}",
                        other.map(Value::type_name).unwrap_or("nothing")
                    )))
                }
            };
            let loader = upgrade(&loader)?;
            Ok(loader.require(&unit, &requested, bridge.as_ref())?)
        })
    }

    /// `require_native` for units of the bridged library
    fn native_bridge(self: &Arc<Self>, bridge: NativeBridge) -> Value {
        let loader: Weak<LoaderInner> = Arc::downgrade(self);
        Value::native("require_native", move |args| {
            let module = match args.first() {
                Some(Value::Str(module)) => module.clone(),
                other => {
                    return Err(ScriptError::runtime(format!(
                        "require_native expects a string, got {}",
                        other.map(Value::type_name).unwrap_or("nothing")
                    )))
                }
            };
            let loader = upgrade(&loader)?;
            Ok(loader.require_native(&module, &bridge)?)
        })
    }

    fn require_native(&self, module: &str, bridge: &NativeBridge) -> LoaderResult<Value> {
        let name = NativeModules::normalize(module);
        let path = self.config.library_root().join(NATIVE_DIR).join(&name);

        self.gate.enforce(&GateRequest::Native {
            module: name.clone(),
            path: path.clone(),
            library: bridge.manifest.clone(),
            requires_native: bridge.requires_native,
        })?;

        if !self.natives.contains(&name) {
            error!(module = %name, library = %bridge.library, "Native module not found");
            return Err(native::not_found(&name, &path));
        }

        self.cache.get_or_create(&path, || {
            self.natives
                .instantiate(&name)
                .unwrap_or_else(|| Err(native::not_found(&name, &path)))
        })
    }
}

fn upgrade(loader: &Weak<LoaderInner>) -> Result<Arc<LoaderInner>, ScriptError> {
    loader
        .upgrade()
        .ok_or_else(|| ScriptError::runtime("loader is no longer available"))
}
