/*!
 * Capability Context Builder
 * Assembles the host bindings a unit executes against
 */

use super::event_loop::EventLoop;
use super::host::{HostEnvironment, HostStreams};
use crate::core::LoaderError;
use crate::sandbox::{CapabilityContext, ScriptError, ScriptResult, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// How a unit was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequireType {
    File,
    Library,
    /// Entry units started by the launcher
    #[serde(rename = "unknown")]
    Unknown,
}

impl RequireType {
    pub fn as_str(self) -> &'static str {
        match self {
            RequireType::File => "File",
            RequireType::Library => "Library",
            RequireType::Unknown => "unknown",
        }
    }
}

/// Library a unit belongs to, giving it access to `require_native`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeBridge {
    pub library: String,
    pub manifest: PathBuf,
    pub requires_native: bool,
}

/// Everything describing one execution besides the bindings themselves
pub struct ContextRequest<'a> {
    /// Canonical path of the executing unit; bound as its own `fileName`
    pub unit_path: &'a Path,
    /// Seeds `Context.fileName`: the library entry point for library units
    pub file_name: &'a Path,
    pub require_type: RequireType,
    pub require: Value,
    pub require_native: Option<Value>,
    /// Caller-supplied globals, applied last so they override the defaults
    pub extras: BTreeMap<String, Value>,
}

/// Builds capability contexts from the loader's host snapshot
#[derive(Clone)]
pub struct ContextBuilder {
    host: Arc<HostEnvironment>,
    streams: HostStreams,
    events: Arc<EventLoop>,
    app_id: Option<String>,
}

impl ContextBuilder {
    pub fn new(
        host: Arc<HostEnvironment>,
        streams: HostStreams,
        events: Arc<EventLoop>,
        app_id: Option<String>,
    ) -> Self {
        Self {
            host,
            streams,
            events,
            app_id,
        }
    }

    pub fn host(&self) -> &HostEnvironment {
        &self.host
    }

    pub fn build(&self, request: ContextRequest<'_>) -> CapabilityContext {
        let mut context = CapabilityContext::new(request.require, request.unit_path);
        context
            .bind("Context", self.process_context(request.file_name))
            .bind("console", self.console())
            .bind("Timing", self.timing(request.unit_path))
            .bind("requireType", Value::str(request.require_type.as_str()));
        if let Some(require_native) = request.require_native {
            context.bind("require_native", require_native);
        }
        for (name, value) in request.extras {
            context.bind(name, value);
        }
        context
    }

    fn process_context(&self, file_name: &Path) -> Value {
        let host = &self.host;
        let streams = self.streams.clone();
        let stdin = Value::object([(
            "readLine",
            Value::native("readLine", move |_| {
                let line = streams.read_line().map_err(LoaderError::from)?;
                Ok(line.map(Value::Str).unwrap_or(Value::Null))
            }),
        )]);

        Value::object([
            (
                "argv",
                Value::list(host.argv().iter().cloned().map(Value::Str).collect()),
            ),
            (
                "env",
                Value::object(
                    host.env()
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::Str(v.clone()))),
                ),
            ),
            ("procId", Value::Number(f64::from(host.pid()))),
            ("fileName", Value::str(file_name.display().to_string())),
            ("root", Value::str(host.root().display().to_string())),
            ("user", Value::str(host.user())),
            (
                "appId",
                self.app_id.clone().map(Value::Str).unwrap_or(Value::Null),
            ),
            ("stdin", stdin),
            ("stdout", self.writer("stdout", false)),
            ("stderr", self.writer("stderr", true)),
            (
                "exit",
                Value::native("exit", |args| {
                    let code = match args.first() {
                        Some(Value::Number(n)) => *n as i32,
                        None | Some(Value::Null) => 0,
                        Some(other) => {
                            return Err(ScriptError::runtime(format!(
                                "exit code must be a number, got {}",
                                other.type_name()
                            )))
                        }
                    };
                    Err(ScriptError::Exit(code))
                }),
            ),
        ])
    }

    fn writer(&self, name: &str, to_stderr: bool) -> Value {
        let streams = self.streams.clone();
        let function = format!("{}.write", name);
        Value::object([(
            "write",
            Value::native(function, move |args| {
                let text: String = args.iter().map(|arg| arg.to_string()).collect();
                let written = if to_stderr {
                    streams.write_stderr(&text)
                } else {
                    streams.write_stdout(&text)
                };
                written.map_err(LoaderError::from)?;
                Ok(Value::Null)
            }),
        )])
    }

    fn console(&self) -> Value {
        let line = |args: &[Value]| {
            let mut text = args
                .iter()
                .map(|arg| arg.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            text.push('\n');
            text
        };

        let stdout_entry = |name: &'static str| {
            let streams = self.streams.clone();
            (
                name,
                Value::native(format!("console.{}", name), move |args| {
                    streams.write_stdout(&line(&args)).map_err(LoaderError::from)?;
                    Ok(Value::Null)
                }),
            )
        };
        let stderr_entry = |name: &'static str, warning: bool| {
            let streams = self.streams.clone();
            (
                name,
                Value::native(format!("console.{}", name), move |args| {
                    let text = line(&args);
                    if warning {
                        warn!(target: "lotus::console", "{}", text.trim_end());
                    } else {
                        error!(target: "lotus::console", "{}", text.trim_end());
                    }
                    streams.write_stderr(&text).map_err(LoaderError::from)?;
                    Ok(Value::Null)
                }),
            )
        };

        Value::object([
            stdout_entry("log"),
            stdout_entry("info"),
            stderr_entry("warn", true),
            stderr_entry("error", false),
        ])
    }

    fn timing(&self, unit_path: &Path) -> Value {
        let origin = unit_path.to_path_buf();

        let scheduler = |name: &'static str| {
            let events = Arc::clone(&self.events);
            let origin = origin.clone();
            (
                name,
                Value::native(name, move |args| {
                    let mut args = args.into_iter();
                    let callback = match args.next() {
                        Some(callback @ Value::Function(_)) => callback,
                        other => {
                            return Err(ScriptError::runtime(format!(
                                "{} expects a function, got {}",
                                name,
                                other.as_ref().map(Value::type_name).unwrap_or("nothing")
                            )))
                        }
                    };
                    let id = if name == "setImmediate" {
                        events.set_immediate(callback, args.collect(), origin.clone())
                    } else {
                        let delay = delay_arg(args.next())?;
                        let rest = args.collect();
                        if name == "setInterval" {
                            events.set_interval(callback, delay, rest, origin.clone())
                        } else {
                            events.set_timeout(callback, delay, rest, origin.clone())
                        }
                    };
                    Ok(Value::Number(id as f64))
                }),
            )
        };

        let canceller = |name: &'static str| {
            let events = Arc::clone(&self.events);
            (
                name,
                Value::native(name, move |args| {
                    if let Some(Value::Number(id)) = args.first() {
                        if *id >= 0.0 {
                            events.cancel(*id as u64);
                        }
                    }
                    Ok(Value::Null)
                }),
            )
        };

        Value::object([
            scheduler("setTimeout"),
            scheduler("setInterval"),
            scheduler("setImmediate"),
            canceller("clearTimeout"),
            canceller("clearInterval"),
            canceller("clearImmediate"),
        ])
    }
}

fn delay_arg(value: Option<Value>) -> ScriptResult<Duration> {
    match value {
        None | Some(Value::Null) => Ok(Duration::ZERO),
        Some(Value::Number(ms)) if ms.is_finite() => Ok(Duration::from_millis(ms.max(0.0) as u64)),
        Some(other) => Err(ScriptError::runtime(format!(
            "timer delay must be a number, got {}",
            other.type_name()
        ))),
    }
}

/// Log an import step when import tracing is on
pub fn trace_import(enabled: bool, step: &str, value: &str) {
    if enabled {
        info!(target: "lotus::imports", "{} {}", step, value);
    }
}
