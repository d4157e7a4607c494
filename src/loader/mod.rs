/*!
 * Loader Module
 * Resolution, caching, capability contexts, and the require orchestrator
 */

pub mod cache;
pub mod config;
pub mod context;
pub mod event_loop;
pub mod file_resolver;
pub mod host;
pub mod native;
pub mod orchestrator;

// Re-exports
pub use cache::{CacheStats, ModuleCache};
pub use config::{LoaderConfig, LoaderConfigBuilder};
pub use context::{trace_import, ContextBuilder, ContextRequest, NativeBridge, RequireType};
pub use event_loop::{EventLoop, TimerId};
pub use file_resolver::FileResolver;
pub use host::{HostEnvironment, HostStreams, SharedBuffer};
pub use native::{NativeFactory, NativeModules};
pub use orchestrator::{Loader, LoaderBuilder};
