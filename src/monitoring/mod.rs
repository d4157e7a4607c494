/*!
 * Monitoring
 * Structured tracing for the loader and launcher
 */

mod tracer;

pub use tracer::{init_tracing, span_require, RequireSpan};
