/*!
 * Tracing
 * Subscriber setup and spans for require calls
 */

use crate::core::{LoaderError, ENV_TRACE_JSON};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize structured tracing on stderr
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - LOTUS_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        debug!(json = use_json, "Tracing initialized");
    }
}

/// Span covering one require call, from request to export value
pub struct RequireSpan {
    span: tracing::Span,
    start: Instant,
    trace_id: Uuid,
}

impl RequireSpan {
    pub fn new(requested: &str, current: &Path) -> Self {
        let trace_id = Uuid::new_v4();
        let span = span!(
            Level::DEBUG,
            "require",
            trace_id = %trace_id,
            requested = requested,
            current = %current.display(),
            resolved = tracing::field::Empty,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            trace_id,
        }
    }

    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    pub fn record_resolved(&self, path: &Path) {
        self.span.record("resolved", &tracing::field::display(path.display()));
    }

    pub fn record_success(&self) {
        self.span.record("result", "success");
    }

    pub fn record_error(&self, error: &LoaderError) {
        self.span.record("error", error.kind());
        self.span.record("result", "error");
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for RequireSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration.as_millis() > 100 {
            warn!(
                trace_id = %self.trace_id,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow require detected"
            );
        }
    }
}

/// Helper to create a require span
#[inline]
pub fn span_require(requested: &str, current: &Path) -> RequireSpan {
    RequireSpan::new(requested, current)
}
