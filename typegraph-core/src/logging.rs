//! Structured logging using **tracing**.
//!
//! The library itself only emits events; hosts decide where they go by calling
//! one of the `init_*` functions once at startup. The JSON subscriber provides
//! machine-readable output and keeps stdout free for generated content.

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

/// Initializes the global tracing collector (subscriber).
///
/// This should be called *once* at the beginning of the application's runtime.
/// It configures structured JSON output to stderr at the default level.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=typegraph_core=debug`)
pub fn init_structured_logging() {
    init_structured_logging_with(LogLevel::default());
}

/// Like [`init_structured_logging`], but falls back to the configured level
/// when `RUST_LOG` is not set. `LogLevel::None` installs nothing.
pub fn init_structured_logging_with(level: LogLevel) {
    let Some(directive) = level.as_directive() else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
