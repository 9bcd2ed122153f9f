//! Tracing subscriber setup for binaries embedding the library.
//!
//! The library itself only emits `tracing` events.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "info";

/// Build the filter: explicit directive, else `RUST_LOG`, else `info`.
pub fn env_filter(directive: Option<&str>) -> EnvFilter {
    match directive {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

/// Install a stderr subscriber.
///
/// Keep the returned guard alive for the lifetime of the program, dropping
/// it flushes pending log lines. Installing twice is a no-op.
pub fn init_logging(directive: Option<&str>) -> WorkerGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());

    let _ = tracing_subscriber::registry()
        .with(env_filter(directive))
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(false),
        )
        .try_init();

    guard
}
