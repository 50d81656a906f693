//! Logging and tracing setup.
//!
//! All logs are written to **stderr**; stdout belongs to the host runtime
//! that loads the provider.
//!
//! # Environment Variables
//!
//! - `APPTRUST_LOG`: filter for this provider (e.g. `apptrust_provider=debug`)
//! - `RUST_LOG`: used when `APPTRUST_LOG` is not set
//!
//! ```bash
//! APPTRUST_LOG=apptrust_provider=debug terraform apply
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Provider-specific filter variable, checked before `RUST_LOG`.
pub const LOG_ENV: &str = "APPTRUST_LOG";

const DEFAULT_LEVEL: &str = "info";

/// Initialize the default logging subscriber at `info` level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_LEVEL);
}

/// Initialize logging, using `default_level` when neither `APPTRUST_LOG` nor
/// `RUST_LOG` is set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(stderr_layer())
        .init();
}

/// Try to initialize logging, returning false if already initialized.
///
/// Useful in tests, where several cases may race to install a subscriber.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_LEVEL))
        .with(stderr_layer())
        .try_init()
        .is_ok()
}

/// Pick the filter directive from `APPTRUST_LOG`, then `RUST_LOG`, then the default.
pub fn filter_directive(
    lookup: impl Fn(&str) -> Option<String>,
    default_level: &str,
) -> String {
    [LOG_ENV, "RUST_LOG"]
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default_level.to_string())
}

fn env_filter(default_level: &str) -> EnvFilter {
    let directive = filter_directive(|name| std::env::var(name).ok(), default_level);
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}
