//! Logging and tracing setup.
//!
//! All logs are written to **stderr**; stdout belongs to the host process
//! protocol. The filter is taken from `RUST_LOG` when set, otherwise from
//! Terraform's `TF_LOG` level, otherwise from the given default.
//!
//! # Examples
//!
//! ```bash
//! # Debug logs for this crate only, including every PATCH operation
//! RUST_LOG=pingdirectory_provider=debug terraform apply
//!
//! # Follow Terraform's own log level
//! TF_LOG=DEBUG terraform apply
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable carrying Terraform's log level.
pub const TF_LOG_ENV: &str = "TF_LOG";

/// Map a `TF_LOG` value onto a tracing filter directive.
///
/// `JSON` and unrecognised values map to `trace` and `None` respectively,
/// matching how Terraform itself treats them.
pub fn filter_from_tf_log(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" | "JSON" => Some("trace"),
        "DEBUG" => Some("debug"),
        "INFO" => Some("info"),
        "WARN" => Some("warn"),
        "ERROR" => Some("error"),
        _ => None,
    }
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var(TF_LOG_ENV)
            .ok()
            .and_then(|v| filter_from_tf_log(&v))
            .unwrap_or(default_level);
        EnvFilter::new(level)
    })
}

fn layer<S>() -> impl tracing_subscriber::Layer<S>
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

/// Initialize logging at `info` unless the environment says otherwise.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Initialize logging with a custom default level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(build_filter(default_level))
        .with(layer())
        .init();
}

/// Try to initialize logging, returning false if already initialized.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(build_filter("info"))
        .with(layer())
        .try_init()
        .is_ok()
}
