//! Diagnostics for tool processes
//!
//! stdout carries exactly one envelope, so every log line goes to stderr.

use crate::cli::Verbosity;
use std::io;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Filter override checked before `RUST_LOG`
pub const ENV_LOG: &str = "TOOLRUNNER_LOG";

/// Set to `1` or `true` for JSON log lines
pub const ENV_LOG_JSON: &str = "TOOLRUNNER_LOG_JSON";

/// Default filter directive for a verbosity level
pub fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "toolrunner=error",
        Verbosity::Normal => "toolrunner=warn",
        Verbosity::Verbose => "toolrunner=info",
        Verbosity::VeryVerbose => "toolrunner=debug",
    }
}

/// Pick the filter directive from the environment or the verbosity.
pub fn filter_directive<F>(verbosity: Verbosity, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(ENV_LOG)
        .or_else(|| lookup("RUST_LOG"))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default_directive(verbosity).to_string())
}

fn json_requested<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    matches!(
        lookup(ENV_LOG_JSON).as_deref().map(str::trim),
        Some("1") | Some("true")
    )
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_tracing(verbosity: Verbosity) {
    let lookup = |key: &str| std::env::var(key).ok();
    let directive = filter_directive(verbosity, lookup);
    let filter = EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = if json_requested(lookup) {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_target(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_ansi(false),
            )
            .try_init()
    };
}
