//! Tracing/logging initialization.
//!
//! JSON lines with timestamps. `RUST_LOG` overrides the default directive, e.g.
//! `RUST_LOG=racha_infra=debug` to see rejected settlement commands.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times: returns `false` and leaves the installed subscriber in
/// place when one already exists.
pub fn init(default_directive: &str) -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter(default_directive))
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init()
        .is_ok();

    if !installed {
        ::tracing::debug!(default_directive, "subscriber already installed; keeping it");
    }
    installed
}

/// `RUST_LOG` when set and valid, else `default_directive`.
fn filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}
