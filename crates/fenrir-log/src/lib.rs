//! Structured logging for the simulation core.
//!
//! Sets up a `tracing` subscriber with environment-based filtering and a
//! console layer. The simulation crates log through `tracing` macros;
//! hosts call [`init_logging`] once at startup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter: info everywhere, with the per-step trace spam from
/// the physics crate gated down to debug.
const DEFAULT_FILTER: &str = "info,fenrir_physics=debug";

/// Initialize the tracing subscriber.
///
/// Filter precedence: the `RUST_LOG` environment variable wins, then
/// `level_override` (typically from a tuning file), then the built-in
/// default. Console output carries uptime timestamps, levels, and
/// module targets.
///
/// # Examples
///
/// ```no_run
/// fenrir_log::init_logging(None);
/// fenrir_log::init_logging(Some("debug,fenrir_skeleton=trace"));
/// ```
pub fn init_logging(level_override: Option<&str>) {
    let fallback = level_override.unwrap_or(DEFAULT_FILTER);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

/// The default `EnvFilter`, for tests and embedded hosts that build
/// their own subscriber stack.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
