// Logging setup for the terminal front end
//
// Logs go to stderr so the countdown display on stdout stays readable.
// RUST_LOG takes precedence; otherwise POMODORO_DEBUG=1 turns on debug output
// for this crate.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let debug_logging = std::env::var("POMODORO_DEBUG").is_ok_and(|v| v != "0");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug_logging {
            "warn,pomodoro=debug"
        } else {
            "warn,pomodoro=info"
        })
    });

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let initialized = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .try_init()
        .is_ok();

    if initialized {
        tracing::debug!(debug_logging, "Logging initialized");
    }
}
