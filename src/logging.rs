//! Tracing subscriber setup for the `hf` binary.

use tracing_subscriber::EnvFilter;

/// Install a console subscriber writing to stderr.
///
/// `verbosity` comes from repeated `-v` flags; `RUST_LOG` takes precedence when set.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hotel_forecast={level}")));

    // A second init (e.g. from tests) is harmless; keep the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
