use tracing_subscriber::EnvFilter;

/// Variable holding the log filter, e.g. `PULSE_LOG=pulse_store=debug`.
pub const LOG_ENV: &str = "PULSE_LOG";

/// Install a stderr subscriber filtered by `PULSE_LOG` (default `warn`).
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
