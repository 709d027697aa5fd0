use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

/// Console logging on stderr so stdout stays reserved for the line protocol.
/// `RUST_LOG` overrides the default `warn` filter.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
