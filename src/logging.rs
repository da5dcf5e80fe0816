use tracing_subscriber::{fmt::layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sidecar logging setup. Everything goes to stderr: stdout is the
/// protocol channel and must carry nothing but response lines.
pub fn init() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// Same shape for tests, tolerant of repeated init across test cases.
pub fn init_test() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(
            layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
