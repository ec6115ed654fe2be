use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr subscriber used by every binary.
///
/// `RUST_LOG` overrides the default `info` filter. Stdout stays free for the
/// progress lines the analyst reads.
pub fn init() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
pub(crate) fn init_test_logging() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,rowtally=debug")),
        )
        .with_test_writer()
        .try_init();
}
