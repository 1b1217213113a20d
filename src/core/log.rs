// Define a new module for logging initialization
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Diagnostics go to stderr; stdout is reserved for run progress.
///
/// When `RUST_LOG` is set it replaces the `--verbose` defaults entirely.
pub fn init_logging(verbose: bool) {
    let registry = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .without_time(),
    );

    match EnvFilter::try_from_default_env() {
        Ok(env_filter) => registry.with(env_filter).init(),
        Err(_) => registry.with(default_filter(verbose)).init(),
    }
}

fn default_filter(verbose: bool) -> Targets {
    let level_filter = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    Targets::new()
        .with_target("fxdwh", level_filter)
        .with_default(LevelFilter::WARN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_default_filter_levels() {
        let quiet = default_filter(false);
        assert!(quiet.would_enable("fxdwh::store", &Level::WARN));
        assert!(!quiet.would_enable("fxdwh::store", &Level::INFO));

        let verbose = default_filter(true);
        assert!(verbose.would_enable("fxdwh::providers::ecb", &Level::DEBUG));
        assert!(!verbose.would_enable("fxdwh", &Level::TRACE));
        assert!(!verbose.would_enable("hyper", &Level::DEBUG));
        assert!(verbose.would_enable("hyper", &Level::WARN));
    }
}
