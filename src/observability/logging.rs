//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Resolve the log level from `RUST_LOG`, falling back to configuration

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilityConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `config.log_level`. Calling this twice is harmless;
/// the second call leaves the first subscriber in place.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.log_level));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(format!("custody_engine={level},warn"))
        .unwrap_or_else(|_| EnvFilter::new("custody_engine=info,warn"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_default_filter_uses_configured_level() {
        assert_eq!(default_filter("debug").max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(default_filter("trace").max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn test_bad_level_falls_back_to_info() {
        assert_eq!(
            default_filter("not a level!!").max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        let config = ObservabilityConfig::default();
        init(&config);
        init(&config);
    }
}
