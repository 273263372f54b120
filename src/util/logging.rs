//! Structured logging setup
//!
//! Initialization and configuration for the `tracing` ecosystem: console
//! output on stderr by default, optional JSON output, `RUST_LOG` /
//! `MODLINK_LOG_LEVEL` environment configuration. Diagnostics from the
//! search pipeline (duplicate versions, malformed configs, skipped search
//! paths) all flow through this subscriber, so `--silent` and verbosity
//! flags act uniformly.

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once.
static INIT: Once = Once::new();

/// Configuration for logging initialization.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display.
    pub level: Level,

    /// Use JSON output format (structured logging in CI).
    pub use_json: bool,

    /// Include the module target (e.g., modlink::search) in logs.
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
        }
    }
}

/// Initializes logging with the default configuration.
pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Initializes logging from `MODLINK_LOG_LEVEL` and `MODLINK_LOG_JSON`.
pub fn init_from_env() {
    let level = env::var("MODLINK_LOG_LEVEL")
        .ok()
        .and_then(|value| parse_level(&value))
        .unwrap_or(Level::INFO);
    let use_json = env::var("MODLINK_LOG_JSON")
        .ok()
        .and_then(|value| value.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        use_json,
        ..LoggingConfig::default()
    });
}

/// Initializes the global tracing subscriber. Safe to call more than once;
/// only the first call takes effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            if let Ok(directive) = format!("modlink={}", config.level).parse() {
                filter = filter.add_directive(directive);
            }
        }

        // Output goes to stderr so formatted results on stdout stay clean
        // for piping.
        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}

pub(crate) fn parse_level(value: &str) -> Option<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}
