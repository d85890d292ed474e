//! Paygate Logging
//!
//! Configures the process-wide `tracing` subscriber for paygate services.
//! Library crates in the workspace emit events through `tracing` directly;
//! binaries call [`init`] once at startup.
//!
//! # Usage
//!
//! ```rust,ignore
//! paygate_log::init();
//! tracing::info!(order_id = %order.id, "order created");
//! ```
//!
//! # Environment Variables
//!
//! - `PAYGATE_DEBUG=1` - Enable debug logging
//! - `PAYGATE_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `PAYGATE_LOG_FORMAT=pretty|json|compact` - Set output format
//! - `PAYGATE_LOG_COLOR=1|0` - Enable/disable colors
//! - `PAYGATE_LOG_MODULE=1|0` - Include the event target
//!
//! `RUST_LOG`, when set, takes precedence over the level.

use std::env;

// ============================================================================
// Log Levels
// ============================================================================

/// Minimum level of emitted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// No logging
    Off,
}

impl Level {
    /// Get level from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    /// Filter directive understood by `EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_directive().to_uppercase())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line human readable format
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON format for structured logging
    Json,
}

impl Format {
    /// Get format from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether debug mode is enabled
    pub debug: bool,
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether colors are enabled
    pub color: bool,
    /// Whether to include the event target
    pub module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Json,
            color: false,
            module_path: true,
        }
    }
}

fn flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl LogConfig {
    /// Create config from `PAYGATE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let debug = lookup("PAYGATE_DEBUG").map(|v| flag(&v)).unwrap_or(false);

        let level = lookup("PAYGATE_LOG_LEVEL")
            .and_then(|s| Level::from_str(&s))
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = lookup("PAYGATE_LOG_FORMAT")
            .and_then(|s| Format::from_str(&s))
            .unwrap_or(Format::Json);

        let color = lookup("PAYGATE_LOG_COLOR")
            .map(|v| flag(&v))
            .unwrap_or_else(|| lookup("NO_COLOR").is_none() && lookup("TERM").is_some());

        let module_path = lookup("PAYGATE_LOG_MODULE")
            .map(|v| flag(&v))
            .unwrap_or(true);

        Self {
            debug,
            level,
            format,
            color: color && format != Format::Json,
            module_path,
        }
    }
}

// ============================================================================
// Subscriber Installation
// ============================================================================

#[cfg(feature = "tracing")]
mod subscriber {
    use super::*;
    use once_cell::sync::OnceCell;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::util::TryInitError;
    use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

    static INSTALLED: OnceCell<()> = OnceCell::new();

    /// Build the filter: `RUST_LOG` if set, otherwise the configured level.
    pub fn filter(config: &LogConfig) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()))
    }

    fn fmt_layer(config: &LogConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
        match config.format {
            Format::Pretty => fmt::layer()
                .pretty()
                .with_ansi(config.color)
                .with_target(config.module_path)
                .boxed(),
            Format::Compact => fmt::layer()
                .compact()
                .with_ansi(config.color)
                .with_target(config.module_path)
                .boxed(),
            #[cfg(feature = "json")]
            Format::Json => fmt::layer()
                .json()
                .with_target(config.module_path)
                .boxed(),
            #[cfg(not(feature = "json"))]
            Format::Json => fmt::layer()
                .with_ansi(false)
                .with_target(config.module_path)
                .boxed(),
        }
    }

    /// Install the global subscriber, failing if one is already set.
    pub fn try_init_with(config: &LogConfig) -> Result<(), TryInitError> {
        tracing_subscriber::registry()
            .with(fmt_layer(config))
            .with(filter(config))
            .try_init()
    }

    /// Install the global subscriber from the environment.
    pub fn try_init() -> Result<(), TryInitError> {
        try_init_with(&LogConfig::from_env())
    }

    /// Install the global subscriber once; later calls are no-ops.
    pub fn init() {
        INSTALLED.get_or_init(|| {
            if let Err(e) = try_init() {
                tracing::debug!(error = %e, "global subscriber already installed");
            }
        });
    }

    /// Whether [`init`] has run in this process.
    pub fn is_initialized() -> bool {
        INSTALLED.get().is_some()
    }
}

#[cfg(feature = "tracing")]
pub use subscriber::{filter, init, is_initialized, try_init, try_init_with};

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Off);
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!(Level::from_str("DEBUG"), Some(Level::Debug));
        assert_eq!(Level::from_str("warning"), Some(Level::Warn));
        assert_eq!(Level::from_str("none"), Some(Level::Off));
        assert_eq!(Level::from_str("invalid"), None);
        assert_eq!(Level::Warn.to_string(), "WARN");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(Format::from_str("pretty"), Some(Format::Pretty));
        assert_eq!(Format::from_str("Compact"), Some(Format::Compact));
        assert_eq!(Format::from_str("xml"), None);
    }

    #[test]
    fn test_config_defaults() {
        let config = LogConfig::from_lookup(lookup(&[]));
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn test_debug_lowers_level() {
        let config = LogConfig::from_lookup(lookup(&[("PAYGATE_DEBUG", "true")]));
        assert!(config.debug);
        assert_eq!(config.level, Level::Debug);

        let config = LogConfig::from_lookup(lookup(&[
            ("PAYGATE_DEBUG", "1"),
            ("PAYGATE_LOG_LEVEL", "warn"),
        ]));
        assert_eq!(config.level, Level::Warn);
    }

    #[test]
    fn test_color_follows_format() {
        let config = LogConfig::from_lookup(lookup(&[
            ("PAYGATE_LOG_FORMAT", "pretty"),
            ("PAYGATE_LOG_COLOR", "1"),
        ]));
        assert!(config.color);

        let config = LogConfig::from_lookup(lookup(&[("PAYGATE_LOG_COLOR", "1")]));
        assert!(!config.color);
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        assert!(is_initialized());
        assert!(try_init().is_err());
    }
}
