//! Logging configuration for the profiler.
//!
//! Every metric invocation, data source dispatch and dashboard calculation
//! runs inside a `tracing` span. [`LogConfig`] controls the optional, more
//! verbose events; [`setup`] installs a `tracing-subscriber` stack for
//! binaries and examples.

/// Verbosity knobs consulted by the dashboard, views and the logging macros.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to log each metric's parameters and result shape
    pub log_metric_details: bool,
    /// Whether to log data source operations
    pub log_data_operations: bool,
    /// Maximum length for logged query text and error messages
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_metric_details: false,
            log_data_operations: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging.
    pub fn verbose() -> Self {
        Self {
            log_metric_details: true,
            log_data_operations: true,
            max_field_length: 1024,
        }
    }
}

/// Logs at debug level when `log_metric_details` is on.
#[macro_export]
macro_rules! log_metric {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_metric_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Logs at info level when `log_data_operations` is on.
#[macro_export]
macro_rules! log_data_op {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_data_operations {
            tracing::info!($($arg)*);
        }
    };
}

/// Truncates a string to at most `max_length` bytes, backing off to the
/// nearest character boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber installation for binaries, examples and benches.
pub mod setup {
    use tracing::Level;

    use crate::error::{ProfilerError, Result};

    /// Configuration for the global subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything outside this crate
        pub level: Level,
        /// Log level for `term_profiler` targets
        pub profiler_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                profiler_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// JSON output, warnings only outside the crate.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                profiler_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                profiler_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_profiler_level(mut self, level: Level) -> Self {
            self.profiler_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            match &self.env_filter {
                Some(filter) => filter.clone(),
                None => format!(
                    "{},term_profiler={}",
                    self.level.as_str().to_lowercase(),
                    self.profiler_level.as_str().to_lowercase()
                ),
            }
        }
    }

    /// Installs a global subscriber. `RUST_LOG` takes precedence over the
    /// configured filter. Fails if a global subscriber is already set.
    ///
    /// ```rust,no_run
    /// use term_profiler::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| ProfilerError::configuration(format!("logging already initialised: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use super::*;

    #[test]
    fn test_log_config_presets() {
        let config = LogConfig::default();
        assert!(!config.log_metric_details);
        assert!(config.log_data_operations);
        assert_eq!(config.max_field_length, 256);

        let verbose = LogConfig::verbose();
        assert!(verbose.log_metric_details);
        assert_eq!(verbose.max_field_length, 1024);
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(
            truncate_field("this is a very long text that should be truncated", 10),
            "this is a ...(truncated)"
        );
        // 'é' occupies bytes 3 and 4
        assert_eq!(truncate_field("Café Road", 4), "Caf...(truncated)");
    }

    #[test]
    fn test_env_filter() {
        assert_eq!(LoggingConfig::default().env_filter(), "info,term_profiler=debug");
        assert_eq!(LoggingConfig::production().env_filter(), "warn,term_profiler=info");
        assert!(LoggingConfig::production().json_format);
        assert_eq!(
            LoggingConfig::default()
                .with_env_filter("warn")
                .env_filter(),
            "warn"
        );
    }
}
