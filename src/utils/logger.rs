use crate::utils::error::{OrderError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Shape of the log lines written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One terse line per event, for a terminal.
    #[default]
    Compact,
    /// JSON lines, for runs driven by a scheduler that ships logs.
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }
}

/// Filter used when `RUST_LOG` is unset: dependencies only warn, this crate
/// logs at info, or debug when verbose.
pub fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("warn,{}={}", CRATE_TARGET, level)
}

/// Installs the global subscriber. Fails when one is already installed.
pub fn init_logger(format: LogFormat, verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Compact => registry.with(layer.compact().without_time()).try_init(),
        LogFormat::Json => registry.with(layer.json().with_current_span(false)).try_init(),
    };
    installed.map_err(|e| OrderError::ConfigError {
        message: format!("cannot install logger: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_follows_verbosity() {
        assert_eq!(default_directive(false), "warn,kimsufi_order=info");
        assert_eq!(default_directive(true), "warn,kimsufi_order=debug");
        assert!(EnvFilter::try_new(default_directive(true)).is_ok());
    }

    #[test]
    fn test_format_from_flag() {
        assert_eq!(LogFormat::from_json_flag(true), LogFormat::Json);
        assert_eq!(LogFormat::from_json_flag(false), LogFormat::default());
    }

    #[test]
    fn test_second_logger_is_refused() {
        let _ = init_logger(LogFormat::Compact, false);

        let err = init_logger(LogFormat::Json, true).unwrap_err();

        assert!(matches!(err, OrderError::ConfigError { .. }));
    }
}
