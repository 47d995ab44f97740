//! Integration tests for the logging configuration surface.

use core_runtime::logging::{LogFormat, LogLevel, LoggingConfig};

#[test]
fn test_config_chaining() {
    // We can only install a global subscriber once per process, so these
    // exercise the builder rather than init_logging itself.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_target(false);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.display_target);
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}

#[test]
fn test_filter_configuration() {
    let config = LoggingConfig::default().with_filter("core_sync=trace,sqlx=warn");

    assert_eq!(config.filter, Some("core_sync=trace,sqlx=warn".to_string()));
}
