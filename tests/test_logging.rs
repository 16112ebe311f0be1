//! Tests for logging configuration and format parsing
//!
//! Tests the pure functions in the logging module that turn environment
//! values and `-v` flags into a format and level.

use multimind::observability::logging::{parse_level, raise_level, LogFormat};
use tracing::Level;

#[test]
fn test_log_format_parse_json() {
    assert!(matches!(LogFormat::parse("json"), LogFormat::Json));
    assert!(matches!(LogFormat::parse("JSON"), LogFormat::Json));
    assert!(matches!(LogFormat::parse(" Json "), LogFormat::Json));
}

#[test]
fn test_log_format_parse_pretty() {
    assert!(matches!(LogFormat::parse("pretty"), LogFormat::Pretty));
    assert!(matches!(LogFormat::parse("PRETTY"), LogFormat::Pretty));
}

#[test]
fn test_log_format_parse_invalid_defaults_to_compact() {
    // Interactive use: unknown formats stay terminal-friendly
    assert!(matches!(LogFormat::parse("compact"), LogFormat::Compact));
    assert!(matches!(LogFormat::parse(""), LogFormat::Compact));
    assert!(matches!(LogFormat::parse("xml"), LogFormat::Compact));
}

#[test]
fn test_parse_level() {
    assert_eq!(parse_level("error"), Level::ERROR);
    assert_eq!(parse_level("WARN"), Level::WARN);
    assert_eq!(parse_level("Info"), Level::INFO);
    assert_eq!(parse_level(" debug "), Level::DEBUG);
    assert_eq!(parse_level("TRACE"), Level::TRACE);
}

#[test]
fn test_parse_level_invalid_defaults_to_warn() {
    assert_eq!(parse_level(""), Level::WARN);
    assert_eq!(parse_level("verbose"), Level::WARN);
}

#[test]
fn test_raise_level_steps_and_saturates() {
    assert_eq!(raise_level(Level::WARN, 0), Level::WARN);
    assert_eq!(raise_level(Level::WARN, 1), Level::INFO);
    assert_eq!(raise_level(Level::WARN, 2), Level::DEBUG);
    assert_eq!(raise_level(Level::ERROR, 4), Level::TRACE);
    assert_eq!(raise_level(Level::INFO, 200), Level::TRACE);
}
