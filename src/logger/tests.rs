//! Tests for the logger module

use std::io::Write;
use std::str::FromStr;

use tempfile::TempDir;

use crate::logger::config::*;
use crate::logger::open_log_file;

fn file_config(dir: &TempDir, append: bool) -> FileConfig {
    FileConfig {
        enabled: true,
        path: dir.path().join("nested").join("depot.log"),
        append,
        format: LogFormat::Json,
    }
}

#[test]
fn test_default_config_is_valid() {
    let config = LoggerConfig::default();
    assert!(config.validate().is_ok());
    assert!(config.console.enabled);
    assert!(!config.file.enabled);
    assert_eq!(config.level, "info");
}

#[test]
fn test_both_outputs_disabled() {
    let config = LoggerConfig {
        console: ConsoleConfig::new(false, false),
        file: FileConfig {
            enabled: false,
            ..Default::default()
        },
        level: "info".to_string(),
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_log_level() {
    let result = LoggerConfig::new(
        ConsoleConfig::default(),
        FileConfig::default(),
        "chatty".to_string(),
    );
    assert!(result.is_err());
}

#[test]
fn test_log_format_parsing() {
    assert_eq!(LogFormat::from_str("FULL").unwrap(), LogFormat::Full);
    assert_eq!(LogFormat::from_str("compact").unwrap(), LogFormat::Compact);
    assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
    assert!(LogFormat::from_str("xml").is_err());
    assert_eq!(LogFormat::default(), LogFormat::Full);
}

#[test]
fn test_enabled_file_requires_path() {
    let config = FileConfig {
        enabled: true,
        path: "".into(),
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_open_log_file_creates_parent_directory() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir, true);

    let mut file = open_log_file(&config).expect("log file should open");
    writeln!(file, "first").unwrap();

    assert!(config.path.exists());
}

#[test]
fn test_open_log_file_append_and_truncate() {
    let dir = TempDir::new().unwrap();

    let appending = file_config(&dir, true);
    writeln!(open_log_file(&appending).unwrap(), "one").unwrap();
    writeln!(open_log_file(&appending).unwrap(), "two").unwrap();
    let contents = std::fs::read_to_string(&appending.path).unwrap();
    assert_eq!(contents.lines().count(), 2);

    let truncating = file_config(&dir, false);
    writeln!(open_log_file(&truncating).unwrap(), "three").unwrap();
    let contents = std::fs::read_to_string(&truncating.path).unwrap();
    assert_eq!(contents.trim(), "three");
}
