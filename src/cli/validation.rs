//! CLI argument validation functions
//!
//! Value parsers for arguments that need more than a type conversion.

use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Longest token lifetime the `token` command will mint, in hours (one year)
const MAX_TOKEN_HOURS: i64 = 24 * 365;

/// Validate port number is within valid range (1-65535)
pub fn validate_port(port_str: &str) -> Result<u16, String> {
    match port_str.parse::<u16>() {
        Ok(0) => Err("Port must be between 1 and 65535. Port 0 is not allowed.".to_string()),
        Ok(port) => Ok(port),
        Err(_) => Err(format!(
            "Port must be a valid number between 1 and 65535, got: '{}'",
            port_str
        )),
    }
}

/// Validate that a configuration file exists and is readable
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }
    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }

    std::fs::File::open(&path)
        .map(|_| path)
        .map_err(|e| format!("Cannot read configuration file '{}': {}", path_str, e))
}

/// Validate rollback steps (1-100)
pub fn validate_rollback_steps(steps_str: &str) -> Result<u32, String> {
    let steps: u32 = steps_str.parse().map_err(|_| {
        format!(
            "Rollback steps must be a valid positive number, got: '{}'",
            steps_str
        )
    })?;

    match steps {
        0 => Err("Rollback steps must be greater than 0".to_string()),
        101.. => Err("Rollback steps cannot exceed 100 for safety reasons".to_string()),
        _ => Ok(steps),
    }
}

/// Validate host address format
///
/// Dotted-quad hosts must be valid IPv4 addresses; anything else is taken
/// as a hostname.
pub fn validate_host_address(host_str: &str) -> Result<String, String> {
    let host = host_str.trim();

    if host.is_empty() {
        return Err("Host address cannot be empty".to_string());
    }
    if host.contains(char::is_whitespace) {
        return Err("Host address cannot contain spaces".to_string());
    }
    if host.len() > 253 {
        return Err("Host address is too long (maximum 253 characters)".to_string());
    }
    if host.chars().all(|c| c.is_ascii_digit() || c == '.') && host.parse::<Ipv4Addr>().is_err() {
        return Err(format!("Invalid IPv4 address format: '{}'", host_str));
    }

    Ok(host.to_string())
}

/// Validate a token subject: non-empty, no whitespace
pub fn validate_subject(subject_str: &str) -> Result<String, String> {
    let subject = subject_str.trim();
    if subject.is_empty() {
        return Err("Subject cannot be empty".to_string());
    }
    if subject.contains(char::is_whitespace) {
        return Err(format!("Subject cannot contain whitespace: '{}'", subject_str));
    }
    Ok(subject.to_string())
}

/// Validate token lifetime in hours (1 hour to 1 year)
pub fn validate_expiry_hours(hours_str: &str) -> Result<i64, String> {
    let hours: i64 = hours_str
        .parse()
        .map_err(|_| format!("Expiry must be a whole number of hours, got: '{}'", hours_str))?;

    if !(1..=MAX_TOKEN_HOURS).contains(&hours) {
        return Err(format!(
            "Expiry must be between 1 and {} hours",
            MAX_TOKEN_HOURS
        ));
    }
    Ok(hours)
}
