//! Configuration module for the check-in backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Raised when an environment variable is set but cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid {key} value {value:?}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file holding forms, users and sessions
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Lifetime of sessions issued by `issue-session`
    pub session_ttl_hours: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("CHECKIN_DB_PATH")
            .unwrap_or_else(|_| "./data/checkin.sqlite".to_string())
            .into();

        let bind_addr = parse_var("CHECKIN_BIND_ADDR", "127.0.0.1:8080")?;

        let log_level = env::var("CHECKIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = env::var("CHECKIN_LOG_JSON")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let session_ttl_hours = parse_var("CHECKIN_SESSION_TTL_HOURS", "336")?;

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            log_json,
            session_ttl_hours,
        })
    }
}

fn parse_var<T>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    match value.parse::<T>() {
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(ConfigError {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_and_invalid_values() {
        // Clear any existing env vars
        env::remove_var("CHECKIN_DB_PATH");
        env::remove_var("CHECKIN_BIND_ADDR");
        env::remove_var("CHECKIN_LOG_LEVEL");
        env::remove_var("CHECKIN_LOG_JSON");
        env::remove_var("CHECKIN_SESSION_TTL_HOURS");

        let config = Config::from_env().unwrap();

        assert_eq!(config.db_path, PathBuf::from("./data/checkin.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.session_ttl_hours, 336);

        env::set_var("CHECKIN_SESSION_TTL_HOURS", "two weeks");
        let err = Config::from_env().unwrap_err();
        env::remove_var("CHECKIN_SESSION_TTL_HOURS");

        assert_eq!(err.key, "CHECKIN_SESSION_TTL_HOURS");
        assert_eq!(err.value, "two weeks");
    }
}
