//! Runtime configuration loaded from the environment.
//!
//! SYSTEM CONTEXT
//! ==============
//! `main` calls `dotenvy::dotenv()` first, then builds one `AppConfig` that
//! is carried inside `AppState`. Nothing else reads process env after startup.

use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{key} is invalid: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Parse a boolean-ish environment variable. Unset or unrecognized values
/// return `None` so callers can apply their own default.
pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| parse_bool(&raw))
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_parse<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        _ => Ok(default),
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    /// Mark the session cookie `Secure`.
    pub cookie_secure: bool,
    /// Allow self-service password sign-up.
    pub allow_signup: bool,
    /// Accept the hardcoded demo credentials when real sign-in fails.
    pub demo_login_enabled: bool,
    /// Directory holding the built dashboard front-end, if served by this process.
    pub static_dir: Option<PathBuf>,
    pub session_ttl_hours: i64,
}

/// Session expiry is computed in SQL with an `int` hour count, so the TTL
/// must be positive and fit in `i32`.
fn checked_session_ttl(hours: i64) -> Result<i64, ConfigError> {
    if hours <= 0 || hours > i64::from(i32::MAX) {
        return Err(ConfigError::Invalid { key: "SESSION_TTL_HOURS", value: hours.to_string() });
    }
    Ok(hours)
}

impl AppConfig {
    /// Build the configuration from process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a numeric variable
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let session_ttl_hours = checked_session_ttl(env_parse("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?)?;

        Ok(Self {
            database_url,
            port: env_parse("PORT", DEFAULT_PORT)?,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            cookie_secure: env_bool("COOKIE_SECURE").unwrap_or(false),
            allow_signup: env_bool("ALLOW_SIGNUP").unwrap_or(false),
            demo_login_enabled: env_bool("DEMO_LOGIN_ENABLED").unwrap_or(false),
            static_dir: std::env::var("STATIC_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            session_ttl_hours,
        })
    }

    /// Configuration for tests and tooling that never touch process env.
    #[must_use]
    pub fn for_database(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_owned(),
            port: DEFAULT_PORT,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            cookie_secure: false,
            allow_signup: false,
            demo_login_enabled: false,
            static_dir: None,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
