use std::str::FromStr;

use studio_auth_core::config::{env_lookup, resolve_database_url};
use studio_auth_core::error::CoreError;
use studio_auth_core::session_token::DEFAULT_SESSION_TTL_DAYS;

/// Default name of the cookie carrying the session token.
pub const DEFAULT_COOKIE_NAME: &str = "diagram-studio-session";

/// Longest accepted session lifetime in days.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

/// Session and request-identity settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cookie carrying the session token (default: `diagram-studio-session`).
    pub cookie_name: String,
    /// Session lifetime in days (default: `7`, at most `3650`).
    pub ttl_days: i64,
    /// Mark the session cookie `Secure` (default: `false`).
    pub cookie_secure: bool,
    /// Accept `x-user` / `x-role` headers as identity without a session
    /// (default: `false`). Only enable behind a boundary that strips these
    /// headers from external traffic.
    pub trust_identity_headers: bool,
    /// Interval of the expired-session reaper; `None` disables it.
    pub reaper_interval_secs: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            ttl_days: DEFAULT_SESSION_TTL_DAYS,
            cookie_secure: false,
            trust_identity_headers: false,
            reaper_interval_secs: None,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Connection string for the auth store.
    pub database_url: String,
    pub session: SessionConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(env_lookup)
    }

    /// Load configuration through `lookup`, with defaults.
    ///
    /// | Env Var                        | Default                    |
    /// |--------------------------------|----------------------------|
    /// | `HOST`                         | `0.0.0.0`                  |
    /// | `PORT`                         | `3000`                     |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                       |
    /// | `AUTH_DATABASE_URL`            | falls back to `DATABASE_URL`, required |
    /// | `SESSION_COOKIE_NAME`          | `diagram-studio-session`   |
    /// | `SESSION_TTL_DAYS`             | `7` (1 to 3650)            |
    /// | `SESSION_COOKIE_SECURE`        | `false`                    |
    /// | `TRUST_IDENTITY_HEADERS`       | `false`                    |
    /// | `SESSION_REAPER_INTERVAL_SECS` | unset (reaper disabled)    |
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&get, "PORT", 3000)?;

        let cors_origins: Vec<String> = get("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_or(&get, "REQUEST_TIMEOUT_SECS", 30)?;

        let database_url = resolve_database_url(&lookup)?;

        let ttl_days: i64 = parse_or(&get, "SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS)?;
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&ttl_days) {
            return Err(CoreError::Configuration(format!(
                "SESSION_TTL_DAYS must be between 1 and {MAX_SESSION_TTL_DAYS}, got {ttl_days}"
            )));
        }

        let reaper_interval_secs = match get("SESSION_REAPER_INTERVAL_SECS") {
            Some(_) => Some(parse_or(&get, "SESSION_REAPER_INTERVAL_SECS", 0u64)?)
                .filter(|secs| *secs > 0),
            None => None,
        };

        let session = SessionConfig {
            cookie_name: get("SESSION_COOKIE_NAME").unwrap_or_else(|| DEFAULT_COOKIE_NAME.into()),
            ttl_days,
            cookie_secure: parse_flag(&get, "SESSION_COOKIE_SECURE")?,
            trust_identity_headers: parse_flag(&get, "TRUST_IDENTITY_HEADERS")?,
            reaper_interval_secs,
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            session,
        })
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError> {
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Configuration(format!("{key} has an invalid value: {raw:?}"))),
        None => Ok(default),
    }
}

fn parse_flag(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool, CoreError> {
    match get(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("false") | Some("0") | Some("no") => Ok(false),
        Some("true") | Some("1") | Some("yes") => Ok(true),
        Some(other) => Err(CoreError::Configuration(format!(
            "{key} must be true or false, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, CoreError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(move |key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://db/auth")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.database_url, "postgres://db/auth");
        assert_eq!(config.session.cookie_name, "diagram-studio-session");
        assert_eq!(config.session.ttl_days, 7);
        assert!(!config.session.trust_identity_headers);
        assert!(config.session.reaper_interval_secs.is_none());
    }

    #[test]
    fn test_missing_database_url_is_fatal() {
        assert!(matches!(config_from(&[]), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("AUTH_DATABASE_URL", "postgres://db/auth"),
            ("PORT", "8080"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("TRUST_IDENTITY_HEADERS", "true"),
            ("SESSION_COOKIE_SECURE", "1"),
            ("SESSION_REAPER_INTERVAL_SECS", "600"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins.len(), 2);
        assert!(config.session.trust_identity_headers);
        assert!(config.session.cookie_secure);
        assert_eq!(config.session.reaper_interval_secs, Some(600));
    }

    #[test]
    fn test_zero_reaper_interval_disables_reaper() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://db/auth"),
            ("SESSION_REAPER_INTERVAL_SECS", "0"),
        ])
        .unwrap();
        assert!(config.session.reaper_interval_secs.is_none());
    }

    #[test]
    fn test_session_ttl_bounds() {
        let ttl = |value: &str| {
            config_from(&[("DATABASE_URL", "postgres://db/auth"), ("SESSION_TTL_DAYS", value)])
                .map(|c| c.session.ttl_days)
        };
        assert_eq!(ttl("1").unwrap(), 1);
        assert_eq!(ttl("3650").unwrap(), MAX_SESSION_TTL_DAYS);
        assert!(matches!(ttl("3651"), Err(CoreError::Configuration(_))));
        assert!(matches!(ttl("100000000"), Err(CoreError::Configuration(_))));
        assert!(matches!(ttl("-7"), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("DATABASE_URL", "x"), ("PORT", "http")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "x"), ("TRUST_IDENTITY_HEADERS", "maybe")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "x"), ("SESSION_TTL_DAYS", "0")]).is_err());
    }
}
