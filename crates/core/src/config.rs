//! Connection-string resolution for the auth store.
//!
//! Resolution functions take a `lookup` closure instead of reading the process
//! environment directly, so precedence rules can be tested in isolation.
//! Callers in binaries pass [`env_lookup`]. Empty values are treated as unset.

use crate::error::CoreError;

/// Preferred connection string for the session store.
pub const AUTH_DATABASE_URL: &str = "AUTH_DATABASE_URL";
/// Shared fallback connection string.
pub const DATABASE_URL: &str = "DATABASE_URL";

pub const DB_USER: &str = "DB_USER";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const DB_HOST: &str = "DB_HOST";
pub const DB_PORT: &str = "DB_PORT";
pub const DB_NAME: &str = "DB_NAME";

const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_DB_PASSWORD: &str = "";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_NAME: &str = "diagram_studio";

/// Read a variable from the process environment.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Look up `key`, treating an empty or whitespace-only value as unset.
fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the connection string used by the session store.
///
/// | Precedence | Env Var             |
/// |------------|---------------------|
/// | 1          | `AUTH_DATABASE_URL` |
/// | 2          | `DATABASE_URL`      |
///
/// Returns [`CoreError::Configuration`] when neither is set.
pub fn resolve_database_url(lookup: impl Fn(&str) -> Option<String>) -> Result<String, CoreError> {
    non_empty(&lookup, AUTH_DATABASE_URL)
        .or_else(|| non_empty(&lookup, DATABASE_URL))
        .ok_or_else(|| {
            CoreError::Configuration(format!(
                "no database connection string: set {AUTH_DATABASE_URL} or {DATABASE_URL}"
            ))
        })
}

/// Resolve the connection string used by the schema migration tool.
///
/// Same precedence as [`resolve_database_url`], then falls back to assembling
/// a URL from the discrete `DB_*` variables. The assembly is only used when at
/// least one of them is set; missing parts take these defaults:
///
/// | Env Var       | Default          |
/// |---------------|------------------|
/// | `DB_USER`     | `postgres`       |
/// | `DB_PASSWORD` | (empty)          |
/// | `DB_HOST`     | `localhost`      |
/// | `DB_PORT`     | `5432`           |
/// | `DB_NAME`     | `diagram_studio` |
pub fn resolve_migration_database_url(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, CoreError> {
    if let Ok(url) = resolve_database_url(&lookup) {
        return Ok(url);
    }

    let any_set = [DB_USER, DB_PASSWORD, DB_HOST, DB_PORT, DB_NAME]
        .iter()
        .any(|key| non_empty(&lookup, key).is_some());
    if !any_set {
        return Err(CoreError::Configuration(format!(
            "no database connection string: set {AUTH_DATABASE_URL}, {DATABASE_URL} \
             or the {DB_HOST}/{DB_NAME} family"
        )));
    }

    let user = non_empty(&lookup, DB_USER).unwrap_or_else(|| DEFAULT_DB_USER.into());
    let password = non_empty(&lookup, DB_PASSWORD).unwrap_or_else(|| DEFAULT_DB_PASSWORD.into());
    let host = non_empty(&lookup, DB_HOST).unwrap_or_else(|| DEFAULT_DB_HOST.into());
    let name = non_empty(&lookup, DB_NAME).unwrap_or_else(|| DEFAULT_DB_NAME.into());
    let port = match non_empty(&lookup, DB_PORT) {
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|_| CoreError::Configuration(format!("{DB_PORT} must be a valid port, got {raw:?}")))?,
        None => DEFAULT_DB_PORT,
    };

    let credentials = if password.is_empty() {
        user
    } else {
        format!("{user}:{password}")
    };
    Ok(format!("postgres://{credentials}@{host}:{port}/{name}"))
}
