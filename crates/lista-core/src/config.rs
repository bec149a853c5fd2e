use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let feed_base_url = require("LISTA_FEED_BASE_URL")?;
    if !(feed_base_url.starts_with("http://") || feed_base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "LISTA_FEED_BASE_URL".to_string(),
            reason: format!("expected an http(s) URL, got \"{feed_base_url}\""),
        });
    }

    let env = parse_environment(&or_default("LISTA_ENV", "development"))?;
    let log_level = or_default("LISTA_LOG_LEVEL", "info");

    let locator_path = or_default(
        "LISTA_LOCATOR_PATH",
        "/price-lists-json/latest-json-filename.txt",
    );
    let snapshot_prefix = or_default("LISTA_SNAPSHOT_PREFIX", "/price-lists-json");
    let rate_url = or_default(
        "LISTA_RATE_URL",
        "https://dolarapi.com/v1/ambito/dolares/oficial",
    );
    let cache_path = PathBuf::from(or_default("LISTA_CACHE_PATH", "./.lista/snapshot.json"));

    let request_timeout_secs = parse_u64("LISTA_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("LISTA_USER_AGENT", "lista/0.1 (price-catalog)");
    let search_debounce_ms = parse_u64("LISTA_SEARCH_DEBOUNCE_MS", "400")?;

    Ok(AppConfig {
        env,
        log_level,
        feed_base_url,
        locator_path,
        snapshot_prefix,
        rate_url,
        cache_path,
        request_timeout_secs,
        user_agent,
        search_debounce_ms,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LISTA_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
