use std::path::PathBuf;

use crate::app_config::{AppConfig, ClassifierBackend};
use crate::ConfigError;

pub(crate) const DEFAULT_MODEL_ID: &str = "cardiffnlp/twitter-roberta-base-sentiment-latest";

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

/// Load application configuration with explicit values taking precedence over
/// the environment.
///
/// `overrides` pairs an env-var name with the value to use in its place. This
/// is how command-line flags reach the config layer. `.env` files are loaded
/// first, as in [`load_app_config`].
///
/// # Errors
///
/// Returns `ConfigError` if required values are missing or any value
/// (overridden or not) is invalid.
pub fn load_app_config_with_overrides(
    overrides: &[(&str, String)],
) -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(overlay(overrides, |key| std::env::var(key)))
}

/// Lookup that answers from `overrides` first and falls back to `lookup`.
/// A later override for the same key wins.
fn overlay<'a, F>(
    overrides: &'a [(&'a str, String)],
    lookup: F,
) -> impl Fn(&str) -> Result<String, std::env::VarError> + 'a
where
    F: Fn(&str) -> Result<String, std::env::VarError> + 'a,
{
    move |key| {
        overrides
            .iter()
            .rev()
            .find(|(name, _)| *name == key)
            .map_or_else(|| lookup(key), |(_, value)| Ok(value.clone()))
    }
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let log_level = or_default("REVSENT_LOG_LEVEL", "info");

    let classifier = or_default("REVSENT_CLASSIFIER", "tei")
        .parse::<ClassifierBackend>()
        .map_err(|reason| invalid("REVSENT_CLASSIFIER", reason))?;

    let tei_url = lookup("REVSENT_TEI_URL")
        .ok()
        .map(|url| url.trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty());
    if classifier == ClassifierBackend::Tei && tei_url.is_none() {
        return Err(ConfigError::MissingEnvVar("REVSENT_TEI_URL".to_string()));
    }

    let model_id = or_default("REVSENT_MODEL_ID", DEFAULT_MODEL_ID);
    let batch_size = parse_positive("REVSENT_BATCH_SIZE", "8")?;
    let max_input_tokens = parse_positive("REVSENT_MAX_INPUT_TOKENS", "512")?;

    let play_base_url = or_default("REVSENT_PLAY_BASE_URL", "https://play.google.com")
        .trim_end_matches('/')
        .to_string();
    let fetch_lang = or_default("REVSENT_FETCH_LANG", "en");
    let fetch_country = or_default("REVSENT_FETCH_COUNTRY", "us");

    let request_timeout_secs = parse_u64("REVSENT_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("REVSENT_USER_AGENT", "revsent/0.1 (review-sentiment)");
    let max_retries = parse_u32("REVSENT_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("REVSENT_RETRY_BACKOFF_BASE_MS", "1000")?;
    let inter_request_delay_ms = parse_u64("REVSENT_INTER_REQUEST_DELAY_MS", "250")?;

    let export_path = PathBuf::from(or_default(
        "REVSENT_EXPORT_PATH",
        "app_reviews_with_sentiment.csv",
    ));

    Ok(AppConfig {
        log_level,
        classifier,
        tei_url,
        model_id,
        batch_size,
        max_input_tokens,
        play_base_url,
        fetch_lang,
        fetch_country,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        inter_request_delay_ms,
        export_path,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
