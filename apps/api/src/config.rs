use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required environment variable '{0}' is not set")]
    Missing(&'static str),

    #[error("Invalid value '{value}' for '{key}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
/// Built once at startup and shared read-only with every component.
#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model_name: String,
    pub gemini_api_base: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub log_level: String,
    pub host: String,
    pub port: u16,
    /// Upper bound on user turns kept in a session's memory.
    pub max_stored_exchanges: usize,
    /// Number of non-system turns submitted to the model per call.
    pub context_messages: usize,
    /// Estimated token budget for the submitted history (excluding the system prompt).
    pub context_token_budget: usize,
    pub request_timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &"[REDACTED]")
            .field("gemini_model_name", &self.gemini_model_name)
            .field("gemini_api_base", &self.gemini_api_base)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("log_level", &self.log_level)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("max_stored_exchanges", &self.max_stored_exchanges)
            .field("context_messages", &self.context_messages)
            .field("context_token_budget", &self.context_token_budget)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini_api_key = get("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;

        let temperature: f32 = parse_or(&get, "TEMPERATURE", 0.3)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                key: "TEMPERATURE",
                value: temperature.to_string(),
                reason: "must be between 0.0 and 2.0".to_string(),
            });
        }

        let max_output_tokens: u32 = parse_or(&get, "MAX_OUTPUT_TOKENS", 512)?;
        if max_output_tokens == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_OUTPUT_TOKENS",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Config {
            gemini_api_key,
            gemini_model_name: get("GEMINI_MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_api_base: get("GEMINI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            temperature,
            max_output_tokens,
            log_level: get("LOG_LEVEL")
                .map(|level| level.to_lowercase())
                .unwrap_or_else(|| "info".to_string()),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or::<u16, _>(&get, "PORT", 8501)?,
            max_stored_exchanges: parse_or::<usize, _>(&get, "MAX_STORED_EXCHANGES", 100)?.max(1),
            context_messages: parse_or::<usize, _>(&get, "CONTEXT_MESSAGES", 8)?.max(1),
            context_token_budget: parse_or::<usize, _>(&get, "CONTEXT_TOKEN_BUDGET", 30_000)?,
            request_timeout_secs: parse_or::<u64, _>(&get, "REQUEST_TIMEOUT_SECS", 120)?,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
