//! Configuration for gembot.
//!
//! All parameters are read once from the environment at startup; the core
//! never touches the filesystem. `GOOGLE_API_KEY` is mandatory — without it
//! the process refuses to start. Temperature and the output-token cap can
//! be overridden via `GEMBOT_TEMPERATURE` / `GEMBOT_MAX_OUTPUT_TOKENS`.

use std::str::FromStr;

/// Environment variable holding the Gemini API key.
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
/// Optional override for the sampling temperature.
pub const TEMPERATURE_VAR: &str = "GEMBOT_TEMPERATURE";
/// Optional override for the output-token cap.
pub const MAX_OUTPUT_TOKENS_VAR: &str = "GEMBOT_MAX_OUTPUT_TOKENS";

/// The fast model variant.
pub const FLASH_MODEL: &str = "gemini-2.5-flash";
/// The capable model variant.
pub const PRO_MODEL: &str = "gemini-2.5-pro";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 256;

/// Parameters binding one model identifier to its sampling settings.
/// Read-only after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub id: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Process-wide configuration: the API key plus the two model variants.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub flash: ModelConfig,
    pub pro: ModelConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GOOGLE_API_KEY is not set; export it before starting gembot")]
    MissingApiKey,
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests supply a closure instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let temperature =
            parse_or(&lookup, TEMPERATURE_VAR, DEFAULT_TEMPERATURE)?;
        let max_output_tokens =
            parse_or(&lookup, MAX_OUTPUT_TOKENS_VAR, DEFAULT_MAX_OUTPUT_TOKENS)?;

        Ok(Self {
            api_key,
            flash: ModelConfig {
                id: FLASH_MODEL.into(),
                temperature,
                max_output_tokens,
            },
            pro: ModelConfig {
                id: PRO_MODEL.into(),
                temperature,
                max_output_tokens,
            },
        })
    }

    /// The API key with everything past the first four characters masked,
    /// for status output.
    pub fn masked_key(&self) -> String {
        let visible: String = self.api_key.chars().take(4).collect();
        format!("{visible}…")
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
        None => Ok(default),
    }
}
