use std::time::Duration;

use clap::Args;

use crate::error::ApiError;

pub const DEFAULT_BROKERAGE_URL: &str = "https://live.trading212.com/api/v0";
pub const DEFAULT_CRYPTO_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1";

/// Upstream endpoints and credentials. Every field can come from the environment (or `.env`).
#[derive(Args, Debug, Clone)]
pub struct Config {
    #[arg(long, env = "T212_BASE_URL", default_value = DEFAULT_BROKERAGE_URL)]
    pub brokerage_url: String,
    #[arg(long, env = "T212_API_KEY", hide_env_values = true)]
    pub brokerage_api_key: Option<String>,

    #[arg(long, env = "COINGECKO_BASE_URL", default_value = DEFAULT_CRYPTO_URL)]
    pub crypto_url: String,
    #[arg(long, env = "COINGECKO_API_KEY", hide_env_values = true)]
    pub crypto_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_CHAT_URL)]
    pub chat_url: String,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub chat_api_key: Option<String>,
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    pub chat_model: String,
    #[arg(long, env = "OPENAI_SYSTEM_PROMPT")]
    pub chat_system_prompt: Option<String>,

    /// Freshness window of the instrument metadata cache
    #[arg(long, env = "INSTRUMENT_CACHE_TTL_SECS", default_value = "21600")]
    pub instrument_ttl_secs: u64,
}

impl Config {
    pub fn instrument_ttl(&self) -> Duration {
        Duration::from_secs(self.instrument_ttl_secs)
    }

    /// Static brokerage credential forwarded on every brokerage call.
    pub fn brokerage_credential(&self) -> Result<&str, ApiError> {
        non_empty(self.brokerage_api_key.as_deref())
            .ok_or(ApiError::ConfigurationMissing("T212_API_KEY"))
    }

    pub fn chat_credential(&self) -> Result<&str, ApiError> {
        non_empty(self.chat_api_key.as_deref())
            .ok_or(ApiError::ConfigurationMissing("OPENAI_API_KEY"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            brokerage_url: DEFAULT_BROKERAGE_URL.to_string(),
            brokerage_api_key: None,
            crypto_url: DEFAULT_CRYPTO_URL.to_string(),
            crypto_api_key: None,
            chat_url: DEFAULT_CHAT_URL.to_string(),
            chat_api_key: None,
            chat_model: String::from("gpt-4o-mini"),
            chat_system_prompt: None,
            instrument_ttl_secs: 6 * 60 * 60,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
