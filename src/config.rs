//! Process configuration gathered once at startup.
//!
//! Every external credential is optional: a missing key switches the owning
//! service onto its documented local/mock fallback instead of failing boot.

use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 9000;

/// Public sample key published by data.gov.in for the Agmarknet resource.
const DEFAULT_AGMARKNET_KEY: &str = "579b464db66ec23bdd000001cdd3946e44ce4aad7209ff7b23ac571b";

const DEFAULT_LLM_MODEL: &str = "meta-llama/llama-3.3-8b-instruct:free";

/// Startup configuration, passed explicitly to each service constructor so
/// adapters stay testable with injected settings.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Directory holding the per-domain JSON documents.
    pub data_dir: PathBuf,
    /// OpenWeatherMap key (`OPENWEATHER_KEY`). Absent => local cache only.
    pub openweather_key: Option<String>,
    /// data.gov.in key for the Agmarknet market-price resource.
    pub agmarknet_key: String,
    /// OpenRouter key (`OPENROUTER_API_KEY`). Absent => keyword mock answers.
    pub openrouter_key: Option<String>,
    /// Chat model id sent to OpenRouter.
    pub llm_model: String,
    /// State used for price lookups when the caller does not name one.
    pub default_state: String,
    /// City assumed when entity extraction finds none in a question.
    pub default_city: String,
    /// Crop assumed when entity extraction finds none in a question.
    pub default_crop: String,
    pub port: u16,
}

impl AppConfig {
    /// Load settings from the environment. Unset or blank values fall back
    /// to the defaults documented on each field.
    pub fn from_env() -> Self {
        Self {
            data_dir: PathBuf::from(env_or("KISAN_DATA_DIR", "data")),
            openweather_key: env_opt("OPENWEATHER_KEY"),
            agmarknet_key: env_or("DATA_GOV_API_KEY", DEFAULT_AGMARKNET_KEY),
            openrouter_key: env_opt("OPENROUTER_API_KEY"),
            llm_model: env_or("KISAN_LLM_MODEL", DEFAULT_LLM_MODEL),
            default_state: env_or("KISAN_DEFAULT_STATE", "Maharashtra"),
            default_city: env_or("KISAN_DEFAULT_CITY", "Pune"),
            default_crop: env_or("KISAN_DEFAULT_CROP", "Tomato"),
            port: env::var("KISAN_PORT")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_env_value_falls_back_to_default() {
        env::set_var("KISAN_TEST_BLANK", "   ");
        assert_eq!(env_opt("KISAN_TEST_BLANK"), None);
        assert_eq!(env_or("KISAN_TEST_BLANK", "fallback"), "fallback");
        env::remove_var("KISAN_TEST_BLANK");
    }
}
