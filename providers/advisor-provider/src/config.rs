use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_PROMPT_CLAIMS: usize = 500;
pub const DEFAULT_SYSTEM_ROLE: &str = "Είσαι ένας ειδικός σύμβουλος ασφαλιστικών εταιρειών.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// System-role instruction sent ahead of every question
    pub system_role: String,
    /// Claims listed verbatim in the prompt; the rest are summarised by count
    pub max_prompt_claims: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            system_role: DEFAULT_SYSTEM_ROLE.to_string(),
            max_prompt_claims: DEFAULT_MAX_PROMPT_CLAIMS,
        }
    }
}

impl AdvisorConfig {
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_key = props
            .get("api_key")
            .or_else(|| props.get("ADVISOR_API_KEY"))
            .cloned()
            .ok_or_else(|| ConfigError::Message("api_key is required".to_string()))?;

        let defaults = Self::default();
        Ok(Self {
            api_key,
            base_url: props.get("base_url").cloned().unwrap_or(defaults.base_url),
            model: props.get("model").cloned().unwrap_or(defaults.model),
            timeout_secs: parse_property(props, "timeout_secs", defaults.timeout_secs)?,
            system_role: props
                .get("system_role")
                .cloned()
                .unwrap_or(defaults.system_role),
            max_prompt_claims: parse_property(props, "max_prompt_claims", defaults.max_prompt_claims)?,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err("Advisor API key is required".to_string());
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!("Invalid advisor base URL: {}", self.base_url));
        }
        if self.model.trim().is_empty() {
            return Err("Advisor model is required".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("Advisor timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_property<T: FromStr>(
    props: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match props.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Message(format!("{key} must be an integer, got '{raw}'"))),
        None => Ok(default),
    }
}
