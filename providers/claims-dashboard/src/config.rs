use advisor_provider::AdvisorConfig;
use claims_analytics::{LoadLimits, ThresholdRange};
use config::{Config, ConfigError, Environment, File};
use email_notification_provider::EmailConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;

pub const CONFIG_PATH_ENV: &str = "CLAIMS_DASHBOARD_CONFIG_PATH";
pub const ENV_PREFIX: &str = "CLAIMS";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
pub const DEFAULT_MAX_ROWS: usize = 100_000;
pub const DEFAULT_MAX_QUESTION_CHARS: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Dashboard login. Both values are deployment secrets with no default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub session_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub threshold: ThresholdRange,
    pub max_upload_bytes: usize,
    pub max_rows: usize,
    pub max_question_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdRange::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_rows: DEFAULT_MAX_ROWS,
            max_question_chars: DEFAULT_MAX_QUESTION_CHARS,
        }
    }
}

impl AnalysisConfig {
    pub fn load_limits(&self) -> LoadLimits {
        LoadLimits {
            max_file_bytes: self.max_upload_bytes,
            max_rows: self.max_rows,
            ..LoadLimits::default()
        }
    }
}

/// Optional JSON files replacing the built-in policy registry and event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub policies_path: Option<String>,
    pub event_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub analysis: AnalysisConfig,
    pub registry: RegistryConfig,
    pub advisor: AdvisorConfig,
    pub email: EmailConfig,
}

impl DashboardConfig {
    /// Defaults, then the optional file named by `CLAIMS_DASHBOARD_CONFIG_PATH`,
    /// then `CLAIMS_<SECTION>__<KEY>` variables, then the secret variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", DEFAULT_PORT as i64)?
            .set_default("auth.session_ttl_minutes", DEFAULT_SESSION_TTL_MINUTES)?
            .set_default("analysis.max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES as i64)?
            .set_default("analysis.max_rows", DEFAULT_MAX_ROWS as i64)?;

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Secrets come from dedicated variables
        for (var, key) in [
            ("ADVISOR_API_KEY", "advisor.api_key"),
            ("RESEND_API_KEY", "email.resend_api_key"),
            ("DASHBOARD_USERNAME", "auth.username"),
            ("DASHBOARD_PASSWORD", "auth.password"),
        ] {
            if let Ok(value) = env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Build from a flat `section.key` properties map, e.g. for tests or embedding.
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        for (key, value) in props {
            builder = builder.set_override(key.as_str(), value.as_str())?;
        }
        builder.build()?.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid listen address {}:{}: {}", self.server.host, self.server.port, e))
    }

    pub fn advisor_enabled(&self) -> bool {
        !self.advisor.api_key.is_empty()
    }

    pub fn email_enabled(&self) -> bool {
        !self.email.resend_api_key.is_empty()
    }

    pub fn validate(&self) -> Result<(), String> {
        self.socket_addr()?;

        if self.auth.username.trim().is_empty() || self.auth.password.is_empty() {
            return Err("DASHBOARD_USERNAME and DASHBOARD_PASSWORD are required".to_string());
        }

        if self.auth.session_ttl_minutes <= 0 {
            return Err("Session TTL must be greater than 0".to_string());
        }

        if !self.analysis.threshold.is_consistent() {
            return Err(format!(
                "Invalid threshold range: min {}, max {}, default {}",
                self.analysis.threshold.min,
                self.analysis.threshold.max,
                self.analysis.threshold.default
            ));
        }

        if self.analysis.max_upload_bytes == 0 || self.analysis.max_rows == 0 {
            return Err("Upload limits must be greater than 0".to_string());
        }

        if self.advisor_enabled() {
            self.advisor.validate()?;
        }

        if self.email_enabled() {
            self.email.validate()?;
        }

        Ok(())
    }
}
