use serde::{Deserialize, Serialize};

/// Environment variable providing the API base URL.
pub const BASE_URL_ENV: &str = "POSTQ_API_BASE_URL";
/// Environment variable providing the bearer credential.
pub const API_TOKEN_ENV: &str = "POSTQ_API_TOKEN";
/// Environment variable providing the timezone label.
pub const TIMEZONE_ENV: &str = "POSTQ_TIMEZONE";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Process-wide connection configuration. Exactly one value is active at a
/// time; changes apply to subsequent requests only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub api_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_true")]
    pub enable_live_logs: bool,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_true() -> bool {
    true
}

impl Settings {
    /// Builds the process defaults, sourcing the base URL, credential, and
    /// timezone from the environment when set.
    pub fn from_env() -> Self {
        Self {
            api_base_url: std::env::var(BASE_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            api_token: std::env::var(API_TOKEN_ENV).ok().filter(|t| !t.is_empty()),
            default_model: default_model(),
            default_temperature: default_temperature(),
            timezone: std::env::var(TIMEZONE_ENV).unwrap_or_else(|_| default_timezone()),
            enable_live_logs: true,
        }
    }

    /// Shallow-merges `patch` into a copy of these settings.
    pub fn merged(&self, patch: SettingsPatch) -> Self {
        Self {
            api_base_url: patch.api_base_url.unwrap_or_else(|| self.api_base_url.clone()),
            api_token: patch.api_token.or_else(|| self.api_token.clone()),
            default_model: patch
                .default_model
                .unwrap_or_else(|| self.default_model.clone()),
            default_temperature: patch
                .default_temperature
                .unwrap_or(self.default_temperature),
            timezone: patch.timezone.unwrap_or_else(|| self.timezone.clone()),
            enable_live_logs: patch.enable_live_logs.unwrap_or(self.enable_live_logs),
        }
    }
}

/// Partial settings update. Omitted fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub default_model: Option<String>,
    pub default_temperature: Option<f32>,
    pub timezone: Option<String>,
    pub enable_live_logs: Option<bool>,
}
