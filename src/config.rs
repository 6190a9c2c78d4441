use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::time::Duration;

pub const NOTION_TOKEN_KEY: &str = "NOTION_TOKEN";
pub const DATA_SOURCE_ID_KEY: &str = "DATABSOURCE_ID";
pub const DATA_SOURCE_ID_ALIAS_KEY: &str = "NOTION_DATA_SOURCE_ID";
const NOTION_API_URL_KEY: &str = "NOTION_API_URL";
const YAHOO_API_URL_KEY: &str = "YAHOO_API_URL";
const HTTP_TIMEOUT_SECS_KEY: &str = "HTTP_TIMEOUT_SECS";

pub const DEFAULT_NOTION_API_URL: &str = "https://api.notion.com";
pub const DEFAULT_YAHOO_API_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Settings needed to talk to both services.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub notion_token: String,
    pub data_source_id: String,
    pub notion_api_url: String,
    pub yahoo_api_url: String,
    pub http_timeout: Option<Duration>,
}

impl SyncConfig {
    /// Reads `.env` (if any) and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let settings: HashMap<String, String> = std::env::vars().collect();
        Self::from_settings_map(&settings)
    }

    pub fn from_settings_map(settings: &HashMap<String, String>) -> Result<Self> {
        let notion_token = require_setting(settings, NOTION_TOKEN_KEY)?.to_string();
        let data_source_id = optional_setting(settings, DATA_SOURCE_ID_KEY)
            .or_else(|| optional_setting(settings, DATA_SOURCE_ID_ALIAS_KEY))
            .ok_or_else(|| {
                anyhow!(
                    "Missing required setting {} (or {})",
                    DATA_SOURCE_ID_KEY,
                    DATA_SOURCE_ID_ALIAS_KEY
                )
            })?
            .to_string();
        let notion_api_url = base_url_setting(settings, NOTION_API_URL_KEY, DEFAULT_NOTION_API_URL);
        let yahoo_api_url = base_url_setting(settings, YAHOO_API_URL_KEY, DEFAULT_YAHOO_API_URL);
        let http_timeout = optional_setting_secs(settings, HTTP_TIMEOUT_SECS_KEY)?;

        Ok(Self {
            notion_token,
            data_source_id,
            notion_api_url,
            yahoo_api_url,
            http_timeout,
        })
    }

    pub fn with_data_source_id(mut self, data_source_id: Option<String>) -> Self {
        if let Some(id) = data_source_id
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        {
            self.data_source_id = id;
        }
        self
    }
}

fn require_setting<'a>(settings: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    optional_setting(settings, key).ok_or_else(|| anyhow!("Missing required setting {}", key))
}

fn optional_setting<'a>(settings: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn base_url_setting(settings: &HashMap<String, String>, key: &str, default: &str) -> String {
    optional_setting(settings, key)
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

fn optional_setting_secs(
    settings: &HashMap<String, String>,
    key: &str,
) -> Result<Option<Duration>> {
    let Some(raw) = optional_setting(settings, key) else {
        return Ok(None);
    };
    let value = raw
        .parse::<f64>()
        .map_err(|_| anyhow!("Setting {} must be a number (value: {})", key, raw))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(anyhow!(
            "Setting {} must be a positive number of seconds (value: {})",
            key,
            raw
        ));
    }
    Ok(Some(Duration::from_secs_f64(value)))
}
