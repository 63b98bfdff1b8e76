use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use crate::types::{Config, HistoryOrdering};

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_API_KEY_HEADER: &str = "X-API-KEY";

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let api_base_url = env.get_var("VOICE_API_BASE_URL")
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let api_key = env.get_var("VOICE_API_KEY")
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("VOICE_API_KEY env var must be set"))?;

    let api_key_header = env.get_var("VOICE_API_KEY_HEADER")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string());

    let patient_id = env.get_var("PATIENT_ID")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let request_timeout_secs: u64 = env.get_var("REQUEST_TIMEOUT_SECS")
        .unwrap_or_else(|| "30".to_string())
        .parse()
        .unwrap_or(30);

    let max_upload_mb: u64 = env.get_var("MAX_UPLOAD_MB")
        .unwrap_or_else(|| "25".to_string())
        .trim()
        .parse()
        .context("Invalid MAX_UPLOAD_MB")?;
    let max_upload_bytes = max_upload_mb
        .checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow!("MAX_UPLOAD_MB is too large"))?;

    let history_ordering = env.get_var("SORT_HISTORY")
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
        .map(|sort| if sort { HistoryOrdering::ByTimestamp } else { HistoryOrdering::AsReceived })
        .unwrap_or_default();

    Ok(Config {
        api_base_url,
        api_key,
        api_key_header,
        patient_id,
        request_timeout_secs,
        max_upload_bytes,
        history_ordering,
    })
}
