use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_timeout() -> u64 {
    60
}

fn default_long_timeout() -> u64 {
    300
}

fn default_keyspace() -> String {
    "default_keyspace".to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_timeout")]
    pub timeout: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_base_url(),
            timeout: default_openai_timeout(),
        }
    }
}

impl OpenAiConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Copy of this profile using `key` instead of the configured one.
    /// Blank overrides are ignored.
    pub fn with_key_override(&self, key: Option<&str>) -> Self {
        let mut profile = self.clone();
        if let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) {
            profile.api_key = key.to_string();
        }
        profile
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OllamaConfig {
    #[serde(default = "default_long_timeout")]
    pub timeout: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            timeout: default_long_timeout(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AstraConfig {
    #[serde(default = "default_keyspace")]
    pub default_keyspace: String,
    #[serde(default = "default_openai_timeout")]
    pub timeout: u64,
}

impl Default for AstraConfig {
    fn default() -> Self {
        Self {
            default_keyspace: default_keyspace(),
            timeout: default_openai_timeout(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WebhookConfig {
    #[serde(default = "default_long_timeout")]
    pub timeout: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout: default_long_timeout(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub astra: AstraConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Environment values win over file values; blank variables are skipped.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_blank(OPENAI_API_KEY_ENV) {
            self.openai.api_key = key;
        }
        if let Some(url) = non_blank(OPENAI_BASE_URL_ENV) {
            self.openai.base_url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn empty_input_yields_defaults() {
        let config = Config::from_json_str("  ").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.webhook.timeout, 300);
        assert_eq!(config.astra.default_keyspace, "default_keyspace");
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_sections() {
        let json = r#"{
            "openai": { "api_key": "sk-file" },
            "ollama": { "timeout": 30 }
        }"#;

        let config = Config::from_json_str(json).unwrap();
        assert_eq!(config.openai.api_key, "sk-file");
        assert_eq!(config.openai.timeout, 60);
        assert_eq!(config.ollama.timeout, 30);
        assert_eq!(config.astra, AstraConfig::default());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::from_json_str(r#"{"openai": {"api_key": "sk-file"}}"#).unwrap();
        let env: HashMap<&str, &str> = [
            (OPENAI_API_KEY_ENV, "sk-env"),
            (OPENAI_BASE_URL_ENV, "http://localhost:8080/v1"),
        ]
        .into_iter()
        .collect();

        config.apply_env(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.openai.api_key, "sk-env");
        assert_eq!(config.openai.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = Config::from_json_str(r#"{"openai": {"api_key": "sk-file"}}"#).unwrap();
        config.apply_env(|_| Some("   ".to_string()));
        assert_eq!(config.openai.api_key, "sk-file");
        assert!(config.openai.has_api_key());
    }

    #[test]
    fn key_override_leaves_profile_unchanged() {
        let config = OpenAiConfig::default();
        let overridden = config.with_key_override(Some("  sk-override "));
        assert_eq!(overridden.api_key, "sk-override");
        assert!(!config.has_api_key());

        let untouched = config.with_key_override(Some(""));
        assert!(!untouched.has_api_key());
    }

    #[test]
    fn config_round_trips_through_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("fsnodes.json");

        let mut config = Config::new();
        config.openai.api_key = "sk-saved".into();
        config.webhook.timeout = 10;
        config.to_path(&path).unwrap();

        let loaded = Config::from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
