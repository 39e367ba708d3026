use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

pub const DEFAULT_DIRECTORY_URL: &str = "http://viacep.com.br/ws";
pub const DEFAULT_WEATHER_URL: &str = "http://api.weatherapi.com/v1/current.json";

pub const ENV_DIRECTORY_URL: &str = "CEP_WEATHER_DIRECTORY_URL";
pub const ENV_WEATHER_URL: &str = "CEP_WEATHER_WEATHER_URL";
pub const ENV_API_KEY: &str = "CEP_WEATHER_API_KEY";

/// Postal code directory settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_directory_url")]
    pub base_url: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self { base_url: default_directory_url() }
    }
}

/// Weather provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self { base_url: default_weather_url(), api_key: None }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [directory]
/// base_url = "http://viacep.com.br/ws"
///
/// [weather]
/// base_url = "http://api.weatherapi.com/v1/current.json"
/// api_key = "..."
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub directory: DirectoryConfig,

    #[serde(default)]
    pub weather: WeatherConfig,
}

fn default_directory_url() -> String {
    DEFAULT_DIRECTORY_URL.to_string()
}

fn default_weather_url() -> String {
    DEFAULT_WEATHER_URL.to_string()
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from disk, then apply process environment overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut cfg = Self::load()?;
        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cep-weather", "cep-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override settings from environment-style variables. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = var(ENV_DIRECTORY_URL) {
            self.directory.base_url = url;
        }
        if let Some(url) = var(ENV_WEATHER_URL) {
            self.weather.base_url = url;
        }
        if let Some(key) = var(ENV_API_KEY) {
            self.weather.api_key = Some(key);
        }
    }

    pub fn set_weather_api_key(&mut self, api_key: String) {
        self.weather.api_key = Some(api_key);
    }

    /// Returns the weather provider credential, or an error with a setup hint.
    pub fn weather_api_key(&self) -> Result<&str> {
        self.weather.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No weather API key configured.\n\
                 Hint: run `cep-weather configure` or set {ENV_API_KEY}."
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_point_at_public_services() {
        let cfg = Config::default();
        assert_eq!(cfg.directory.base_url, DEFAULT_DIRECTORY_URL);
        assert_eq!(cfg.weather.base_url, DEFAULT_WEATHER_URL);
        assert!(cfg.weather.api_key.is_none());
    }

    #[test]
    fn weather_api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.weather_api_key().unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No weather API key configured"));
        assert!(msg.contains("cep-weather configure"));
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_weather_api_key(String::new());
        assert!(cfg.weather_api_key().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = Config::from_toml(
            r#"
            [weather]
            api_key = "KEY"
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.directory.base_url, DEFAULT_DIRECTORY_URL);
        assert_eq!(cfg.weather.base_url, DEFAULT_WEATHER_URL);
        assert_eq!(cfg.weather_api_key().expect("key"), "KEY");
    }

    #[test]
    fn toml_roundtrip_preserves_settings() {
        let mut cfg = Config::default();
        cfg.directory.base_url = "http://localhost:8080/ws".into();
        cfg.set_weather_api_key("SECRET".into());

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        assert_eq!(Config::from_toml(&text).expect("parse"), cfg);
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = Config::default();
        cfg.set_weather_api_key("FROM_FILE".into());

        cfg.apply_env_overrides(env(&[
            (ENV_DIRECTORY_URL, "http://directory.test"),
            (ENV_API_KEY, "FROM_ENV"),
        ]));

        assert_eq!(cfg.directory.base_url, "http://directory.test");
        assert_eq!(cfg.weather.base_url, DEFAULT_WEATHER_URL);
        assert_eq!(cfg.weather_api_key().expect("key"), "FROM_ENV");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = Config::default();
        cfg.set_weather_api_key("FROM_FILE".into());

        cfg.apply_env_overrides(env(&[(ENV_API_KEY, "  "), (ENV_WEATHER_URL, "")]));

        assert_eq!(cfg.weather_api_key().expect("key"), "FROM_FILE");
        assert_eq!(cfg.weather.base_url, DEFAULT_WEATHER_URL);
    }
}
