use crate::core::currency::Currency;
use crate::core::provider::CountryFilter;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use tracing::debug;

pub const ENV_REMOTE_URL: &str = "XOFCOMPARE_SUPABASE_URL";
pub const ENV_REMOTE_ANON_KEY: &str = "XOFCOMPARE_SUPABASE_ANON_KEY";

fn default_table() -> String {
    "exchange_rates".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_currency() -> Currency {
    Currency::Eur
}

/// Remote table holding rate overrides. Empty `url` or `anon_key` disables it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RemoteConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: String::new(),
            anon_key: String::new(),
            table: default_table(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Currency used when a command does not name one.
    #[serde(default = "default_currency")]
    pub currency: Currency,
    #[serde(default)]
    pub country: CountryFilter,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            remote: RemoteConfig::default(),
            currency: default_currency(),
            country: CountryFilter::All,
        }
    }
}

impl AppConfig {
    /// Loads the default config file, or built-in settings when there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            debug!("No config at {}, using defaults", config_path.display());
            Self::default()
        };
        Ok(config.with_env_overrides(|key| env::var(key).ok()))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "xofcompare", "xofcompare")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Applies remote settings from the environment over the file values.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_REMOTE_URL).filter(|v| !v.is_empty()) {
            self.remote.url = url;
        }
        if let Some(key) = lookup(ENV_REMOTE_ANON_KEY).filter(|v| !v.is_empty()) {
            self.remote.anon_key = key;
        }
        self
    }
}
