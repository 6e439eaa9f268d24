use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::reminder::clock::TimeBasis;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct EmberConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub reminder: ReminderConfig,
    pub companion: CompanionConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReminderConfig {
    /// Endpoint returning a JSON array of medications.
    pub medications_url: String,
    /// Wall-clock basis for "now" and for the start-of-day dedup key.
    pub time_basis: TimeBasis,
    /// How many past alerts the dashboard shows.
    pub history_limit: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CompanionConfig {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub reverse_geocode_url: String,
    pub ip_lookup_url: String,
    pub ip_context_url: String,
    pub user_agent: String,
    pub fallback_location: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_ember_dir()
            .join("ember.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            medications_url: "http://127.0.0.1:3000/api/medications".into(),
            time_basis: TimeBasis::Local,
            history_limit: 5,
            request_timeout_secs: 30,
        }
    }
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.0-flash".into(),
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            reverse_geocode_url: "https://nominatim.openstreetmap.org/reverse".into(),
            ip_lookup_url: "https://ipapi.co/json/".into(),
            ip_context_url: "https://ipinfo.io/json".into(),
            user_agent: concat!("ember/", env!("CARGO_PKG_VERSION")).into(),
            fallback_location: "your cozy place".into(),
            request_timeout_secs: 60,
        }
    }
}

/// Returns `~/.ember/`
pub fn default_ember_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".ember")
}

/// Returns the default config file path: `~/.ember/config.toml`
pub fn default_config_path() -> PathBuf {
    default_ember_dir().join("config.toml")
}

impl EmberConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            EmberConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (EMBER_DB, EMBER_LOG_LEVEL, EMBER_MEDICATIONS_URL, GEMINI_API_KEY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("EMBER_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("EMBER_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("EMBER_MEDICATIONS_URL") {
            self.reminder.medications_url = val;
        }
        if let Ok(val) = std::env::var("GEMINI_API_KEY") {
            self.companion.api_key = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Address `ember serve` binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
