//! Host application configuration.
//!
//! The configuration file uses snake_case keys. When the configuration is
//! handed to scripts (see [`crate::snapshot`]) fields are serialized with the
//! script-facing names: `URL`, `Port`, `Mode`, `Datapack`, `PayPal`, `SSL`, ...

use crate::error::{RuntimeError, RuntimeResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main host configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all(serialize = "PascalCase"))]
pub struct AppConfig {
    /// Public URL of the site.
    #[serde(rename(serialize = "URL"))]
    pub url: String,
    /// HTTP port.
    pub port: u16,
    /// Run mode (dev, prod, test, ...).
    pub mode: String,
    /// Game server data directory.
    pub datapack: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Application secret used for signing.
    pub secret: String,
    /// Words rejected by `validator.blackList` and username checks.
    pub blacklist: Vec<String>,
    /// Vocation names allowed for new characters. Empty allows all.
    pub new_char_vocations: Vec<String>,
    /// Town names allowed for new characters. Empty allows all.
    pub new_char_towns: Vec<String>,
    #[serde(rename(serialize = "PayPal"))]
    pub paypal: PayPalConfig,
    pub captcha: CaptchaConfig,
    pub mail: MailConfig,
    #[serde(rename(serialize = "PayGol"))]
    pub paygol: PayGolConfig,
    #[serde(rename(serialize = "SSL"))]
    pub ssl: SslConfig,
    /// Free-form settings for scripts.
    pub custom: BTreeMap<String, toml::Value>,
    /// Interpreter pool policy. Not exposed to scripts.
    #[serde(skip_serializing)]
    pub pool: PoolConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all(serialize = "PascalCase"))]
pub struct PayPalConfig {
    pub enabled: bool,
    pub public_key: String,
    pub secret_key: String,
    /// `sandbox` or `live`.
    pub mode: String,
    pub currency: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all(serialize = "PascalCase"))]
pub struct CaptchaConfig {
    pub enabled: bool,
    pub public_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all(serialize = "PascalCase"))]
pub struct MailConfig {
    pub enabled: bool,
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all(serialize = "PascalCase"))]
pub struct PayGolConfig {
    pub enabled: bool,
    pub service: i64,
    pub currency: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all(serialize = "PascalCase"))]
pub struct SslConfig {
    pub enabled: bool,
    pub cert: String,
    pub key: String,
    pub port: u16,
}

/// Interpreter pool policy.
///
/// Both limits are off by default: the pool grows on demand and instances
/// are reused indefinitely.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// Idle instances kept at most; extra returned instances are dropped.
    pub max_idle: Option<usize>,
    /// Uses after which an instance is dropped instead of pooled again.
    pub max_uses: Option<u32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            port: 8080,
            mode: "dev".to_string(),
            datapack: "data".to_string(),
            log_level: "info".to_string(),
            secret: String::new(),
            blacklist: Vec::new(),
            new_char_vocations: Vec::new(),
            new_char_towns: Vec::new(),
            paypal: PayPalConfig::default(),
            captcha: CaptchaConfig::default(),
            mail: MailConfig::default(),
            paygol: PayGolConfig::default(),
            ssl: SslConfig::default(),
            custom: BTreeMap::new(),
            pool: PoolConfig::default(),
        }
    }
}

impl Default for PayPalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            public_key: String::new(),
            secret_key: String::new(),
            mode: "sandbox".to_string(),
            currency: "EUR".to_string(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Default for PayGolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service: 0,
            currency: "EUR".to_string(),
            language: "en".to_string(),
        }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cert: String::new(),
            key: String::new(),
            port: 443,
        }
    }
}

impl AppConfig {
    /// Load configuration from the specified path.
    pub fn load(path: impl AsRef<Path>) -> RuntimeResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> RuntimeResult<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    ///
    /// Returns `$XDG_CONFIG_HOME/ember/config.toml` on Linux.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "ember", "ember")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> RuntimeResult<()> {
        if self.port == 0 {
            return Err(RuntimeError::InvalidConfig("port must be greater than 0".into()));
        }

        if self.mode.trim().is_empty() {
            return Err(RuntimeError::InvalidConfig("mode must not be empty".into()));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(RuntimeError::InvalidConfig(format!(
                "Invalid log_level: {}. Must be one of: {}",
                self.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.paypal.enabled && !["sandbox", "live"].contains(&self.paypal.mode.as_str()) {
            return Err(RuntimeError::InvalidConfig(format!(
                "paypal.mode must be sandbox or live, got {}",
                self.paypal.mode
            )));
        }

        if self.pool.max_uses == Some(0) {
            return Err(RuntimeError::InvalidConfig(
                "pool.max_uses must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}
