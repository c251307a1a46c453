//! Configuration for the CrimsonGuard CLI.
//!
//! TOML settings, API key resolution (env + keyring + plaintext), and
//! translation to `crimson_core` runtime types. The CLI adds
//! `GlobalOpts`-aware wrappers on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crimson_core::config::{DEFAULT_ADVISOR_MODEL, DEFAULT_ADVISOR_URL};
use crimson_core::{
    AdvisorConfig, Catalog, ControllerConfig, CoreError, Endpoint, RateRange, TlsVerification,
    TrafficProfile,
};

/// Prefix for environment overrides. Nested keys use `__`,
/// e.g. `CRIMSON_ADVISOR__MODEL`.
pub const ENV_PREFIX: &str = "CRIMSON_";

const KEYRING_SERVICE: &str = "crimson";
const KEYRING_API_KEY: &str = "advisor/api-key";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for the advisor")]
    NoCredentials,

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<CoreError> for ConfigError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCatalog { reason } => Self::Validation {
                field: "servers".into(),
                reason,
            },
            other => Self::Validation {
                field: "settings".into(),
                reason: other.to_string(),
            },
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub connection: ConnectionSettings,

    #[serde(default)]
    pub traffic: TrafficSettings,

    #[serde(default)]
    pub advisor: AdvisorSettings,

    /// Replaces the built-in catalog when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Endpoint>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// Connection cycle pacing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    #[serde(default = "default_connect_delay")]
    pub connect_delay_ms: u64,

    #[serde(default = "default_disconnect_delay")]
    pub disconnect_delay_ms: u64,

    #[serde(default = "default_sample_period")]
    pub sample_period_ms: u64,

    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_delay_ms: default_connect_delay(),
            disconnect_delay_ms: default_disconnect_delay(),
            sample_period_ms: default_sample_period(),
            window_capacity: default_window_capacity(),
        }
    }
}

fn default_connect_delay() -> u64 {
    2000
}
fn default_disconnect_delay() -> u64 {
    1000
}
fn default_sample_period() -> u64 {
    1000
}
fn default_window_capacity() -> usize {
    20
}

/// Synthetic traffic bounds in Mbps, each `[min, max)`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrafficSettings {
    #[serde(default = "default_upload")]
    pub upload: RateRange,

    #[serde(default = "default_download")]
    pub download: RateRange,
}

impl Default for TrafficSettings {
    fn default() -> Self {
        Self {
            upload: default_upload(),
            download: default_download(),
        }
    }
}

fn default_upload() -> RateRange {
    TrafficProfile::default().upload_mbps
}
fn default_download() -> RateRange {
    TrafficProfile::default().download_mbps
}

/// Generative advisory service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdvisorSettings {
    /// Set to `false` to always use the fallback text.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// API key (plaintext — prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,

    /// Path to an extra CA certificate (TLS-intercepting proxies).
    pub ca_cert: Option<PathBuf>,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            model: default_model(),
            timeout: default_timeout(),
            api_key: None,
            api_key_env: default_api_key_env(),
            ca_cert: None,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_base_url() -> String {
    DEFAULT_ADVISOR_URL.into()
}
fn default_model() -> String {
    DEFAULT_ADVISOR_MODEL.into()
}
fn default_timeout() -> u64 {
    30
}
#[allow(clippy::unnecessary_wraps)]
fn default_api_key_env() -> Option<String> {
    Some("GEMINI_API_KEY".into())
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "crimson", "crimson").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("crimson");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from `path` + environment.
///
/// Layering: built-in defaults, then the TOML file (if present), then
/// `CRIMSON_`-prefixed environment variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, creating parent dirs.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the advisor API key: env var, then system keyring, then plaintext.
pub fn resolve_api_key(settings: &AdvisorSettings) -> Result<SecretString, ConfigError> {
    // 1. Named env var
    if let Some(ref env_name) = settings.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.trim().is_empty() {
                return Ok(SecretString::from(val));
            }
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_API_KEY) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref key) = settings.api_key {
        if !key.trim().is_empty() {
            return Ok(SecretString::from(key.clone()));
        }
    }

    Err(ConfigError::NoCredentials)
}

/// Store the advisor API key in the system keyring.
pub fn store_api_key(secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_API_KEY)
        .and_then(|entry| entry.set_password(secret))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── Translation to core types ───────────────────────────────────────

impl Config {
    /// Timing, capacity, and traffic bounds for the controller.
    pub fn controller_config(&self) -> Result<ControllerConfig, ConfigError> {
        let c = &self.connection;
        let config = ControllerConfig {
            connect_delay: Duration::from_millis(c.connect_delay_ms),
            disconnect_delay: Duration::from_millis(c.disconnect_delay_ms),
            sample_period: Duration::from_millis(c.sample_period_ms),
            window_capacity: c.window_capacity,
            traffic: TrafficProfile {
                upload_mbps: self.traffic.upload,
                download_mbps: self.traffic.download,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// The configured catalog, or the built-in one if `[[servers]]` is empty.
    pub fn catalog(&self) -> Result<Catalog, ConfigError> {
        if self.servers.is_empty() {
            return Ok(Catalog::builtin()?);
        }
        Ok(Catalog::new(self.servers.clone())?)
    }

    /// Advisor settings with the API key resolved.
    ///
    /// Falls back to [`AdvisorConfig::Offline`] when the advisor is
    /// disabled or no key can be found.
    pub fn advisor_config(&self) -> Result<AdvisorConfig, ConfigError> {
        let a = &self.advisor;
        if !a.enabled {
            return Ok(AdvisorConfig::Offline);
        }

        let api_key = match resolve_api_key(a) {
            Ok(key) => key,
            Err(ConfigError::NoCredentials) => return Ok(AdvisorConfig::Offline),
            Err(e) => return Err(e),
        };

        let base_url: url::Url = a.base_url.parse().map_err(|_| ConfigError::Validation {
            field: "advisor.base_url".into(),
            reason: format!("invalid URL: {}", a.base_url),
        })?;

        if a.model.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "advisor.model".into(),
                reason: "must not be empty".into(),
            });
        }

        let tls = a
            .ca_cert
            .clone()
            .map_or(TlsVerification::SystemDefaults, TlsVerification::CustomCa);

        Ok(AdvisorConfig::Gemini {
            base_url,
            model: a.model.clone(),
            api_key,
            timeout: Duration::from_secs(a.timeout),
            tls,
        })
    }
}
