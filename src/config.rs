use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::{deserialize_duration, serialize_duration};
use crate::issuer::IssuanceEndpoint;

/// Vault's own default listener address.
pub const DEFAULT_VAULT_ADDRESS: &str = "https://127.0.0.1:8200";

/// Name of the token file kept in the user's home directory.
pub const TOKEN_FILE_NAME: &str = ".vault-token";

fn default_vault_address() -> String {
    DEFAULT_VAULT_ADDRESS.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_issue_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_cert_prefix() -> String {
    "secret/ssl".to_string()
}

fn default_display_timezone() -> String {
    "America/Los_Angeles".to_string()
}

fn default_file_mode() -> u32 {
    0o600
}

fn default_retry_backoff() -> Duration {
    Duration::from_millis(200)
}

/// Secret store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Vault server address. `VAULT_ADDR` overrides this.
    #[serde(default = "default_vault_address")]
    pub address: String,

    /// Where the session token is persisted. Defaults to `~/.vault-token`.
    pub token_file: Option<PathBuf>,

    /// Upper bound for a single HTTP request, including the response body.
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timeout: Duration,

    #[serde(
        default = "default_connect_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub connect_timeout: Duration,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: default_vault_address(),
            token_file: None,
            timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl VaultConfig {
    /// Resolve the token file location, expanding a leading `~/`.
    pub fn token_path(&self) -> Result<PathBuf> {
        let home = || dirs::home_dir().context("Could not find home directory");

        match &self.token_file {
            Some(path) => match path.strip_prefix("~") {
                Ok(rest) => Ok(home()?.join(rest)),
                Err(_) => Ok(path.clone()),
            },
            None => Ok(home()?.join(TOKEN_FILE_NAME)),
        }
    }
}

/// Where certificate bundles live in the secret store and how they are rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertsConfig {
    /// Secret store path under which one secret per domain is stored.
    #[serde(default = "default_cert_prefix")]
    pub prefix: String,

    /// IANA timezone used when printing expiration dates.
    ///
    /// This is purely a presentation setting.
    #[serde(default = "default_display_timezone")]
    pub display_timezone: String,

    /// Unix permission bits applied to every written PEM file.
    #[serde(default = "default_file_mode")]
    pub file_mode: u32,
}

impl Default for CertsConfig {
    fn default() -> Self {
        Self {
            prefix: default_cert_prefix(),
            display_timezone: default_display_timezone(),
            file_mode: default_file_mode(),
        }
    }
}

/// Certificate issuing service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerConfig {
    /// ACME environment the service should issue against.
    pub endpoint: IssuanceEndpoint,

    /// Deadline for the whole `GetCertificate` call. Issuance can take a while.
    #[serde(
        default = "default_issue_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timeout: Duration,

    #[serde(
        default = "default_connect_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub connect_timeout: Duration,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            endpoint: IssuanceEndpoint::default(),
            timeout: default_issue_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// Retry policy for transient transport failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one. Zero is treated as one.
    pub attempts: u32,

    /// Backoff before the second attempt; doubled for each attempt after.
    #[serde(
        default = "default_retry_backoff",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: default_retry_backoff(),
        }
    }
}

impl RetryConfig {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vault: VaultConfig,
    pub certs: CertsConfig,
    pub issuer: IssuerConfig,
    pub retry: RetryConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `VAULT_ADDR` from the given environment lookup.
    ///
    /// Empty values are ignored, so an exported-but-blank variable keeps the file setting.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(address) = lookup("VAULT_ADDR").filter(|v| !v.trim().is_empty()) {
            self.vault.address = address;
        }
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./vaultcert.toml` if it exists in current directory
/// 2. `~/.config/vaultcert/config.toml` (XDG config directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("vaultcert.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("vaultcert").join("config.toml");
    }

    local_config
}
