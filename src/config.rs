//! Configuration for pressbox.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (PRESSBOX_CHANNEL_INDEX, PRESSBOX_MAX_CONTENT_LENGTH)
//! 2. Config file ($PRESSBOX_CONFIG, or .pressbox/config.yaml in the current
//!    directory or a parent, or ~/.pressbox/config.yaml)
//! 3. Defaults
//!
//! Secrets are never read from the config file, see [`crate::storage::secrets`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default channel catalog file name
pub const DEFAULT_CHANNEL_INDEX: &str = "channels.json";

/// Default per-channel content catalog file name
pub const DEFAULT_CONTENT_INDEX: &str = "content.json";

/// Default upload limit (10MB)
pub const DEFAULT_MAX_CONTENT_LENGTH: u64 = 10 * 1024 * 1024;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub content: ContentConfig,
}

/// Storage backend selection and settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `s3`, `ftp`, or the name of a registered custom backend
    #[serde(rename = "type", default)]
    pub backend: Option<String>,
    /// Custom backend override, takes precedence over `type`
    #[serde(default)]
    pub custom_backend: Option<String>,
    #[serde(default)]
    pub s3: Option<S3Config>,
    #[serde(default)]
    pub ftp: Option<FtpConfig>,
}

/// The backend chosen by a [`StorageConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    S3,
    Ftp,
    Custom(String),
}

impl StorageConfig {
    /// Decide which backend this configuration selects
    pub fn selection(&self) -> Result<BackendKind, Error> {
        if let Some(name) = self.custom_backend.as_deref().filter(|n| !n.trim().is_empty()) {
            return Ok(BackendKind::Custom(name.to_string()));
        }

        match self.backend.as_deref().map(str::trim) {
            Some(kind) if kind.eq_ignore_ascii_case("s3") => Ok(BackendKind::S3),
            Some(kind) if kind.eq_ignore_ascii_case("ftp") => Ok(BackendKind::Ftp),
            Some(kind) if !kind.is_empty() => Ok(BackendKind::Custom(kind.to_string())),
            // No discriminator: fall back to whichever section is present
            _ if self.s3.is_some() => Ok(BackendKind::S3),
            _ if self.ftp.is_some() => Ok(BackendKind::Ftp),
            _ => Err(Error::Config(
                "no storage backend configured, set storage.type".to_string(),
            )),
        }
    }
}

/// S3-compatible object storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Server host (and optional port), or a full http(s) url
    pub server_address: String,
    pub bucket: String,
    /// Access key id, the secret key comes from the secret provider
    pub client_id: String,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// FTP/FTPS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtpConfig {
    /// Server url, e.g. `ftp://files.example.com:21`
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub base_path: Option<String>,
    #[serde(default)]
    pub tls: FtpTlsMode,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// FTP transport security
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FtpTlsMode {
    /// Plain FTP
    None,
    /// AUTH TLS upgrade on the control connection
    #[default]
    Explicit,
    /// TLS from the first byte (port 990)
    Implicit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default = "default_channel_index")]
    pub index_file_name: String,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            index_file_name: default_channel_index(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_content_index")]
    pub index_file_name: String,
    #[serde(default = "default_max_content_length")]
    pub max_content_length: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            index_file_name: default_content_index(),
            max_content_length: default_max_content_length(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_channel_index() -> String {
    DEFAULT_CHANNEL_INDEX.to_string()
}

fn default_content_index() -> String {
    DEFAULT_CONTENT_INDEX.to_string()
}

fn default_max_content_length() -> u64 {
    DEFAULT_MAX_CONTENT_LENGTH
}

/// Resolved configuration, passed to [`Services::build`](crate::Services::build)
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub storage: StorageConfig,
    /// Path of the top-level channel catalog
    pub channel_index: String,
    /// Content catalog file name inside each channel
    pub content_index: String,
    /// Upload size limit in bytes
    pub max_content_length: u64,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self::from_file(ConfigFile::default(), None)
    }
}

impl ResolvedConfig {
    fn from_file(file: ConfigFile, config_file: Option<PathBuf>) -> Self {
        Self {
            storage: file.storage,
            channel_index: file.channels.index_file_name,
            content_index: file.content.index_file_name,
            max_content_length: file.content.max_content_length,
            config_file,
        }
    }

    /// Use the given storage settings
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(index) = std::env::var("PRESSBOX_CHANNEL_INDEX") {
            self.channel_index = index;
        }

        if let Ok(max) = std::env::var("PRESSBOX_MAX_CONTENT_LENGTH") {
            self.max_content_length = max
                .parse()
                .with_context(|| format!("Invalid PRESSBOX_MAX_CONTENT_LENGTH: {}", max))?;
        }

        Ok(())
    }
}

/// Find config file: $PRESSBOX_CONFIG, then the current directory and its
/// parents, then the home directory
fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PRESSBOX_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".pressbox").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    dirs::home_dir()
        .map(|home| home.join(".pressbox").join("config.yaml"))
        .filter(|path| path.exists())
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from all sources
pub fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();

    let file = match config_file {
        Some(ref path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    let mut config = ResolvedConfig::from_file(file, config_file);
    config.apply_env()?;
    Ok(config)
}

/// Load configuration from an explicit file, still honoring env overrides
pub fn load_config_from(path: &Path) -> Result<ResolvedConfig> {
    let file = load_config_file(path)?;
    let mut config = ResolvedConfig::from_file(file, Some(path.to_path_buf()));
    config.apply_env()?;
    Ok(config)
}
