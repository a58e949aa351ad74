use std::env;
use std::fs;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_CHARSET: &str = "utf8mb4";
pub const DEFAULT_PAGE_SIZE: NonZeroU64 = match NonZeroU64::new(50) {
    Some(size) => size,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    Disabled,
    #[default]
    Prefer,
    Require,
    VerifyIdentity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default)]
    pub tls_mode: TlsMode,
    #[serde(default)]
    pub tls_ca_cert_path: Option<String>,
}

impl ConnectionProfile {
    #[must_use]
    pub fn new(name: impl Into<String>, host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: DEFAULT_PORT,
            user: user.into(),
            charset: DEFAULT_CHARSET.to_string(),
            tls_mode: TlsMode::Prefer,
            tls_ca_cert_path: None,
        }
    }

    #[must_use]
    pub fn charset_is_valid(&self) -> bool {
        !self.charset.is_empty()
            && self
                .charset
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    }
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self::new("local", "localhost", "root")
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_charset() -> String {
    DEFAULT_CHARSET.to_string()
}

fn default_page_size() -> NonZeroU64 {
    DEFAULT_PAGE_SIZE
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrowseSettings {
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroU64,
    #[serde(default = "default_true")]
    pub collect_sizes: bool,
    #[serde(default)]
    pub order_by_primary_key: bool,
}

impl Default for BrowseSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            collect_sizes: true,
            order_by_primary_key: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InspectorConfig {
    #[serde(default)]
    pub profile: ConnectionProfile,
    #[serde(default)]
    pub browse: BrowseSettings,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config directory is unavailable for this platform")]
    ConfigDirUnavailable,
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to create config directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize config: {source}")]
    Serialize {
        #[source]
        source: toml::ser::Error,
    },
    #[error("failed to write config file at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
    config: InspectorConfig,
}

impl FileConfigStore {
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path()?;
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                config: InspectorConfig::default(),
            });
        }

        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        if raw.trim().is_empty() {
            return Ok(Self {
                path,
                config: InspectorConfig::default(),
            });
        }

        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        Ok(Self { path, config })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut InspectorConfig {
        &mut self.config
    }

    #[must_use]
    pub fn into_config(self) -> InspectorConfig {
        self.config
    }

    pub fn persist(&self) -> Result<(), ConfigError> {
        if let Some(parent_dir) = self.path.parent() {
            fs::create_dir_all(parent_dir).map_err(|source| ConfigError::CreateDir {
                path: parent_dir.to_path_buf(),
                source,
            })?;
        }

        let rendered = toml::to_string_pretty(&self.config)
            .map_err(|source| ConfigError::Serialize { source })?;

        fs::write(&self.path, rendered).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let base_dir = if let Some(custom) = env::var_os("DBPEEK_CONFIG_DIR") {
        PathBuf::from(custom)
    } else if cfg!(target_os = "windows") {
        env::var_os("APPDATA")
            .map(PathBuf::from)
            .ok_or(ConfigError::ConfigDirUnavailable)?
    } else if let Some(xdg_config_home) = env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config_home)
    } else {
        let home = env::var_os("HOME").ok_or(ConfigError::ConfigDirUnavailable)?;
        PathBuf::from(home).join(".config")
    };

    Ok(base_dir.join("dbpeek").join("config.toml"))
}
