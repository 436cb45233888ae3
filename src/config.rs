//! TOML configuration file and the resolved client settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::{ClientError, Result};

pub const DEFAULT_URL: &str = "http://localhost:8000/";
pub const DEFAULT_REPORT_TYPE: &str = "research_report";
pub const DEFAULT_AGENT: &str = "Auto Agent";

/// Settings as read from `config.toml`. Every field is optional; absent
/// fields fall back to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub report_type: Option<String>,
    pub agent: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub copy: Option<bool>,
}

impl FileConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    /// Load an explicitly named file (which must exist), or the default file
    /// if it exists, or nothing.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "loading default config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// `<config dir>/research-console/config.toml` on this platform.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "research-console")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// URL of the research page; the socket URI is derived from it.
    pub page_url: Url,
    pub report_type: String,
    pub agent: String,
    pub connect_timeout: Option<Duration>,
    pub copy: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            page_url: Url::parse(DEFAULT_URL).expect("default URL is valid"),
            report_type: DEFAULT_REPORT_TYPE.to_string(),
            agent: DEFAULT_AGENT.to_string(),
            connect_timeout: None,
            copy: false,
        }
    }
}

impl ClientConfig {
    /// Apply a config file on top of the defaults.
    pub fn from_file(file: &FileConfig) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = &file.url {
            config.page_url = parse_page_url(url)?;
        }
        if let Some(report_type) = &file.report_type {
            config.report_type = report_type.clone();
        }
        if let Some(agent) = &file.agent {
            config.agent = agent.clone();
        }
        if let Some(secs) = file.connect_timeout_secs {
            config.connect_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(copy) = file.copy {
            config.copy = copy;
        }
        Ok(config)
    }
}

pub fn parse_page_url(text: &str) -> Result<Url> {
    Url::parse(text).map_err(|e| ClientError::Config(format!("invalid url `{text}`: {e}")))
}
