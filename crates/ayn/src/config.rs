//! TOML configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 11249;
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_STORAGE_FILE: &str = "storage.db";
pub const DEFAULT_HOME_DIR: &str = ".ayn";

/// `~/.ayn` for the current user, when a home directory can be found.
pub fn default_home() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_HOME_DIR))
}

/// A listening address, optionally served over TLS.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub tls_enabled: bool,
    /// PEM certificate chain.
    pub tls_cert_file: Option<PathBuf>,
    /// PEM private key matching the certificate.
    pub tls_key_file: Option<PathBuf>,
}

/// Certificate and key files of a TLS listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            tls_enabled: false,
            tls_cert_file: None,
            tls_key_file: None,
        }
    }
}

impl Endpoint {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The files to serve TLS with, or `None` for plain HTTP.
    ///
    /// Enabling TLS without both files is an error.
    pub fn tls(&self) -> Result<Option<TlsFiles>> {
        if !self.tls_enabled {
            return Ok(None);
        }
        match (&self.tls_cert_file, &self.tls_key_file) {
            (Some(cert), Some(key)) => Ok(Some(TlsFiles {
                cert: cert.clone(),
                key: key.clone(),
            })),
            _ => bail!(
                "tls_enabled on {} requires both tls_cert_file and tls_key_file",
                self.addr()
            ),
        }
    }
}

/// A private key file to load at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyConfig {
    pub path: PathBuf,
    /// Password for encrypted entries.
    #[serde(default)]
    pub password: Option<String>,
    /// Explicit format (`PEM`, `DER`, ...), otherwise detected.
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reserved, not served yet.
    pub pull_endpoint: Endpoint,
    /// Reserved, not served yet.
    pub push_endpoint: Endpoint,
    pub sign_endpoint: Endpoint,
    /// Keys by alias.
    pub keys: BTreeMap<String, KeyConfig>,
}

impl Config {
    /// Loads the config file at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.sign_endpoint.tls().context("sign_endpoint")?;
        Ok(config)
    }
}
