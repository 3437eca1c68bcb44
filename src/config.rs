//! Gateway configuration, read from a TOML file.
//!
//! ```toml
//! [ftp]
//! host = "localhost"
//! port = 2121
//! connect_timeout_secs = 10
//! admin_user = "ezaz"
//!
//! [staging]
//! dir = "uploads"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ftp: FtpConfig,
    pub staging: StagingConfig,
}

/// Where the FTP backend lives and who may log in to it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FtpConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout_secs: u64,
    /// The single account allowed to hold an authenticated identity.
    pub admin_user: String,
    pub anonymous_user: String,
    pub anonymous_password: String,
    /// Upgrade the control connection with `AUTH TLS` (needs the `secure` feature).
    pub secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    pub dir: PathBuf,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            port: 2121,
            connect_timeout_secs: 10,
            admin_user: String::from("ezaz"),
            anonymous_user: String::from("anonymous"),
            anonymous_password: String::from("anonymous@"),
            secure: false,
        }
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
        }
    }
}

impl FtpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_toml(&config_str).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(config_str: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(config_str)
    }

    /// Write every effective setting to the log; the admin user name is
    /// shown, secrets never are.
    pub fn log(&self) {
        info!("  FTP Address: {}", self.ftp.address());
        info!("  Connect Timeout: {}s", self.ftp.connect_timeout_secs);
        info!("  Admin User: {}", self.ftp.admin_user);
        info!("  Anonymous User: {}", self.ftp.anonymous_user);
        info!("  Secure: {}", self.ftp.secure);
        info!("  Staging Directory: {}", self.staging.dir.display());
    }
}
