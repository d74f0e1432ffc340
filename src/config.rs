//! Configuration management for the Safe File Store server
//!
//! Separates startup configuration (where and how the server listens) from
//! the upload limits that every Save and Rename is checked against.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::utils::parse_size;

const CONFIG_PATHS: [&str; 2] = [
    "safe-file-store/config", // container layout: /app/safe-file-store/config.toml
    "config",                 // local development: ./config.toml
];

/// Extensions refused by default: server-side scripts, binaries and shell scripts.
pub const DEFAULT_DENIED_EXTENSIONS: [&str; 9] = [
    "php", "php3", "php4", "php5", "phtml", "exe", "bat", "sh", "cmd",
];

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(flatten)]
    pub startup: StartupConfig,

    #[serde(flatten)]
    pub limits: LimitsConfig,
}

/// Listener and storage location (restart required)
#[derive(Debug, Deserialize, Clone)]
pub struct StartupConfig {
    /// Environment: SAFE_STORE_BIND_ADDRESS
    pub bind_address: String,

    /// Environment: SAFE_STORE_PORT
    pub port: u16,

    /// Directory holding the stored files.
    /// Environment: SAFE_STORE_UPLOAD_ROOT
    pub upload_root: String,
}

/// Upload limits as written in the configuration ("2M", "8M", ...)
#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Cap for a single uploaded file
    pub upload_max_filesize: String,

    /// Cap for the whole request body
    pub post_max_size: String,

    pub denied_extensions: Vec<String>,
}

/// Resolved upload rules handed to store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_upload_bytes: u64,
    pub max_request_bytes: u64,
    /// Lowercase, without the leading dot
    pub denied_extensions: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            startup: StartupConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                upload_root: "uploads".to_string(),
            },
            limits: LimitsConfig {
                upload_max_filesize: "2M".to_string(),
                post_max_size: "8M".to_string(),
                denied_extensions: DEFAULT_DENIED_EXTENSIONS
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect(),
            },
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides.
    ///
    /// Missing files are fine; built-in defaults fill every key.
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = ServerConfig::default();

        let mut builder = Config::builder()
            .set_default("bind_address", defaults.startup.bind_address.clone())?
            .set_default("port", i64::from(defaults.startup.port))?
            .set_default("upload_root", defaults.startup.upload_root.clone())?
            .set_default(
                "upload_max_filesize",
                defaults.limits.upload_max_filesize.clone(),
            )?
            .set_default("post_max_size", defaults.limits.post_max_size.clone())?
            .set_default(
                "denied_extensions",
                defaults.limits.denied_extensions.clone(),
            )?;

        for path in CONFIG_PATHS {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix("SAFE_STORE").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.startup.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.startup.upload_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "upload_root cannot be empty".into(),
            ));
        }

        self.upload_policy().map(|_| ())
    }

    /// Get bind address and port as socket address
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.startup.bind_address, self.startup.port)
    }

    /// Get upload root as PathBuf
    pub fn upload_root_path(&self) -> PathBuf {
        PathBuf::from(&self.startup.upload_root)
    }

    /// Parse the configured limits into byte counts.
    pub fn upload_policy(&self) -> Result<UploadPolicy, config::ConfigError> {
        let max_upload_bytes = parse_limit("upload_max_filesize", &self.limits.upload_max_filesize)?;
        let max_request_bytes = parse_limit("post_max_size", &self.limits.post_max_size)?;

        Ok(UploadPolicy {
            max_upload_bytes,
            max_request_bytes,
            denied_extensions: self
                .limits
                .denied_extensions
                .iter()
                .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        })
    }
}

fn parse_limit(key: &str, raw: &str) -> Result<u64, config::ConfigError> {
    match parse_size(raw) {
        Some(0) => Err(config::ConfigError::Message(format!(
            "{key} must be greater than 0"
        ))),
        Some(bytes) => Ok(bytes),
        None => Err(config::ConfigError::Message(format!(
            "{key} is not a valid size: {raw:?}"
        ))),
    }
}

impl UploadPolicy {
    /// Largest accepted upload: the smaller of the per-file and per-request caps.
    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_bytes.min(self.max_request_bytes)
    }

    /// Whether `extension` (any case, no dot) is refused.
    pub fn is_denied(&self, extension: &str) -> bool {
        let extension = extension.to_ascii_lowercase();
        self.denied_extensions.iter().any(|denied| *denied == extension)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        ServerConfig::default()
            .upload_policy()
            .unwrap_or_else(|_| UploadPolicy {
                max_upload_bytes: 2 * 1024 * 1024,
                max_request_bytes: 8 * 1024 * 1024,
                denied_extensions: Vec::new(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ServerConfig::default().upload_policy().unwrap();
        assert_eq!(policy.max_upload_bytes, 2 * 1024 * 1024);
        assert_eq!(policy.max_request_bytes, 8 * 1024 * 1024);
        assert_eq!(policy.max_upload_size(), 2 * 1024 * 1024);
        assert!(policy.is_denied("php"));
        assert!(policy.is_denied("PHTML"));
        assert!(!policy.is_denied("pdf"));
    }

    #[test]
    fn test_effective_max_is_minimum() {
        let mut config = ServerConfig::default();
        config.limits.upload_max_filesize = "16M".into();
        config.limits.post_max_size = "4M".into();
        let policy = config.upload_policy().unwrap();
        assert_eq!(policy.max_upload_size(), 4 * 1024 * 1024);
    }

    #[test]
    fn test_denied_extensions_are_normalised() {
        let mut config = ServerConfig::default();
        config.limits.denied_extensions = vec![".EXE".into(), " Sh ".into(), "".into()];
        let policy = config.upload_policy().unwrap();
        assert_eq!(policy.denied_extensions, vec!["exe".to_string(), "sh".to_string()]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.startup.port = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.startup.upload_root = "  ".into();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.limits.post_max_size = "0".into();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.limits.upload_max_filesize = "huge".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_listen_address() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_address(), "127.0.0.1:8080");
        assert_eq!(config.upload_root_path(), PathBuf::from("uploads"));
    }
}
