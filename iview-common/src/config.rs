//! Configuration loading
//!
//! Each setting resolves in priority order:
//! 1. Command-line flag or environment variable (both arrive via clap)
//! 2. TOML config file
//! 3. Compiled default

use crate::{Error, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "IVIEW_CONFIG";

pub const DEFAULT_BIND: &str = "127.0.0.1:5780";
pub const DEFAULT_SESSION_TTL_HOURS: u32 = 12;
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 20;
pub const DEFAULT_INVITE_TTL_DAYS: u32 = 14;
/// Longest invitation lifetime, for the default and per-request values
pub const MAX_INVITE_TTL_DAYS: u32 = 365;

/// Contents of the TOML config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub bind: Option<String>,
    pub database: Option<PathBuf>,
    pub public_url: Option<String>,
    pub session_secret: Option<String>,
    pub session_ttl_hours: Option<u32>,
    pub conductor_url: Option<String>,
    pub rate_limit_per_minute: Option<u32>,
    pub rate_limit_burst: Option<u32>,
    pub invite_ttl_days: Option<u32>,
}

/// Values supplied on the command line or through the environment
pub type Overrides = FileConfig;

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub database_path: PathBuf,
    /// Base URL candidates and the embed script use, without trailing slash
    pub public_base_url: String,
    /// Explicit session signing secret; `None` means use the persisted one
    pub session_secret: Option<String>,
    pub session_ttl_hours: u32,
    pub conductor_url: Option<String>,
    pub rate_limit_per_minute: u32,
    pub rate_limit_burst: u32,
    pub invite_ttl_days: u32,
}

impl ServiceConfig {
    /// Merge overrides over the file config over defaults, then validate
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Result<Self> {
        let bind_raw = overrides
            .bind
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw
            .parse()
            .map_err(|e| Error::Config(format!("invalid bind address '{}': {}", bind_raw, e)))?;

        let public_base_url = overrides
            .public_url
            .or(file.public_url)
            .unwrap_or_else(|| format!("http://{}", bind))
            .trim_end_matches('/')
            .to_string();
        if !(public_base_url.starts_with("http://") || public_base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "public URL must start with http:// or https://, got '{}'",
                public_base_url
            )));
        }

        let config = ServiceConfig {
            bind,
            database_path: overrides
                .database
                .or(file.database)
                .unwrap_or_else(default_database_path),
            public_base_url,
            session_secret: overrides
                .session_secret
                .or(file.session_secret)
                .filter(|s| !s.is_empty()),
            session_ttl_hours: overrides
                .session_ttl_hours
                .or(file.session_ttl_hours)
                .unwrap_or(DEFAULT_SESSION_TTL_HOURS),
            conductor_url: overrides
                .conductor_url
                .or(file.conductor_url)
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            rate_limit_per_minute: overrides
                .rate_limit_per_minute
                .or(file.rate_limit_per_minute)
                .unwrap_or(DEFAULT_RATE_LIMIT_PER_MINUTE),
            rate_limit_burst: overrides
                .rate_limit_burst
                .or(file.rate_limit_burst)
                .unwrap_or(DEFAULT_RATE_LIMIT_BURST),
            invite_ttl_days: overrides
                .invite_ttl_days
                .or(file.invite_ttl_days)
                .unwrap_or(DEFAULT_INVITE_TTL_DAYS),
        };

        if config.session_ttl_hours == 0 {
            return Err(Error::Config("session_ttl_hours must be > 0".to_string()));
        }
        if config.rate_limit_per_minute == 0 || config.rate_limit_burst == 0 {
            return Err(Error::Config(
                "rate_limit_per_minute and rate_limit_burst must be > 0".to_string(),
            ));
        }
        if !(1..=MAX_INVITE_TTL_DAYS).contains(&config.invite_ttl_days) {
            return Err(Error::Config(format!(
                "invite_ttl_days must be between 1 and {}",
                MAX_INVITE_TTL_DAYS
            )));
        }

        Ok(config)
    }
}

/// Locate the config file: explicit path, then `IVIEW_CONFIG`, then the
/// per-user config directory. Only the explicit forms must exist.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = cli_path {
        return require_exists(path.to_path_buf()).map(Some);
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return require_exists(PathBuf::from(path)).map(Some);
        }
    }

    Ok(dirs::config_dir()
        .map(|d| d.join("iview").join("config.toml"))
        .filter(|p| p.exists()))
}

fn require_exists(path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {}", path.display())))
    }
}

/// Parse a TOML config file
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_file_config(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Parse TOML config text
pub fn parse_file_config(content: &str) -> Result<FileConfig> {
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("iview"))
        .unwrap_or_else(|| PathBuf::from("./iview_data"))
        .join("iview.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::resolve(Overrides::default(), FileConfig::default()).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND.parse().unwrap());
        assert_eq!(config.public_base_url, "http://127.0.0.1:5780");
        assert_eq!(config.session_ttl_hours, DEFAULT_SESSION_TTL_HOURS);
        assert_eq!(config.rate_limit_per_minute, 60);
        assert_eq!(config.rate_limit_burst, 20);
        assert_eq!(config.invite_ttl_days, 14);
        assert!(config.session_secret.is_none());
        assert!(config.conductor_url.is_none());
        assert!(config.database_path.ends_with("iview.db"));
    }

    #[test]
    fn test_override_beats_file_beats_default() {
        let file = FileConfig {
            rate_limit_per_minute: Some(10),
            rate_limit_burst: Some(5),
            public_url: Some("https://file.example".to_string()),
            ..Default::default()
        };
        let overrides = Overrides {
            rate_limit_per_minute: Some(99),
            ..Default::default()
        };

        let config = ServiceConfig::resolve(overrides, file).unwrap();
        assert_eq!(config.rate_limit_per_minute, 99);
        assert_eq!(config.rate_limit_burst, 5);
        assert_eq!(config.public_base_url, "https://file.example");
    }

    #[test]
    fn test_trailing_slashes_trimmed() {
        let overrides = Overrides {
            public_url: Some("https://jobs.example.com/".to_string()),
            conductor_url: Some("https://conductor.example.com/".to_string()),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(overrides, FileConfig::default()).unwrap();
        assert_eq!(config.public_base_url, "https://jobs.example.com");
        assert_eq!(config.conductor_url.as_deref(), Some("https://conductor.example.com"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_bind = Overrides {
            bind: Some("not-an-address".to_string()),
            ..Default::default()
        };
        assert!(ServiceConfig::resolve(bad_bind, FileConfig::default()).is_err());

        let zero_rate = Overrides {
            rate_limit_per_minute: Some(0),
            ..Default::default()
        };
        assert!(ServiceConfig::resolve(zero_rate, FileConfig::default()).is_err());

        let bad_url = Overrides {
            public_url: Some("ftp://x".to_string()),
            ..Default::default()
        };
        assert!(ServiceConfig::resolve(bad_url, FileConfig::default()).is_err());
    }

    #[test]
    fn test_invite_ttl_bounded() {
        let too_long = FileConfig {
            invite_ttl_days: Some(MAX_INVITE_TTL_DAYS + 35),
            ..Default::default()
        };
        assert!(ServiceConfig::resolve(Overrides::default(), too_long).is_err());

        let zero = Overrides {
            invite_ttl_days: Some(0),
            ..Default::default()
        };
        assert!(ServiceConfig::resolve(zero, FileConfig::default()).is_err());

        let longest = Overrides {
            invite_ttl_days: Some(MAX_INVITE_TTL_DAYS),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(longest, FileConfig::default()).unwrap();
        assert_eq!(config.invite_ttl_days, 365);
    }

    #[test]
    fn test_empty_session_secret_treated_as_unset() {
        let overrides = Overrides {
            session_secret: Some(String::new()),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(overrides, FileConfig::default()).unwrap();
        assert!(config.session_secret.is_none());
    }

    #[test]
    fn test_parse_file_config() {
        let config = parse_file_config(
            r#"
            bind = "0.0.0.0:8080"
            conductor_url = "https://conductor.internal"
            invite_ttl_days = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.bind.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(config.invite_ttl_days, Some(3));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(parse_file_config("colour = \"red\"").is_err());
    }
}
