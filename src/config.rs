//! Configuration module
//!
//! Application settings are read from a TOML file
//! (`~/.config/user-directory/config.toml` by default). Every section and
//! key is optional; missing values fall back to the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{EmailUniqueness, SUPER_ADMIN};
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::crypto::password::DEFAULT_COST;
use crate::infrastructure::DatabaseConfig;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "USER_DIRECTORY_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Default config location: `<config_dir>/user-directory/config.toml`,
/// or the path in `USER_DIRECTORY_CONFIG`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("user-directory")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub security: SecurityConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
    pub directory: DirectoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight work after a shutdown signal
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Full connection URL; takes precedence over `path`
    pub url: Option<String>,
    /// SQLite file path
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            path: "./user-directory.db".to_string(),
            max_connections: 10,
        }
    }
}

impl DatabaseSection {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => DatabaseConfig::sqlite(&self.path).url,
        }
    }

    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.connection_url(),
            max_connections: self.max_connections,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub jwt_issuer: String,
    /// bcrypt work factor (4..=31)
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "super-secret-key-change-in-production".to_string(),
            jwt_expiration_hours: 24,
            jwt_issuer: "user-directory".to_string(),
            bcrypt_cost: DEFAULT_COST,
        }
    }
}

impl SecurityConfig {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt_secret.clone(),
            expiration_hours: self.jwt_expiration_hours,
            issuer: self.jwt_issuer.clone(),
        }
    }
}

/// Account created on first start when the users table is empty.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            name: "Administrator".to_string(),
            email: "admin@example.com".to_string(),
            password: "admin123".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info,sea_orm=warn`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Behaviour of the user directory itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub email_uniqueness: EmailUniqueness,
    pub require_password_on_create: bool,
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Roles ensured at startup; `super_admin` is always added.
    pub seed_roles: Vec<String>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            email_uniqueness: EmailUniqueness::ActiveOnly,
            require_password_on_create: false,
            default_page_size: 10,
            max_page_size: 100,
            seed_roles: vec![SUPER_ADMIN.to_string()],
        }
    }
}

impl DirectoryConfig {
    /// Seed roles with `super_admin` guaranteed and duplicates removed.
    pub fn roles_to_seed(&self) -> Vec<String> {
        let mut roles: Vec<String> = std::iter::once(SUPER_ADMIN.to_string())
            .chain(self.seed_roles.iter().map(|r| r.trim().to_string()))
            .filter(|r| !r.is_empty())
            .collect();
        roles.sort();
        roles.dedup();
        roles
    }
}

impl AppConfig {
    /// Loads the file at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::Invalid(format!(
                "security.bcrypt_cost must be between 4 and 31, got {}",
                self.security.bcrypt_cost
            )));
        }
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("security.jwt_secret is empty".into()));
        }
        if self.directory.max_page_size == 0 {
            return Err(ConfigError::Invalid(
                "directory.max_page_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.api_port, 8080);
        assert_eq!(config.directory.email_uniqueness, EmailUniqueness::ActiveOnly);
        assert_eq!(config.directory.default_page_size, 10);
        assert_eq!(config.security.bcrypt_cost, DEFAULT_COST);
        assert_eq!(
            config.database.connection_url(),
            "sqlite://./user-directory.db?mode=rwc"
        );
    }

    #[test]
    fn reads_partial_sections() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            api_port = 9100

            [logging]
            format = "json"

            [directory]
            email_uniqueness = "including_deleted"
            seed_roles = ["editor", "super_admin", " viewer "]

            [database]
            url = "sqlite::memory:"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.api_port, 9100);
        assert_eq!(config.server.api_host, "0.0.0.0");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.directory.email_uniqueness,
            EmailUniqueness::IncludingDeleted
        );
        assert_eq!(
            config.directory.roles_to_seed(),
            vec!["editor", "super_admin", "viewer"]
        );
        assert_eq!(config.database.connection_url(), "sqlite::memory:");
    }

    #[test]
    fn rejects_out_of_range_cost() {
        let err = AppConfig::from_toml("[security]\nbcrypt_cost = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = AppConfig::from_toml("[server]\napi_port = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let rendered = format!("{:?}", AppConfig::default());
        assert!(!rendered.contains("admin123"));
        assert!(!rendered.contains("super-secret-key"));
    }
}
