// src/core/config_manager.rs
//! Configuration loading: `config.yaml` per environment plus env overrides for secrets

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: String,
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub auth: AuthSettings,
    pub mail: MailSettings,
    pub calendar: CalendarSettings,
    pub logging: LoggingSettings,
    /// Raised while loading, before a subscriber exists; logged once logging is up
    pub startup_warnings: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub address: String,
    pub port: u16,
    pub public_url: String,
    pub allowed_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub database_path: PathBuf,
    pub uploads_path: PathBuf,
    pub max_upload_mib: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub verification_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub sender_name: String,
    pub sender_email: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    pub base_url: String,
    pub calendar_id: String,
    pub api_token: Option<String>,
    pub timezone: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub filter: String,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EnvironmentSection {
    server: ServerSettings,
    storage: StorageSettings,
    auth: AuthSettings,
    mail: MailSettings,
    calendar: CalendarSettings,
    logging: LoggingSettings,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: EnvironmentSection,
    #[serde(default)]
    production: EnvironmentSection,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8000,
            public_url: "http://localhost:8000".to_string(),
            allowed_origin: "*".to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/jobboard.db"),
            uploads_path: PathBuf::from("uploads"),
            max_upload_mib: 10,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: 24,
            verification_ttl_hours: 48,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.brevo.com/v3".to_string(),
            api_key: None,
            sender_name: "Job Board".to_string(),
            sender_email: "no-reply@jobboard.local".to_string(),
            timeout_seconds: 15,
        }
    }
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            calendar_id: "primary".to_string(),
            api_token: None,
            timezone: "UTC".to_string(),
            timeout_seconds: 15,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "job_board=info,rocket::server=off".to_string(),
            file: None,
        }
    }
}

impl ConfigManager {
    /// Load configuration for the current environment.
    pub fn load() -> Result<Self> {
        let path = std::env::var("JOBBOARD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let environment = Self::get_environment();
        let mut startup_warnings = Vec::new();

        let section = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::parse_section(&content, &environment)?
        } else {
            startup_warnings.push(format!("{} not found, using built-in defaults", path.display()));
            EnvironmentSection::default()
        };

        let mut config = Self::from_section(environment, section)?;
        config.startup_warnings = startup_warnings;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("JOBBOARD_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn parse_section(content: &str, environment: &str) -> Result<EnvironmentSection> {
        let file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse configuration file")?;
        Ok(match environment {
            "production" => file.production,
            _ => file.local,
        })
    }

    fn from_section(environment: String, section: EnvironmentSection) -> Result<Self> {
        let mut storage = section.storage;
        storage.database_path = Self::resolve_path(&storage.database_path)?;
        storage.uploads_path = Self::resolve_path(&storage.uploads_path)?;

        Ok(Self {
            environment,
            server: section.server,
            storage,
            auth: section.auth,
            mail: section.mail,
            calendar: section.calendar,
            logging: section.logging,
            startup_warnings: Vec::new(),
        })
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var("JOBBOARD_PORT").or_else(|_| std::env::var("ROCKET_PORT")) {
            self.server.port = port
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("Port must be a valid port number, got {}", port))?;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(key) = std::env::var("MAIL_API_KEY") {
            self.mail.api_key = Some(key);
        }
        if let Ok(token) = std::env::var("CALENDAR_API_TOKEN") {
            self.calendar.api_token = Some(token);
        }
        if let Ok(path) = std::env::var("DATABASE_PATH") {
            self.storage.database_path = Self::resolve_path(&PathBuf::from(path))?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            anyhow::bail!("bcrypt_cost must be between 4 and 31, got {}", self.auth.bcrypt_cost);
        }
        if self.auth.jwt_secret.len() < 16 {
            if self.environment == "production" {
                anyhow::bail!("JWT secret must be at least 16 characters in production");
            }
            self.startup_warnings.push(
                "JWT secret is missing or short; only acceptable for local development".to_string(),
            );
        }
        Ok(())
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    /// Ensure upload and database directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        use crate::core::FsOps;

        FsOps::ensure_dir_exists(&self.storage.uploads_path).await?;
        if let Some(db_parent) = self.storage.database_path.parent() {
            FsOps::ensure_dir_exists(db_parent).await?;
        }
        Ok(())
    }

    /// Secret used to sign tokens; a fixed development value when unset.
    pub fn jwt_secret(&self) -> &str {
        if self.auth.jwt_secret.is_empty() {
            "local-development-secret"
        } else {
            &self.auth.jwt_secret
        }
    }
}

impl ConfigManager {
    /// Self-contained configuration rooted at `root` with mail and calendar disabled.
    pub fn rooted_at(root: &Path) -> Self {
        let section = EnvironmentSection::default();
        Self {
            environment: "test".to_string(),
            server: section.server,
            storage: StorageSettings {
                database_path: root.join("test.db"),
                uploads_path: root.join("uploads"),
                max_upload_mib: 10,
            },
            auth: AuthSettings {
                jwt_secret: "test-secret-with-enough-length".to_string(),
                bcrypt_cost: 4,
                ..section.auth
            },
            mail: section.mail,
            calendar: section.calendar,
            logging: section.logging,
            startup_warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_section_picks_environment() {
        let yaml = r#"
local:
  server:
    port: 9000
production:
  server:
    port: 80
  storage:
    uploads_path: /srv/uploads
"#;
        let local = ConfigManager::parse_section(yaml, "local").unwrap();
        assert_eq!(local.server.port, 9000);
        assert_eq!(local.storage.uploads_path, PathBuf::from("uploads"));

        let prod = ConfigManager::parse_section(yaml, "production").unwrap();
        assert_eq!(prod.server.port, 80);
        assert_eq!(prod.storage.uploads_path, PathBuf::from("/srv/uploads"));
    }

    #[test]
    fn test_unknown_environment_falls_back_to_local() {
        let yaml = "local:\n  auth:\n    token_ttl_hours: 2\n";
        let section = ConfigManager::parse_section(yaml, "staging").unwrap();
        assert_eq!(section.auth.token_ttl_hours, 2);
        assert_eq!(section.auth.verification_ttl_hours, 48);
    }

    #[test]
    fn test_resolve_path_keeps_absolute() {
        let abs = PathBuf::from("/tmp/jobs.db");
        assert_eq!(ConfigManager::resolve_path(&abs).unwrap(), abs);
        assert!(ConfigManager::resolve_path(Path::new("rel.db"))
            .unwrap()
            .is_absolute());
    }

    #[test]
    fn test_jwt_secret_fallback() {
        let mut config = ConfigManager::rooted_at(Path::new("/tmp"));
        config.auth.jwt_secret.clear();
        assert_eq!(config.jwt_secret(), "local-development-secret");
    }

    #[test]
    fn test_load_from_collects_startup_warnings() {
        let root = std::env::temp_dir().join(format!("jobboard-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&root).unwrap();
        let path = root.join("config.yaml");
        std::fs::write(&path, "local:\n  auth:\n    jwt_secret: short\n    bcrypt_cost: 4\n").unwrap();

        let config = ConfigManager::load_from(&path).unwrap();
        assert_eq!(config.auth.bcrypt_cost, 4);
        assert!(config
            .startup_warnings
            .iter()
            .any(|w| w.contains("JWT secret is missing or short")));

        let missing = ConfigManager::load_from(&root.join("absent.yaml")).unwrap();
        assert!(missing.startup_warnings[0].contains("not found, using built-in defaults"));

        std::fs::remove_dir_all(&root).unwrap();
    }
}
