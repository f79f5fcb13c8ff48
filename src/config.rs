use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Emit logs as JSON instead of the human-readable format.
    pub log_json: bool,

    /// sqlite or postgres connection string.
    pub database_url: String,

    pub max_connections: u32,

    /// 0 = use the tokio default (one worker per core).
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            database_url: "sqlite:data/lacquer.db".to_string(),
            max_connections: 5,
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    /// Origins allowed by CORS. Empty disables cross-origin access.
    pub cors_allowed_origins: Vec<String>,

    /// Where OAuth callbacks redirect the browser after issuing a token.
    pub frontend_url: String,

    /// Externally visible base URL of this service, used to build OAuth
    /// redirect URIs.
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            frontend_url: "http://localhost:3000".to_string(),
            public_url: "http://localhost:3001".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Allows `POST /api/auth/dev-login` and lets requests through the
    /// auth middleware as the sentinel dev user. Never enable this on
    /// anything reachable from the internet.
    pub dev_mode: bool,

    pub jwt_secret: String,

    pub jwt_expiry_hours: i64,

    pub google: Option<OAuthProviderConfig>,

    pub github: Option<OAuthProviderConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            jwt_secret: "change-me".to_string(),
            jwt_expiry_hours: 7 * 24,
            google: None,
            github: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OAuthProviderConfig {
    pub client_id: String,

    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Filesystem root for stored images, served under `/uploads`.
    pub uploads_path: String,

    pub max_upload_bytes: usize,

    /// Max images accepted by a single nail-art batch upload.
    pub max_batch_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            uploads_path: "uploads".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            max_batch_size: 5,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = std::env::var("LACQUER_CONFIG")
            .map_or_else(|_| PathBuf::from("config.toml"), PathBuf::from);

        let mut config = if path.exists() {
            info!("Loading config from: {}", path.display());
            Self::load_from_path(&path)?
        } else {
            info!("No config file found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Secrets and deployment knobs come from the environment when set,
    /// so the TOML file never has to hold credentials.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.general.database_url = v;
        }
        if let Ok(v) = std::env::var("PORT")
            && let Ok(port) = v.parse()
        {
            self.server.port = port;
        }
        if let Ok(v) = std::env::var("FRONTEND_URL") {
            self.server.frontend_url = v;
        }
        if let Ok(v) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Ok(v) = std::env::var("DEV_MODE") {
            self.auth.dev_mode = v == "true" || v == "1";
        }
        if let (Ok(id), Ok(secret)) = (
            std::env::var("GOOGLE_CLIENT_ID"),
            std::env::var("GOOGLE_CLIENT_SECRET"),
        ) {
            self.auth.google = Some(OAuthProviderConfig {
                client_id: id,
                client_secret: secret,
            });
        }
        if let (Ok(id), Ok(secret)) = (
            std::env::var("GITHUB_CLIENT_ID"),
            std::env::var("GITHUB_CLIENT_SECRET"),
        ) {
            self.auth.github = Some(OAuthProviderConfig {
                client_id: id,
                client_secret: secret,
            });
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret cannot be empty");
        }

        if !self.auth.dev_mode && self.auth.jwt_secret == "change-me" {
            anyhow::bail!("JWT secret must be changed outside of dev mode");
        }

        if self.auth.jwt_expiry_hours <= 0 {
            anyhow::bail!("JWT expiry must be positive");
        }

        url::Url::parse(&self.server.frontend_url).context("Invalid frontend URL")?;
        url::Url::parse(&self.server.public_url).context("Invalid public URL")?;

        if self.uploads.max_upload_bytes == 0 {
            anyhow::bail!("Upload size limit must be > 0");
        }

        if self.uploads.max_batch_size == 0 {
            anyhow::bail!("Upload batch size must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.auth.jwt_expiry_hours, 168);
        assert!(!config.auth.dev_mode);
        assert_eq!(config.uploads.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.auth.google.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[auth]"));
        assert!(toml_str.contains("[uploads]"));
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let path = std::env::temp_dir()
            .join(format!("lacquer-config-{}", std::process::id()))
            .join("config.toml");

        let mut config = Config::default();
        config.general.log_level = "trace".to_string();
        config.server.port = 4242;
        config.save_to_path(&path).unwrap();

        let reloaded = Config::load_from_path(&path).unwrap();
        assert_eq!(reloaded.general.log_level, "trace");
        assert_eq!(reloaded.server.port, 4242);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [auth]
            dev_mode = true

            [auth.github]
            client_id = "abc"
            client_secret = "def"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert!(config.auth.dev_mode);
        assert_eq!(config.auth.github.unwrap().client_id, "abc");

        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_validate_rejects_default_secret() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let mut dev = Config::default();
        dev.auth.dev_mode = true;
        assert!(dev.validate().is_ok());

        let mut prod = Config::default();
        prod.auth.jwt_secret = "an-actual-secret".to_string();
        assert!(prod.validate().is_ok());
    }
}
