//! # configs
//!
//! Layered application settings:
//! 1. built-in defaults (the `Default` impls below)
//! 2. `config/default.toml` (optional)
//! 3. `config/{APP_ENV}.toml` (optional)
//! 4. `BLOG__SECTION__KEY` environment variables
//!
//! `.env` is loaded first so local development can keep secrets out of the
//! TOML files.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, Map};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "BLOG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub media: MediaSettings,
    pub auth: AuthSettings,
    pub slug: SlugSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub backend: Backend,
    pub url: SecretString,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            url: SecretString::from(String::new()),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    pub covers_dir: PathBuf,
    /// Where multipart uploads are parked until the cover pipeline is done
    pub uploads_dir: PathBuf,
    /// URL prefix cover filenames are served under
    pub public_url: String,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
    pub quality: f32,
    pub max_upload_bytes: usize,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            covers_dir: PathBuf::from("public/images/covers"),
            uploads_dir: PathBuf::from("tmp/uploads"),
            public_url: "/images/covers".to_string(),
            min_width: 600,
            max_width: 1200,
            min_height: 400,
            max_height: 1200,
            quality: 85.0,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    pub token_ttl_hours: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::from(String::new()),
            token_ttl_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlugSettings {
    pub max_attempts: u32,
}

impl Default for SlugSettings {
    fn default() -> Self {
        Self { max_attempts: 100 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub json: bool,
    /// `EnvFilter` directives, overridden by `RUST_LOG` when set
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            json: false,
            filter: "info,sqlx=warn".to_string(),
        }
    }
}

impl Settings {
    /// Loads `.env`, then layers `./config` files for `APP_ENV` (default
    /// `development`) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(ConfigError::Invalid(format!(".env: {err}")));
            }
        }
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        Self::load_from(Path::new("config"), &app_env, None)
    }

    /// `env_overrides` replaces the process environment as the variable
    /// source when given.
    pub fn load_from(
        config_dir: &Path,
        app_env: &str,
        env_overrides: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let environment = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("server.cors_origins")
            .source(env_overrides);

        let settings: Settings = Config::builder()
            .add_source(File::from(config_dir.join("default")).required(false))
            .add_source(File::from(config_dir.join(app_env)).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        tracing::debug!(app_env, backend = ?settings.database.backend, "configuration loaded");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        let media = &self.media;

        if self.server.port == 0 {
            return invalid("server.port must be non-zero");
        }
        if media.min_width == 0 || media.min_height == 0 {
            return invalid("media minimum dimensions must be non-zero");
        }
        if media.min_width > media.max_width {
            return invalid("media.min_width exceeds media.max_width");
        }
        if media.min_height > media.max_height {
            return invalid("media.min_height exceeds media.max_height");
        }
        if !(media.quality > 0.0 && media.quality <= 100.0) {
            return invalid("media.quality must be in (0, 100]");
        }
        if media.max_upload_bytes == 0 {
            return invalid("media.max_upload_bytes must be non-zero");
        }
        if self.auth.jwt_secret.expose_secret().is_empty() {
            return invalid("auth.jwt_secret is required");
        }
        if self.auth.token_ttl_hours <= 0 {
            return invalid("auth.token_ttl_hours must be positive");
        }
        if self.slug.max_attempts == 0 {
            return invalid("slug.max_attempts must be at least 1");
        }
        if self.database.backend == Backend::Postgres
            && self.database.url.expose_secret().is_empty()
        {
            return invalid("database.url is required for the postgres backend");
        }
        Ok(())
    }
}
