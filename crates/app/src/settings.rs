//! Runtime settings, read from `settings.toml` and `FINBOARD__*` environment
//! variables. Environment values win over the file.
//!
//! ```toml
//! [app]
//! level = "info"
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 3000
//! database = { sqlite = "finboard.db" }
//!
//! [auth]
//! jwt_secret = "change-me"
//! token_ttl_minutes = 60
//!
//! [ocr]
//! api_key = "..."
//! ```
use std::time::Duration;

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Parser)]
#[command(name = "finboard", version)]
struct Args {
    /// Settings file path, without or with the `.toml` extension.
    #[arg(long, env = "FINBOARD_CONFIG")]
    config: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
    Postgres(String),
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Self::Memory => "sqlite::memory:".to_string(),
            Self::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
            Self::Postgres(url) => url.clone(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_database() -> Database {
    Database::Memory
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database")]
    pub database: Database,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: None,
            port: default_port(),
            database: default_database(),
        }
    }
}

fn default_ttl() -> i64 {
    60
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub jwt_secret: String,
    #[serde(default = "default_ttl")]
    pub token_ttl_minutes: i64,
    /// bcrypt cost; the engine default applies when unset.
    pub password_cost: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Ocr {
    pub api_key: String,
    pub model_id: Option<String>,
    pub base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub max_polls: Option<u32>,
}

impl Ocr {
    pub fn mindee_config(&self) -> receipts::MindeeConfig {
        let mut config = receipts::MindeeConfig::new(&self.api_key);
        if let Some(model_id) = &self.model_id {
            config.model_id = model_id.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(max_polls) = self.max_polls {
            config.max_polls = max_polls;
        }
        config
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub server: Server,
    pub auth: Auth,
    pub ocr: Option<Ocr>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();
        let path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        let config = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("FINBOARD")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        if settings.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }
        Ok(settings)
    }

    pub fn address(&self) -> String {
        let bind = self.server.bind.as_deref().unwrap_or("127.0.0.1");
        format!("{bind}:{}", self.server.port)
    }
}
