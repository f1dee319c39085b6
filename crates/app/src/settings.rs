//! Handles settings for the application. Configuration is read from an
//! optional TOML file (`settings.toml` unless `--config` says otherwise) and
//! `EXPENSES__*` environment variables. Without a `[database]` section the
//! expenses are kept in `./expenses.db`.
//!
//! ```toml
//! max_connections = 4
//!
//! [app]
//! level = "debug"
//!
//! [database]
//! kind = "sqlite"
//! path = "./expenses.db"
//! ```
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use engine::ContextOptions;
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Deserialize, PartialEq, Eq)]
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

const DEFAULT_DATABASE_PATH: &str = "expenses.db";

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite { path: String },
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite {
            path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub max_connections: Option<u32>,
    pub sqlx_logging: bool,
}

impl Settings {
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(false))
            .add_source(Environment::with_prefix("EXPENSES").separator("__"));
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    /// Connection parameters for the expenses context.
    ///
    /// An in-memory database lives inside a single connection, so the pool
    /// is pinned to one.
    pub fn context_options(&self) -> ContextOptions {
        let options = match &self.database {
            Database::Memory => ContextOptions::new("sqlite::memory:").max_connections(1),
            Database::Sqlite { path } => {
                let options = ContextOptions::new(format!("sqlite:{path}?mode=rwc"));
                match self.max_connections {
                    Some(max) => options.max_connections(max),
                    None => options,
                }
            }
        };
        options.sqlx_logging(self.sqlx_logging)
    }
}
