//! Application configuration
//!
//! Layered, lowest precedence first: built-in defaults, an optional TOML
//! file (`libris.toml`, or the path in `LIBRIS_CONFIG_PATH`), then
//! `LIBRIS__SECTION__KEY` environment variables. Command-line flags are
//! applied on top by the individual commands.

#![allow(clippy::result_large_err)]

use config::{Config, Environment, File};
use libris_core::errors::{LbError, LbErrorKind};
use libris_core::logging_facility::Profile;
use libris_engine::{AuthorResolution, EngineOptions, ReadStrategy};
use libris_store::DatabaseSettings;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_PATH_ENV: &str = "LIBRIS_CONFIG_PATH";
const DEFAULT_CONFIG_FILE: &str = "libris.toml";
const ENV_PREFIX: &str = "LIBRIS";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub write: WriteConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Insert generated sample data at startup
    #[serde(default)]
    pub fill: bool,
}

const fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            fill: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub read_strategy: ReadStrategy,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WriteConfig {
    /// Forces (or forbids) single-statement author upserts
    #[serde(default)]
    pub upsert_returning: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_profile")]
    pub profile: Profile,
}

fn default_profile() -> Profile {
    Profile::Development
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `file` (or the default locations) and the
    /// process environment.
    ///
    /// # Errors
    /// `Configuration` when a source cannot be read, a value does not parse,
    /// or the result fails validation.
    pub fn load(file: Option<&Path>) -> Result<Self, LbError> {
        let file = file
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        Self::from_sources(file, environment())
    }

    fn from_sources(file: Option<PathBuf>, environment: Environment) -> Result<Self, LbError> {
        let mut builder = Config::builder();
        builder = match file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false)),
        };

        let mut config: AppConfig = builder
            .add_source(environment)
            .build()
            .and_then(Config::try_deserialize::<AppConfig>)
            .map_err(|e| {
                LbError::new(LbErrorKind::Configuration)
                    .with_op("load_config")
                    .with_message(e.to_string())
            })?;

        if config.write.upsert_returning.is_some() {
            config.database.upsert_returning = config.write.upsert_returning;
        }
        config.database.validate()?;
        Ok(config)
    }

    /// Strategy choices handed to the engine
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            read_strategy: self.query.read_strategy,
            author_resolution: AuthorResolution::from_capability(
                self.database.upsert_returning(),
            ),
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
