//! CLI command implementations

pub mod migrate;
pub mod seed;
pub mod serve;

use crate::config::AppConfig;
use libris_core::errors::LbError;
use libris_core::logging_facility;
use libris_store::migrations::apply_migrations;
use libris_store::{open_executor, Executor};
use std::path::Path;

/// Load configuration and start logging
fn startup(config_path: Option<&Path>) -> Result<AppConfig, LbError> {
    let config = AppConfig::load(config_path)?;
    logging_facility::init(config.logging.profile);
    Ok(config)
}

/// One migrated connection, for commands that do not serve requests
fn migrated_executor(config: &AppConfig) -> Result<Box<dyn Executor + Send>, LbError> {
    let mut exec = open_executor(&config.database)?;
    apply_migrations(exec.as_mut())?;
    Ok(exec)
}
