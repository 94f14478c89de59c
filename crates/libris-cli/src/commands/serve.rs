//! HTTP server command
//!
//! Usage: libris serve [--port <PORT>] [--fill] [--config <PATH>]

use clap::Args;
use libris_core::errors::LbError;
use libris_core::ids::RandomIds;
use libris_engine::{apply_engine_command, EngineCommand, EngineOptions};
use libris_store::migrations::apply_migrations;
use libris_store::seed::SeedPlan;
use libris_store::{connect, CatalogPool};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use super::startup;
use crate::http::{router, AppState};

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides server.port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Insert generated sample data before serving
    #[arg(long)]
    pub fill: bool,

    /// Configuration file (defaults to ./libris.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute serve command
pub fn execute(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = startup(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.server.fill |= args.fill;

    let pool = connect(&config.database)?;
    let options = config.engine_options();
    prepare(&pool, &options, config.server.fill)?;

    let state = AppState {
        pool: Arc::new(pool),
        options,
        ids: Arc::new(RandomIds),
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(
            component = module_path!(),
            op = "serve",
            addr = %addr,
            dialect = config.database.dialect.tag(),
            "listening"
        );
        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await
    })?;
    Ok(())
}

/// Bring the schema up to date and optionally fill the catalog
fn prepare(pool: &CatalogPool, options: &EngineOptions, fill: bool) -> Result<(), LbError> {
    pool.with(|exec| {
        apply_migrations(exec.as_mut())?;
        if fill {
            apply_engine_command(
                EngineCommand::FillCatalog(SeedPlan::default()),
                exec.as_mut(),
                &RandomIds,
                options,
            )?;
        }
        Ok(())
    })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!(component = module_path!(), op = "serve", "shutting down");
    }
}
