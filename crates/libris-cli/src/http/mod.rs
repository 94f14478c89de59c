//! HTTP surface
//!
//! `GET /books`, `POST /books` and `GET /health` over a shared connection
//! pool. Engine calls are blocking, so every handler runs its work on the
//! blocking thread pool with one pooled connection.

pub mod error;
pub mod routes;

use libris_core::ids::IdGenerator;
use libris_engine::EngineOptions;
use libris_store::CatalogPool;
use std::sync::Arc;

pub use error::ApiError;
pub use routes::router;

/// Request body limit for `POST /books`
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<CatalogPool>,
    pub options: EngineOptions,
    pub ids: Arc<dyn IdGenerator>,
}
