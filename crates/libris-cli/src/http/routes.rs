//! Route table and handlers

#![allow(clippy::result_large_err)]

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use libris_core::errors::{LbError, LbErrorKind};
use libris_core::ids::IdGenerator;
use libris_core::model::{BookPage, BookQueryParams, CreatedBook, NewBookRequest};
use libris_core_types::correlation::REQUEST_ID_HEADER;
use libris_core_types::RequestId;
use libris_engine::{
    apply_engine_command, apply_engine_query, EngineCommand, EngineCommandResult, EngineOptions,
    EngineQuery, EngineQueryResult,
};
use libris_store::{Cancellation, Executor};
use serde::Serialize;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::{ApiError, AppState, MAX_BODY_BYTES};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    applied_migrations: Vec<String>,
}

fn request_id(headers: &HeaderMap) -> RequestId {
    RequestId::from_header(
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok()),
    )
}

fn rejected(op: &str, field: &str, message: String) -> LbError {
    LbError::new(LbErrorKind::Validation)
        .with_op(op)
        .with_field(field)
        .with_message(message)
}

fn unexpected_result(op: &str) -> LbError {
    LbError::new(LbErrorKind::Internal)
        .with_op(op)
        .with_message("engine returned an unexpected result")
}

/// Fires the request's cancellation unless disarmed
///
/// A handler future dropped mid-request (client gone) drops this guard,
/// which stops the blocking work and rolls back any open transaction.
struct CancelOnDrop(Option<Cancellation>);

impl CancelOnDrop {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(token) = self.0.take() {
            token.cancel();
        }
    }
}

/// Run engine work on the blocking pool with one pooled connection
async fn run_blocking<T, F>(state: &AppState, request_id: RequestId, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut dyn Executor, &EngineOptions, &dyn IdGenerator) -> Result<T, LbError>
        + Send
        + 'static,
{
    let token = Cancellation::new();
    let guard = CancelOnDrop(Some(token.clone()));
    let state = state.clone();
    let joined = tokio::task::spawn_blocking(move || {
        state.pool.with(|exec| {
            exec.set_cancellation(Some(token));
            let result = f(exec.as_mut(), &state.options, state.ids.as_ref());
            exec.set_cancellation(None);
            result
        })
    })
    .await;
    guard.disarm();

    match joined {
        Ok(result) => result.map_err(|e| ApiError(e.with_request_id(request_id))),
        Err(join_err) => Err(ApiError(
            LbError::new(LbErrorKind::Internal)
                .with_op("run_blocking")
                .with_message(join_err.to_string())
                .with_request_id(request_id),
        )),
    }
}

async fn list_books(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<BookQueryParams>, QueryRejection>,
) -> Result<Json<BookPage>, ApiError> {
    let request_id = request_id(&headers);
    let Query(params) = params.map_err(|rejection| {
        ApiError(
            rejected("list_books", "query", rejection.body_text())
                .with_request_id(request_id.clone()),
        )
    })?;

    let page = run_blocking(&state, request_id, move |exec, options, _ids| {
        match apply_engine_query(EngineQuery::ListBooks(params), exec, options)? {
            EngineQueryResult::Books(page) => Ok(page),
            _ => Err(unexpected_result("list_books")),
        }
    })
    .await?;
    Ok(Json(page))
}

async fn create_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<NewBookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedBook>), ApiError> {
    let request_id = request_id(&headers);
    let Json(request) = body.map_err(|rejection| {
        ApiError(
            rejected("create_book", "body", rejection.body_text())
                .with_request_id(request_id.clone()),
        )
    })?;

    let created = run_blocking(&state, request_id, move |exec, options, ids| {
        match apply_engine_command(EngineCommand::CreateBook(request), exec, ids, options)? {
            EngineCommandResult::BookCreated(created) => Ok(created),
            _ => Err(unexpected_result("create_book")),
        }
    })
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn health(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<HealthResponse>, ApiError> {
    let request_id = request_id(&headers);
    let applied_migrations = run_blocking(&state, request_id, |exec, options, _ids| {
        match apply_engine_query(EngineQuery::SchemaStatus, exec, options)? {
            EngineQueryResult::SchemaStatus { applied_migrations } => Ok(applied_migrations),
            _ => Err(unexpected_result("health")),
        }
    })
    .await?;

    Ok(Json(HealthResponse {
        status: "ok",
        applied_migrations,
    }))
}
