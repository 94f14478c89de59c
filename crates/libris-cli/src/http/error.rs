//! Error responses
//!
//! Validation failures are the caller's to fix and are echoed back with the
//! offending field. Everything else is logged in full and reported as an
//! opaque internal error.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use libris_core::errors::LbError;
use libris_core_types::correlation::REQUEST_ID_HEADER;
use serde::Serialize;

#[derive(Debug)]
pub struct ApiError(pub LbError);

impl From<LbError> for ApiError {
    fn from(err: LbError) -> Self {
        ApiError(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<&'a str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let request_id = err.request_id().map(|id| id.as_str());

        let (status, body) = if err.kind().is_client_error() {
            let body = ErrorBody {
                error: err.message(),
                field: err.field(),
                request_id,
            };
            (StatusCode::BAD_REQUEST, body)
        } else {
            tracing::error!(
                component = module_path!(),
                err.code = err.code(),
                request_id = request_id.unwrap_or_default(),
                error = %err,
                "request failed"
            );
            let body = ErrorBody {
                error: "internal error",
                field: None,
                request_id,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, body)
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(value) = request_id.and_then(|id| HeaderValue::from_str(id).ok()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
}
