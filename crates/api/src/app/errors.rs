use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use despensa_infra::{BatchError, ProcessError, StoreError};

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Storage(msg) => storage_error(msg),
    }
}

pub fn batch_error_to_response(err: BatchError) -> axum::response::Response {
    match err {
        BatchError::Storage(msg) => storage_error(msg),
    }
}

pub fn process_error_to_response(err: ProcessError) -> axum::response::Response {
    match err {
        ProcessError::Model(e) => json_error(StatusCode::BAD_GATEWAY, "model_error", e.to_string()),
        ProcessError::Batch(e) => batch_error_to_response(e),
    }
}

fn storage_error(msg: String) -> axum::response::Response {
    tracing::error!(error = %msg, "storage failure");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
