use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/text", post(process_text))
        .route("/commands", post(process_commands))
}

/// Dictated text → model → inventory changes.
pub async fn process_text(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ProcessTextRequest>,
) -> axum::response::Response {
    if body.text.trim().is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "text cannot be empty",
        );
    }

    match services.process_text(&body.text).await {
        Ok(report) => Json(dto::ProcessResponse::from(report)).into_response(),
        Err(e) => errors::process_error_to_response(e),
    }
}

/// Raw model output → inventory changes, without calling the model.
pub async fn process_commands(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ProcessCommandsRequest>,
) -> axum::response::Response {
    match services.execute_raw(&body.raw).await {
        Ok(report) => Json(dto::ProcessResponse::from(report)).into_response(),
        Err(e) => errors::batch_error_to_response(e),
    }
}
