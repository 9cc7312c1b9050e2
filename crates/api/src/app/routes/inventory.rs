use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use despensa_core::ItemId;
use despensa_infra::ItemQuery;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Upper bound on page sizes requested by clients.
const MAX_PAGE_SIZE: usize = 100;

pub fn router() -> Router {
    Router::new()
        .route("/sections", get(list_sections))
        .route("/items", get(list_items))
        .route("/items/:id/history", get(item_history))
}

pub async fn list_sections(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.sections().await {
        Ok(sections) => Json(serde_json::json!({
            "sections": sections.into_iter().map(dto::SectionResponse::from).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListItemsParams>,
) -> axum::response::Response {
    let offset = params.offset.unwrap_or(0);
    let limit = params.limit.unwrap_or(services.items_per_page).clamp(1, MAX_PAGE_SIZE);

    let sections = match services.sections().await {
        Ok(s) => s,
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut query = ItemQuery::page(offset, limit + 1);
    if let Some(section_id) = params.section_id {
        if !sections.iter().any(|s| s.id == section_id) {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "section not found");
        }
        query = query.in_section(section_id);
    }

    let mut items = match services.store.list_items(query).await {
        Ok(items) => items,
        Err(e) => return errors::store_error_to_response(e),
    };

    let next_offset = (items.len() > limit).then_some(offset.saturating_add(limit));
    items.truncate(limit);

    let by_id: HashMap<_, _> = sections.iter().map(|s| (s.id, s)).collect();
    let items = items
        .into_iter()
        .map(|item| dto::ItemResponse::new(item, &by_id))
        .collect();

    Json(dto::ItemsPage { items, next_offset }).into_response()
}

pub async fn item_history(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<dto::HistoryParams>,
) -> axum::response::Response {
    let item_id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id");
        }
    };

    match services.store.item(item_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "item not found"),
        Err(e) => return errors::store_error_to_response(e),
    }

    let limit = params
        .limit
        .unwrap_or(services.history_records_per_item)
        .clamp(1, MAX_PAGE_SIZE);

    match services.store.item_history(item_id, limit).await {
        Ok(history) => Json(serde_json::json!({
            "item_id": item_id,
            "history": history.into_iter().map(dto::HistoryEntry::from).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
