use axum::Router;

pub mod inventory;
pub mod process;
pub mod system;

/// Router for the inventory and voice-processing endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/inventory", inventory::router())
        .nest("/process", process::router())
}
