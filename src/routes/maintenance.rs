use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::host::CleanupResponse, error::AppError, services::room_service, state::SharedState,
};

/// Operational endpoints, typically driven by an external scheduler.
pub fn router() -> Router<SharedState> {
    Router::new().route("/maintenance/cleanup", post(cleanup))
}

/// Sweep rooms past their retention window, along with their players,
/// questions, and ledgers.
#[utoipa::path(
    post,
    path = "/maintenance/cleanup",
    tag = "maintenance",
    responses((status = 200, description = "Sweep finished", body = CleanupResponse))
)]
pub async fn cleanup(State(state): State<SharedState>) -> Result<Json<CleanupResponse>, AppError> {
    let deleted_rooms = room_service::cleanup_expired(&state).await?;
    Ok(Json(CleanupResponse { deleted_rooms }))
}
