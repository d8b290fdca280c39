use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::host::{
        PingResponse, ReviewScavengerRequest, ReviewScavengerResponse, ScavengerListResponse,
        TransitionResponse,
    },
    error::AppError,
    services::{game_service, presence_service, submission_service},
    state::SharedState,
};

/// Header carrying the room's capability secret on host routes.
pub const HOST_KEY_HEADER: &str = "x-host-key";

/// Host-privileged endpoints driving the game.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{code}/host/start", post(start_game))
        .route("/rooms/{code}/host/advance", post(advance))
        .route("/rooms/{code}/host/restart", post(restart))
        .route("/rooms/{code}/host/ping", post(ping))
        .route(
            "/rooms/{code}/host/scavenger/{submission_id}/review",
            post(review_scavenger),
        )
        .route(
            "/rooms/{code}/host/scavenger/{round}/{number}",
            get(list_scavengers),
        )
}

/// Read the host key header, if present.
pub fn optional_host_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(HOST_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn require_host_key(headers: &HeaderMap) -> Result<String, AppError> {
    optional_host_key(headers)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {HOST_KEY_HEADER} header")))
}

/// Start the game from the lobby: clears previous progress and opens the
/// first trivia question behind the countdown offset.
#[utoipa::path(
    post,
    path = "/rooms/{code}/host/start",
    tag = "host",
    params(
        ("code" = String, Path, description = "Join code of the room"),
        ("x-host-key" = String, Header, description = "Host key of the room")
    ),
    responses(
        (status = 200, description = "Game started", body = TransitionResponse),
        (status = 403, description = "Host key mismatch"),
        (status = 409, description = "Not in the lobby, or no connected players")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<TransitionResponse>, AppError> {
    let host_key = require_host_key(&headers)?;
    Ok(Json(
        game_service::start_game(&state, &code, &host_key).await?,
    ))
}

/// Advance to the next phase. The same operation the auto-advance
/// coordinator issues; a transition that raced another writer returns 409.
#[utoipa::path(
    post,
    path = "/rooms/{code}/host/advance",
    tag = "host",
    params(
        ("code" = String, Path, description = "Join code of the room"),
        ("x-host-key" = String, Header, description = "Host key of the room")
    ),
    responses(
        (status = 200, description = "Phase advanced", body = TransitionResponse),
        (status = 403, description = "Host key mismatch"),
        (status = 409, description = "No valid transition from the current phase")
    )
)]
pub async fn advance(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<TransitionResponse>, AppError> {
    let host_key = require_host_key(&headers)?;
    Ok(Json(game_service::advance(&state, &code, &host_key).await?))
}

/// Reset a finished game back to the lobby.
#[utoipa::path(
    post,
    path = "/rooms/{code}/host/restart",
    tag = "host",
    params(
        ("code" = String, Path, description = "Join code of the room"),
        ("x-host-key" = String, Header, description = "Host key of the room")
    ),
    responses(
        (status = 200, description = "Back in the lobby", body = TransitionResponse),
        (status = 403, description = "Host key mismatch")
    )
)]
pub async fn restart(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<TransitionResponse>, AppError> {
    let host_key = require_host_key(&headers)?;
    Ok(Json(game_service::restart(&state, &code, &host_key).await?))
}

/// Host liveness ping; players treat prolonged silence as a disconnect.
#[utoipa::path(
    post,
    path = "/rooms/{code}/host/ping",
    tag = "host",
    params(
        ("code" = String, Path, description = "Join code of the room"),
        ("x-host-key" = String, Header, description = "Host key of the room")
    ),
    responses((status = 200, description = "Ping recorded", body = PingResponse))
)]
pub async fn ping(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PingResponse>, AppError> {
    let host_key = require_host_key(&headers)?;
    presence_service::host_ping(&state, &code, &host_key).await?;
    Ok(Json(PingResponse { success: true }))
}

/// Approve or reject a scavenger submission. First approval of a question
/// earns the first-approved award regardless of arrival order.
#[utoipa::path(
    post,
    path = "/rooms/{code}/host/scavenger/{submission_id}/review",
    tag = "host",
    params(
        ("code" = String, Path, description = "Join code of the room"),
        ("submission_id" = Uuid, Path, description = "Submission to review"),
        ("x-host-key" = String, Header, description = "Host key of the room")
    ),
    request_body = ReviewScavengerRequest,
    responses(
        (status = 200, description = "Verdict applied", body = ReviewScavengerResponse),
        (status = 403, description = "Host key mismatch"),
        (status = 409, description = "Already reviewed")
    )
)]
pub async fn review_scavenger(
    State(state): State<SharedState>,
    Path((code, submission_id)): Path<(String, Uuid)>,
    headers: HeaderMap,
    Json(payload): Json<ReviewScavengerRequest>,
) -> Result<Json<ReviewScavengerResponse>, AppError> {
    let host_key = require_host_key(&headers)?;
    Ok(Json(
        submission_service::review_scavenger(
            &state,
            &code,
            &host_key,
            submission_id,
            payload.approved,
        )
        .await?,
    ))
}

/// Scavenger submissions of a question in arrival order, for the host's
/// review list.
#[utoipa::path(
    get,
    path = "/rooms/{code}/host/scavenger/{round}/{number}",
    tag = "host",
    params(
        ("code" = String, Path, description = "Join code of the room"),
        ("round" = u32, Path, description = "1-based round number"),
        ("number" = u32, Path, description = "1-based question number"),
        ("x-host-key" = String, Header, description = "Host key of the room")
    ),
    responses((status = 200, description = "Submissions", body = ScavengerListResponse))
)]
pub async fn list_scavengers(
    State(state): State<SharedState>,
    Path((code, round, number)): Path<(String, u32, u32)>,
    headers: HeaderMap,
) -> Result<Json<ScavengerListResponse>, AppError> {
    let host_key = require_host_key(&headers)?;
    Ok(Json(
        submission_service::list_scavengers(&state, &code, &host_key, round, number).await?,
    ))
}
