use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::{
        common::{LeaderboardEntry, RoomSnapshot},
        room::{
            CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, JoinRoomResponse, QuestionView,
        },
    },
    error::AppError,
    routes::host::optional_host_key,
    services::room_service,
    state::SharedState,
};

/// Routes handling room creation, joining, and read-only lookups.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{code}/join", post(join_room))
        .route("/rooms/{code}", get(get_room))
        .route(
            "/rooms/{code}/questions/{round}/{number}",
            get(get_question),
        )
        .route("/rooms/{code}/leaderboard", get(get_leaderboard))
}

/// Create a fresh room and return its snapshot plus the host key.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "room",
    request_body = CreateRoomRequest,
    responses((status = 200, description = "Room created", body = CreateRoomResponse))
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, AppError> {
    payload.validate()?;
    Ok(Json(room_service::create_room(&state, payload).await?))
}

/// Join (or rejoin) a room as a player.
#[utoipa::path(
    post,
    path = "/rooms/{code}/join",
    tag = "room",
    params(("code" = String, Path, description = "Join code of the room")),
    request_body = JoinRoomRequest,
    responses((status = 200, description = "Joined", body = JoinRoomResponse))
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, AppError> {
    payload.validate()?;
    Ok(Json(room_service::join_room(&state, &code, payload).await?))
}

/// Fetch the room snapshot: the polling fallback for the SSE feed.
#[utoipa::path(
    get,
    path = "/rooms/{code}",
    tag = "room",
    params(("code" = String, Path, description = "Join code of the room")),
    responses((status = 200, description = "Room snapshot", body = RoomSnapshot))
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, AppError> {
    Ok(Json(room_service::get_room(&state, &code).await?))
}

/// Fetch a question by position. With a valid `x-host-key` header the
/// correct choice is included; players only see it after the reveal.
#[utoipa::path(
    get,
    path = "/rooms/{code}/questions/{round}/{number}",
    tag = "room",
    params(
        ("code" = String, Path, description = "Join code of the room"),
        ("round" = u32, Path, description = "1-based round number"),
        ("number" = u32, Path, description = "1-based question number"),
        ("x-host-key" = Option<String>, Header, description = "Host key; reveals the correct choice")
    ),
    responses((status = 200, description = "The question", body = QuestionView))
)]
pub async fn get_question(
    State(state): State<SharedState>,
    Path((code, round, number)): Path<(String, u32, u32)>,
    headers: HeaderMap,
) -> Result<Json<QuestionView>, AppError> {
    let host_key = optional_host_key(&headers);
    Ok(Json(
        room_service::get_question(&state, &code, round, number, host_key.as_deref()).await?,
    ))
}

/// Current standings, ranked by points.
#[utoipa::path(
    get,
    path = "/rooms/{code}/leaderboard",
    tag = "room",
    params(("code" = String, Path, description = "Join code of the room")),
    responses((status = 200, description = "Standings", body = [LeaderboardEntry]))
)]
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    Ok(Json(room_service::get_leaderboard(&state, &code).await?))
}
