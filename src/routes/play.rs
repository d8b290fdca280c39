use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use uuid::Uuid;

use crate::{
    dto::play::{
        ParticipationCounts, PlayerPresenceRequest, PlayerSubmissionStatus, SubmitAnswerRequest,
        SubmitAnswerResponse, SubmitScavengerRequest, SubmitScavengerResponse,
    },
    error::AppError,
    services::{presence_service, submission_service},
    state::SharedState,
};

/// Routes players hit during gameplay.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{code}/answers", post(submit_answer))
        .route("/rooms/{code}/scavenger", post(submit_scavenger))
        .route(
            "/rooms/{code}/questions/{round}/{number}/counts",
            get(participation_counts),
        )
        .route(
            "/rooms/{code}/questions/{round}/{number}/status/{player_id}",
            get(player_submission_status),
        )
        .route(
            "/rooms/{code}/players/{player_id}/presence",
            post(player_presence),
        )
}

/// Submit a trivia answer. Correctness is re-derived server-side and the
/// score credited atomically; a second answer for the same question is
/// rejected.
#[utoipa::path(
    post,
    path = "/rooms/{code}/answers",
    tag = "play",
    params(("code" = String, Path, description = "Join code of the room")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = SubmitAnswerResponse),
        (status = 409, description = "Already answered this question")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    Ok(Json(
        submission_service::submit_answer(&state, &code, payload).await?,
    ))
}

/// Submit scavenger proof; the arrival order is assigned atomically and the
/// entry stays pending until the host reviews it.
#[utoipa::path(
    post,
    path = "/rooms/{code}/scavenger",
    tag = "play",
    params(("code" = String, Path, description = "Join code of the room")),
    request_body = SubmitScavengerRequest,
    responses(
        (status = 200, description = "Submission recorded", body = SubmitScavengerResponse),
        (status = 409, description = "Already submitted for this challenge")
    )
)]
pub async fn submit_scavenger(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<SubmitScavengerRequest>,
) -> Result<Json<SubmitScavengerResponse>, AppError> {
    Ok(Json(
        submission_service::submit_scavenger(&state, &code, payload).await?,
    ))
}

/// Aggregate answered/submitted counts for a question, compared against the
/// connected-player count by auto-advance decisions.
#[utoipa::path(
    get,
    path = "/rooms/{code}/questions/{round}/{number}/counts",
    tag = "play",
    params(
        ("code" = String, Path, description = "Join code of the room"),
        ("round" = u32, Path, description = "1-based round number"),
        ("number" = u32, Path, description = "1-based question number")
    ),
    responses((status = 200, description = "Participation counts", body = ParticipationCounts))
)]
pub async fn participation_counts(
    State(state): State<SharedState>,
    Path((code, round, number)): Path<(String, u32, u32)>,
) -> Result<Json<ParticipationCounts>, AppError> {
    Ok(Json(
        submission_service::participation_counts(&state, &code, round, number).await?,
    ))
}

/// What one player already submitted for a question; lets a reconnecting
/// client restore its local per-phase flags.
#[utoipa::path(
    get,
    path = "/rooms/{code}/questions/{round}/{number}/status/{player_id}",
    tag = "play",
    params(
        ("code" = String, Path, description = "Join code of the room"),
        ("round" = u32, Path, description = "1-based round number"),
        ("number" = u32, Path, description = "1-based question number"),
        ("player_id" = Uuid, Path, description = "Player to check")
    ),
    responses((status = 200, description = "Submission status", body = PlayerSubmissionStatus))
)]
pub async fn player_submission_status(
    State(state): State<SharedState>,
    Path((code, round, number, player_id)): Path<(String, u32, u32, Uuid)>,
) -> Result<Json<PlayerSubmissionStatus>, AppError> {
    Ok(Json(
        submission_service::player_submission_status(&state, &code, round, number, player_id)
            .await?,
    ))
}

/// Player heartbeat, or an explicit disconnect when the session closes.
#[utoipa::path(
    post,
    path = "/rooms/{code}/players/{player_id}/presence",
    tag = "play",
    params(
        ("code" = String, Path, description = "Join code of the room"),
        ("player_id" = Uuid, Path, description = "Player reporting in")
    ),
    request_body = PlayerPresenceRequest,
    responses((status = 204, description = "Presence recorded"))
)]
pub async fn player_presence(
    State(state): State<SharedState>,
    Path((code, player_id)): Path<(String, Uuid)>,
    Json(payload): Json<PlayerPresenceRequest>,
) -> Result<axum::http::StatusCode, AppError> {
    presence_service::player_presence(&state, &code, player_id, payload.connected).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
