//! The submission/approval ledgers: trivia answers and scavenger proof.
//!
//! Correctness is always re-derived server-side from the question's choice
//! list, and scores only ever move through the store's atomic increment so
//! concurrent submissions from different players cannot lose updates.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, QuestionEntity, RoomEntity},
    dao::room_store::{LedgerInsert, NewScavenger},
    dto::{
        host::{ReviewScavengerResponse, ScavengerListResponse},
        play::{
            ParticipationCounts, PlayerSubmissionStatus, ScavengerSummary, SubmitAnswerRequest,
            SubmitAnswerResponse, SubmitScavengerRequest, SubmitScavengerResponse,
        },
    },
    error::ServiceError,
    scoring,
    services::{game_service, room_service, sse_events},
    state::SharedState,
};

/// Record a trivia answer: derive correctness, score it, append the ledger
/// row, and credit the player atomically.
pub async fn submit_answer(
    state: &SharedState,
    room_code: &str,
    request: SubmitAnswerRequest,
) -> Result<SubmitAnswerResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::find_room(state, room_code).await?;
    let question = require_question(state, &room, request.question_id).await?;
    require_player(state, &room, request.player_id).await?;

    let chosen = question
        .choices
        .iter()
        .find(|choice| choice.id == request.answer_choice_id)
        .ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "choice `{}` does not exist on this question",
                request.answer_choice_id
            ))
        })?;

    // Never trust client-asserted correctness.
    let is_correct = chosen.is_correct;
    let points = scoring::trivia_points(
        is_correct,
        room.settings.trivia_base_point,
        room.settings.time_per_trivia_question,
        request.answer_time_ms,
        room.settings.trivia_time_scaling,
    );

    let submission = crate::dao::models::SubmissionEntity {
        id: Uuid::new_v4(),
        room_id: room.id,
        player_id: request.player_id,
        question_id: question.id,
        answer_choice_id: request.answer_choice_id,
        answer_time_ms: request.answer_time_ms,
        is_correct,
        points_awarded: points,
        answered_at: SystemTime::now(),
    };

    let inserted = match store.insert_submission(submission).await? {
        LedgerInsert::Inserted(row) => row,
        LedgerInsert::Duplicate => {
            return Err(ServiceError::Conflict(
                "an answer for this question was already submitted".into(),
            ));
        }
    };

    let updated = store
        .increment_points(request.player_id, points)
        .await?
        .ok_or_else(|| ServiceError::NotFound("player vanished during scoring".into()))?;

    info!(
        room_code = %room.room_code,
        player = %updated.display_name,
        points,
        total = updated.points,
        "trivia answer recorded"
    );

    let answered_count = store.count_submissions(question.id).await?;
    sse_events::broadcast_answer_received(state, &room.room_code, question.id, answered_count);
    broadcast_snapshot(state, &room).await;

    Ok(SubmitAnswerResponse {
        submission_id: inserted.id,
        is_correct,
        points_awarded: points,
        total_points: updated.points,
    })
}

/// Record scavenger proof. The store assigns the arrival order; the row
/// stays pending (zero points) until the host reviews it.
pub async fn submit_scavenger(
    state: &SharedState,
    room_code: &str,
    request: SubmitScavengerRequest,
) -> Result<SubmitScavengerResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::find_room(state, room_code).await?;
    let question = require_question(state, &room, request.question_id).await?;
    let player = require_player(state, &room, request.player_id).await?;

    let inserted = match store
        .insert_scavenger(NewScavenger {
            room_id: room.id,
            player_id: request.player_id,
            question_id: question.id,
            submitted_at: SystemTime::now(),
        })
        .await?
    {
        LedgerInsert::Inserted(row) => row,
        LedgerInsert::Duplicate => {
            return Err(ServiceError::Conflict(
                "already submitted for this challenge".into(),
            ));
        }
    };

    info!(
        room_code = %room.room_code,
        player = %player.display_name,
        order = inserted.submission_order,
        "scavenger submission recorded"
    );

    let summary = ScavengerSummary::from_entity(inserted.clone(), player.display_name);
    sse_events::broadcast_scavenger_changed(state, &room.room_code, question.id, &summary);

    Ok(SubmitScavengerResponse {
        submission_id: inserted.id,
        submission_order: inserted.submission_order,
    })
}

/// Apply the host's verdict to a pending scavenger submission and credit
/// the submitter.
///
/// "First approved" is decided here, at review time, by checking whether
/// any other submission of the question already holds an approval; an early
/// submitter that was rejected first does not consume the first-approved
/// award.
pub async fn review_scavenger(
    state: &SharedState,
    room_code: &str,
    host_key: &str,
    submission_id: Uuid,
    approved: bool,
) -> Result<ReviewScavengerResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::find_room(state, room_code).await?;
    game_service::verify_host(&room, host_key)?;

    let submission = store
        .find_scavenger(submission_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("submission not found".into()))?;
    if submission.room_id != room.id {
        return Err(ServiceError::NotFound("submission not found".into()));
    }
    if submission.approved.is_some() {
        return Err(ServiceError::Conflict(
            "this submission was already reviewed".into(),
        ));
    }

    let is_first_approved =
        approved && store.count_approved_scavengers(submission.question_id).await? == 0;
    let points = scoring::scavenger_points(
        Some(approved),
        is_first_approved,
        room.settings.points_for_first_scavenger,
        room.settings.points_for_other_approved_scavengers,
        room.settings.points_for_rejected_scavengers,
    );

    let reviewed = store
        .review_scavenger(submission_id, approved, points, SystemTime::now())
        .await?
        .ok_or_else(|| ServiceError::NotFound("submission vanished during review".into()))?;

    let updated = store
        .increment_points(reviewed.player_id, points)
        .await?
        .ok_or_else(|| ServiceError::NotFound("player vanished during scoring".into()))?;

    info!(
        room_code = %room.room_code,
        player = %updated.display_name,
        approved,
        is_first_approved,
        points,
        "scavenger submission reviewed"
    );

    let summary = ScavengerSummary::from_entity(reviewed, updated.display_name.clone());
    sse_events::broadcast_scavenger_changed(state, &room.room_code, submission.question_id, &summary);
    broadcast_snapshot(state, &room).await;

    Ok(ReviewScavengerResponse {
        submission: summary,
        player: updated.into(),
    })
}

/// Scavenger submissions of one question, in arrival order, with the
/// submitters' display names attached for the host's review list.
pub async fn list_scavengers(
    state: &SharedState,
    room_code: &str,
    host_key: &str,
    round_number: u32,
    question_number: u32,
) -> Result<ScavengerListResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::find_room(state, room_code).await?;
    game_service::verify_host(&room, host_key)?;

    let question = store
        .find_question(room.id, round_number, question_number)
        .await?
        .ok_or_else(|| ServiceError::NotFound("question not found".into()))?;

    let rows = store.list_scavengers(question.id).await?;
    let mut submissions = Vec::with_capacity(rows.len());
    for row in rows {
        let display_name = store
            .find_player(row.player_id)
            .await?
            .map(|player| player.display_name)
            .unwrap_or_else(|| "departed player".into());
        submissions.push(ScavengerSummary::from_entity(row, display_name));
    }

    Ok(ScavengerListResponse { submissions })
}

/// Aggregate participation counts the auto-advance decision (and any host
/// UI) compares against the connected-player count.
pub async fn participation_counts(
    state: &SharedState,
    room_code: &str,
    round_number: u32,
    question_number: u32,
) -> Result<ParticipationCounts, ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::find_room(state, room_code).await?;

    let question = store
        .find_question(room.id, round_number, question_number)
        .await?
        .ok_or_else(|| ServiceError::NotFound("question not found".into()))?;

    let answered_count = store.count_submissions(question.id).await?;
    let submitted_count = store.count_scavengers(question.id).await?;
    let connected_players = store
        .list_players(room.id)
        .await?
        .iter()
        .filter(|player| player.connected)
        .count();

    Ok(ParticipationCounts {
        answered_count,
        submitted_count,
        connected_players,
        all_answered: connected_players > 0 && answered_count >= connected_players,
        all_submitted: connected_players > 0 && submitted_count >= connected_players,
    })
}

/// What a player already submitted for a question. Rejoining clients call
/// this before offering the answer or submit buttons again.
pub async fn player_submission_status(
    state: &SharedState,
    room_code: &str,
    round_number: u32,
    question_number: u32,
    player_id: Uuid,
) -> Result<PlayerSubmissionStatus, ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::find_room(state, room_code).await?;
    require_player(state, &room, player_id).await?;

    let question = store
        .find_question(room.id, round_number, question_number)
        .await?
        .ok_or_else(|| ServiceError::NotFound("question not found".into()))?;

    let answered = store
        .find_submission_by_player(question.id, player_id)
        .await?
        .is_some();
    let scavenger_submitted = store
        .find_scavenger_by_player(question.id, player_id)
        .await?
        .is_some();

    Ok(PlayerSubmissionStatus {
        answered,
        scavenger_submitted,
    })
}

async fn require_question(
    state: &SharedState,
    room: &RoomEntity,
    question_id: Uuid,
) -> Result<QuestionEntity, ServiceError> {
    let store = state.require_room_store().await?;
    let question = store
        .find_question_by_id(question_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("question not found".into()))?;
    if question.room_id != room.id {
        return Err(ServiceError::NotFound("question not found".into()));
    }
    Ok(question)
}

async fn require_player(
    state: &SharedState,
    room: &RoomEntity,
    player_id: Uuid,
) -> Result<PlayerEntity, ServiceError> {
    let store = state.require_room_store().await?;
    let player = store
        .find_player(player_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("player not found".into()))?;
    if player.room_id != room.id {
        return Err(ServiceError::NotFound("player not found".into()));
    }
    Ok(player)
}

async fn broadcast_snapshot(state: &SharedState, room: &RoomEntity) {
    // Scores changed; refresh everyone with a current snapshot. Reload the
    // room so the broadcast reflects the committed state.
    if let Ok(room) = room_service::find_room(state, &room.room_code).await {
        if let Ok(snapshot) = room_service::room_snapshot(state, &room).await {
            sse_events::broadcast_room_changed(state, &snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::room_store::memory::MemoryRoomStore,
        dto::room::{CreateRoomRequest, GameSettingsInput, JoinRoomRequest},
        state::AppState,
    };

    struct Fixture {
        state: SharedState,
        code: String,
        host_key: String,
        question_id: Uuid,
        correct_choice: String,
    }

    async fn fixture() -> Fixture {
        let state = AppState::new(AppConfig::default());
        state
            .install_room_store(Arc::new(MemoryRoomStore::new()))
            .await;

        let created = room_service::create_room(
            &state,
            CreateRoomRequest {
                title: "Test night".into(),
                settings: GameSettingsInput {
                    number_of_rounds: Some(1),
                    questions_per_round: Some(1),
                    ..GameSettingsInput::default()
                },
                questions: None,
            },
        )
        .await
        .unwrap();

        let code = created.room.room_code.clone();
        let host_key = created.host_key.clone();
        let question = room_service::get_question(&state, &code, 1, 1, Some(&host_key))
            .await
            .unwrap();

        Fixture {
            state,
            code,
            host_key,
            question_id: question.id,
            correct_choice: question.correct_choice_id.unwrap(),
        }
    }

    async fn join(fixture: &Fixture, name: &str) -> Uuid {
        room_service::join_room(
            &fixture.state,
            &fixture.code,
            JoinRoomRequest {
                display_name: name.into(),
                client_uuid: format!("client-{name}"),
            },
        )
        .await
        .unwrap()
        .player
        .id
    }

    #[tokio::test]
    async fn correct_answer_is_scored_and_credited_once() {
        let fixture = fixture().await;
        let ada = join(&fixture, "Ada").await;

        let response = submit_answer(
            &fixture.state,
            &fixture.code,
            SubmitAnswerRequest {
                player_id: ada,
                question_id: fixture.question_id,
                answer_choice_id: fixture.correct_choice.clone(),
                answer_time_ms: 0,
            },
        )
        .await
        .unwrap();
        assert!(response.is_correct);
        assert_eq!(response.points_awarded, 100);
        assert_eq!(response.total_points, 100);

        let duplicate = submit_answer(
            &fixture.state,
            &fixture.code,
            SubmitAnswerRequest {
                player_id: ada,
                question_id: fixture.question_id,
                answer_choice_id: fixture.correct_choice.clone(),
                answer_time_ms: 5,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(duplicate, ServiceError::Conflict(_)));

        let standings = room_service::get_leaderboard(&fixture.state, &fixture.code)
            .await
            .unwrap();
        assert_eq!(standings[0].points, 100);
    }

    #[tokio::test]
    async fn wrong_answer_earns_zero_but_is_recorded() {
        let fixture = fixture().await;
        let ada = join(&fixture, "Ada").await;

        let wrong_choice = room_service::get_question(&fixture.state, &fixture.code, 1, 1, None)
            .await
            .unwrap()
            .choices
            .into_iter()
            .map(|choice| choice.id)
            .find(|id| *id != fixture.correct_choice)
            .unwrap();

        let response = submit_answer(
            &fixture.state,
            &fixture.code,
            SubmitAnswerRequest {
                player_id: ada,
                question_id: fixture.question_id,
                answer_choice_id: wrong_choice,
                answer_time_ms: 2_000,
            },
        )
        .await
        .unwrap();
        assert!(!response.is_correct);
        assert_eq!(response.points_awarded, 0);

        let status = player_submission_status(&fixture.state, &fixture.code, 1, 1, ada)
            .await
            .unwrap();
        assert!(status.answered);
        assert!(!status.scavenger_submitted);
    }

    #[tokio::test]
    async fn slow_answers_earn_less_than_fast_ones() {
        let fixture = fixture().await;
        let ada = join(&fixture, "Ada").await;
        let bea = join(&fixture, "Bea").await;

        let fast = submit_answer(
            &fixture.state,
            &fixture.code,
            SubmitAnswerRequest {
                player_id: ada,
                question_id: fixture.question_id,
                answer_choice_id: fixture.correct_choice.clone(),
                answer_time_ms: 1_000,
            },
        )
        .await
        .unwrap();
        let slow = submit_answer(
            &fixture.state,
            &fixture.code,
            SubmitAnswerRequest {
                player_id: bea,
                question_id: fixture.question_id,
                answer_choice_id: fixture.correct_choice.clone(),
                answer_time_ms: 29_000,
            },
        )
        .await
        .unwrap();

        assert!(fast.points_awarded > slow.points_awarded);
        assert!(slow.points_awarded >= 50);
    }

    #[tokio::test]
    async fn rejected_first_submitter_leaves_first_approved_to_the_next() {
        let fixture = fixture().await;
        let ada = join(&fixture, "Ada").await;
        let bea = join(&fixture, "Bea").await;

        // Ada submits first, Bea second.
        let first = submit_scavenger(
            &fixture.state,
            &fixture.code,
            SubmitScavengerRequest {
                player_id: ada,
                question_id: fixture.question_id,
            },
        )
        .await
        .unwrap();
        let second = submit_scavenger(
            &fixture.state,
            &fixture.code,
            SubmitScavengerRequest {
                player_id: bea,
                question_id: fixture.question_id,
            },
        )
        .await
        .unwrap();
        assert_eq!(first.submission_order, 1);
        assert_eq!(second.submission_order, 2);

        // Ada is rejected: consolation points only.
        let rejected = review_scavenger(
            &fixture.state,
            &fixture.code,
            &fixture.host_key,
            first.submission_id,
            false,
        )
        .await
        .unwrap();
        assert_eq!(rejected.submission.approved, Some(false));
        assert_eq!(rejected.submission.points_awarded, 2);

        // Bea, approved afterwards, is the *first approved* despite having
        // submitted second.
        let approved = review_scavenger(
            &fixture.state,
            &fixture.code,
            &fixture.host_key,
            second.submission_id,
            true,
        )
        .await
        .unwrap();
        assert_eq!(approved.submission.approved, Some(true));
        assert_eq!(approved.submission.points_awarded, 10);
        assert_eq!(approved.player.points, 10);
    }

    #[tokio::test]
    async fn later_approvals_earn_the_other_tier() {
        let fixture = fixture().await;
        let ada = join(&fixture, "Ada").await;
        let bea = join(&fixture, "Bea").await;

        let first = submit_scavenger(
            &fixture.state,
            &fixture.code,
            SubmitScavengerRequest {
                player_id: ada,
                question_id: fixture.question_id,
            },
        )
        .await
        .unwrap();
        let second = submit_scavenger(
            &fixture.state,
            &fixture.code,
            SubmitScavengerRequest {
                player_id: bea,
                question_id: fixture.question_id,
            },
        )
        .await
        .unwrap();

        let first_reviewed = review_scavenger(
            &fixture.state,
            &fixture.code,
            &fixture.host_key,
            first.submission_id,
            true,
        )
        .await
        .unwrap();
        let second_reviewed = review_scavenger(
            &fixture.state,
            &fixture.code,
            &fixture.host_key,
            second.submission_id,
            true,
        )
        .await
        .unwrap();

        assert_eq!(first_reviewed.submission.points_awarded, 10);
        assert_eq!(second_reviewed.submission.points_awarded, 5);
    }

    #[tokio::test]
    async fn double_submission_and_double_review_are_rejected() {
        let fixture = fixture().await;
        let ada = join(&fixture, "Ada").await;

        let submission = submit_scavenger(
            &fixture.state,
            &fixture.code,
            SubmitScavengerRequest {
                player_id: ada,
                question_id: fixture.question_id,
            },
        )
        .await
        .unwrap();

        let duplicate = submit_scavenger(
            &fixture.state,
            &fixture.code,
            SubmitScavengerRequest {
                player_id: ada,
                question_id: fixture.question_id,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(duplicate, ServiceError::Conflict(_)));

        review_scavenger(
            &fixture.state,
            &fixture.code,
            &fixture.host_key,
            submission.submission_id,
            true,
        )
        .await
        .unwrap();

        // A second verdict would double-credit the player.
        let again = review_scavenger(
            &fixture.state,
            &fixture.code,
            &fixture.host_key,
            submission.submission_id,
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(again, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn review_requires_the_host_key() {
        let fixture = fixture().await;
        let ada = join(&fixture, "Ada").await;

        let submission = submit_scavenger(
            &fixture.state,
            &fixture.code,
            SubmitScavengerRequest {
                player_id: ada,
                question_id: fixture.question_id,
            },
        )
        .await
        .unwrap();

        let err = review_scavenger(
            &fixture.state,
            &fixture.code,
            "not-the-key",
            submission.submission_id,
            true,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn counts_track_participation() {
        let fixture = fixture().await;
        let ada = join(&fixture, "Ada").await;
        let bea = join(&fixture, "Bea").await;

        submit_answer(
            &fixture.state,
            &fixture.code,
            SubmitAnswerRequest {
                player_id: ada,
                question_id: fixture.question_id,
                answer_choice_id: fixture.correct_choice.clone(),
                answer_time_ms: 500,
            },
        )
        .await
        .unwrap();

        let counts = participation_counts(&fixture.state, &fixture.code, 1, 1)
            .await
            .unwrap();
        assert_eq!(counts.answered_count, 1);
        assert_eq!(counts.connected_players, 2);
        assert!(!counts.all_answered);

        submit_answer(
            &fixture.state,
            &fixture.code,
            SubmitAnswerRequest {
                player_id: bea,
                question_id: fixture.question_id,
                answer_choice_id: fixture.correct_choice.clone(),
                answer_time_ms: 900,
            },
        )
        .await
        .unwrap();

        let counts = participation_counts(&fixture.state, &fixture.code, 1, 1)
            .await
            .unwrap();
        assert!(counts.all_answered);
    }
}
