//! Host-authenticated game lifecycle transitions.
//!
//! Every transition follows the same shape: read the *current* persisted
//! state, plan the next phase against it, run the accompanying side
//! effects, then commit through a conditional write keyed on the phase the
//! plan was computed from. A stale caller (or the second of two racing
//! advances) fails the conditional write and is rejected without skipping a
//! phase.

use std::time::SystemTime;

use tracing::{info, warn};

use crate::{
    dao::models::RoomEntity,
    dao::room_store::StateWrite,
    dto::host::TransitionResponse,
    error::ServiceError,
    services::{coordinator::MIN_QUESTION_DWELL, room_service, sse_events},
    state::{
        SharedState,
        state_machine::{GameEvent, GamePhase, plan_transition},
    },
};

/// Explicit "start game" action. Requires at least one connected player;
/// resets all scores and clears both submission ledgers before entering the
/// first trivia question.
pub async fn start_game(
    state: &SharedState,
    room_code: &str,
    host_key: &str,
) -> Result<TransitionResponse, ServiceError> {
    run_transition(state, room_code, host_key, GameEvent::StartGame).await
}

/// Advance to whatever follows the current phase, manually or on behalf of
/// the auto-advance coordinator.
pub async fn advance(
    state: &SharedState,
    room_code: &str,
    host_key: &str,
) -> Result<TransitionResponse, ServiceError> {
    run_transition(state, room_code, host_key, GameEvent::Advance).await
}

/// Reset a finished game back to the lobby, clearing scores and ledgers.
pub async fn restart(
    state: &SharedState,
    room_code: &str,
    host_key: &str,
) -> Result<TransitionResponse, ServiceError> {
    run_transition(state, room_code, host_key, GameEvent::Restart).await
}

/// Check the caller presents the room's host key.
pub fn verify_host(room: &RoomEntity, host_key: &str) -> Result<(), ServiceError> {
    if room.host_key != host_key {
        return Err(ServiceError::Unauthorized("host key mismatch".into()));
    }
    Ok(())
}

async fn run_transition(
    state: &SharedState,
    room_code: &str,
    host_key: &str,
    event: GameEvent,
) -> Result<TransitionResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::find_room(state, room_code).await?;
    verify_host(&room, host_key)?;

    let now = SystemTime::now();
    let current = GamePhase::from_entity(&room.game_state)?;

    // Slower-loading clients must get to see a question before the phase
    // can move on, whether the advance is manual or automatic.
    if let Some(loaded_at) = current.question_loaded_at() {
        if event == GameEvent::Advance && now < loaded_at + MIN_QUESTION_DWELL {
            return Err(ServiceError::InvalidState(
                "the question was just presented; try again in a moment".into(),
            ));
        }
    }

    if event == GameEvent::StartGame {
        let connected = store
            .list_players(room.id)
            .await?
            .iter()
            .filter(|player| player.connected)
            .count();
        if connected == 0 {
            return Err(ServiceError::InvalidState(
                "starting a game requires at least one connected player".into(),
            ));
        }
    }

    let transition = plan_transition(&current, event, &room.settings, now)?;

    if transition.effects.reset_progress {
        store.reset_points(room.id).await?;
        let answers = store.delete_submissions(room.id).await?;
        let proofs = store.delete_scavengers(room.id).await?;
        info!(
            room_code = %room.room_code,
            answers,
            proofs,
            "cleared previous game progress"
        );
    }

    // Ping right before the write so the transition itself cannot read as a
    // host disconnect on player devices.
    store.touch_host_ping(room.id, now).await?;

    let written = store
        .update_game_state(room.id, transition.expected, transition.next.to_entity(), now)
        .await?;

    let updated = match written {
        StateWrite::Applied(room) => *room,
        StateWrite::Stale { actual } => {
            warn!(
                room_code = %room.room_code,
                expected = %transition.expected,
                actual = %actual,
                "transition lost the race and was rejected"
            );
            return Err(ServiceError::Conflict(format!(
                "room moved from {} to {actual} while this transition was in flight",
                transition.expected
            )));
        }
        StateWrite::Missing => {
            return Err(ServiceError::NotFound(format!(
                "room `{room_code}` vanished mid-transition"
            )));
        }
    };

    info!(
        room_code = %updated.room_code,
        from = %transition.expected,
        to = %updated.game_state.status,
        "phase transition committed"
    );

    let snapshot = room_service::room_snapshot(state, &updated).await?;
    sse_events::broadcast_phase_changed(state, &snapshot);

    Ok(TransitionResponse {
        game_state: snapshot.game_state.clone(),
        room: snapshot,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::models::{GameStateEntity, PhaseKey},
        dao::room_store::memory::MemoryRoomStore,
        dto::{
            phase::GameStatus,
            room::{CreateRoomRequest, GameSettingsInput, JoinRoomRequest},
        },
        state::AppState,
    };

    async fn test_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .install_room_store(Arc::new(MemoryRoomStore::new()))
            .await;
        state
    }

    async fn create_short_room(state: &SharedState) -> (String, String) {
        let created = room_service::create_room(
            state,
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
        (created.room.room_code, created.host_key)
    }

    async fn join(state: &SharedState, code: &str, name: &str) -> Uuid {
        room_service::join_room(
            state,
            code,
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

    /// Rewind the trivia anchor so the dwell window is already over.
    async fn skip_dwell(state: &SharedState, code: &str) {
        let store = state.room_store().await.unwrap();
        let room = store
            .find_room_by_code(code.to_string())
            .await
            .unwrap()
            .unwrap();
        let mut rewound = room.game_state.clone();
        rewound.question_start_time = Some(SystemTime::now() - Duration::from_secs(10));
        store
            .update_game_state(room.id, PhaseKey::Trivia, rewound, SystemTime::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn start_requires_a_connected_player() {
        let state = test_state().await;
        let (code, key) = create_short_room(&state).await;

        let err = start_game(&state, &code, &key).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        join(&state, &code, "Ada").await;
        let started = start_game(&state, &code, &key).await.unwrap();
        assert_eq!(started.game_state.status, GameStatus::Trivia);
        assert_eq!(started.game_state.current_round, 1);
        assert_eq!(started.game_state.current_question, 1);
        assert!(started.game_state.question_start_time.is_some());
    }

    #[tokio::test]
    async fn wrong_host_key_changes_nothing() {
        let state = test_state().await;
        let (code, _key) = create_short_room(&state).await;
        join(&state, &code, "Ada").await;

        let err = start_game(&state, &code, "not-the-key").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let snapshot = room_service::get_room(&state, &code).await.unwrap();
        assert_eq!(snapshot.game_state.status, GameStatus::Lobby);
    }

    #[tokio::test]
    async fn advance_is_blocked_during_the_dwell_window() {
        let state = test_state().await;
        let (code, key) = create_short_room(&state).await;
        join(&state, &code, "Ada").await;
        start_game(&state, &code, &key).await.unwrap();

        // The question was presented milliseconds ago.
        let err = advance(&state, &code, &key).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn single_question_game_walks_to_finished() {
        let state = test_state().await;
        let (code, key) = create_short_room(&state).await;
        join(&state, &code, "Ada").await;
        start_game(&state, &code, &key).await.unwrap();
        skip_dwell(&state, &code).await;

        let mut seen = Vec::new();
        for _ in 0..3 {
            let response = advance(&state, &code, &key).await.unwrap();
            seen.push(response.game_state.status);
        }
        assert_eq!(
            seen,
            vec![
                GameStatus::TriviaReview,
                GameStatus::Scavenger,
                GameStatus::Review,
            ]
        );

        // Final review of the final round finishes the game outright.
        let finished = advance(&state, &code, &key).await.unwrap();
        assert_eq!(finished.game_state.status, GameStatus::Finished);

        // No further advance is possible from the terminal state.
        let err = advance(&state, &code, &key).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn starting_twice_is_rejected_without_skipping_phases() {
        let state = test_state().await;
        let (code, key) = create_short_room(&state).await;
        join(&state, &code, "Ada").await;

        start_game(&state, &code, &key).await.unwrap();
        let err = start_game(&state, &code, &key).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let snapshot = room_service::get_room(&state, &code).await.unwrap();
        assert_eq!(snapshot.game_state.status, GameStatus::Trivia);
    }

    #[tokio::test]
    async fn stale_writer_loses_to_the_committed_transition() {
        let state = test_state().await;
        let (code, key) = create_short_room(&state).await;
        join(&state, &code, "Ada").await;
        start_game(&state, &code, &key).await.unwrap();
        skip_dwell(&state, &code).await;

        // First advance commits trivia -> trivia_review.
        advance(&state, &code, &key).await.unwrap();

        // A second device that still observes `trivia` must be rejected by
        // the conditional write rather than skipping straight to scavenger.
        let store = state.room_store().await.unwrap();
        let room = store
            .find_room_by_code(code.clone())
            .await
            .unwrap()
            .unwrap();
        let stale = store
            .update_game_state(
                room.id,
                PhaseKey::Trivia,
                GameStateEntity {
                    status: PhaseKey::Scavenger,
                    current_round: 1,
                    current_question: 1,
                    question_start_time: None,
                    scavenger_start_time: Some(SystemTime::now()),
                },
                SystemTime::now(),
            )
            .await
            .unwrap();
        assert!(matches!(
            stale,
            crate::dao::room_store::StateWrite::Stale { .. }
        ));

        let snapshot = room_service::get_room(&state, &code).await.unwrap();
        assert_eq!(snapshot.game_state.status, GameStatus::TriviaReview);
    }

    #[tokio::test]
    async fn restart_only_from_finished_and_resets_progress() {
        let state = test_state().await;
        let (code, key) = create_short_room(&state).await;
        let ada = join(&state, &code, "Ada").await;

        let err = restart(&state, &code, &key).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        start_game(&state, &code, &key).await.unwrap();
        skip_dwell(&state, &code).await;

        // Score some points so the reset is observable.
        let question = room_service::get_question(&state, &code, 1, 1, Some(&key))
            .await
            .unwrap();
        crate::services::submission_service::submit_answer(
            &state,
            &code,
            crate::dto::play::SubmitAnswerRequest {
                player_id: ada,
                question_id: question.id,
                answer_choice_id: question.correct_choice_id.unwrap(),
                answer_time_ms: 0,
            },
        )
        .await
        .unwrap();

        for _ in 0..4 {
            advance(&state, &code, &key).await.unwrap();
        }

        let back = restart(&state, &code, &key).await.unwrap();
        assert_eq!(back.game_state.status, GameStatus::Lobby);
        assert!(back.room.players.iter().all(|player| player.points == 0));
    }
}
