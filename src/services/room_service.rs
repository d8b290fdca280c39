//! Room lifecycle: creation, joining, snapshots, and expiry sweeps.

use std::time::{Duration, SystemTime};

use tracing::info;
use uuid::Uuid;

use crate::{
    codes::{generate_host_key, generate_room_code},
    config::AppConfig,
    dao::models::{
        GameSettingsEntity, GameStateEntity, PhaseKey, PlayerEntity, QuestionEntity, RoomEntity,
    },
    dto::{
        common::RoomSnapshot,
        room::{
            CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, JoinRoomResponse,
            QuestionInput, QuestionView,
        },
        validation::sanitize_display_name,
    },
    error::ServiceError,
    services::{presence_service, sse_events},
    state::SharedState,
};

/// Rooms are swept this long after creation.
const ROOM_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Attempts at drawing an unused join code before giving up.
const MAX_CODE_ATTEMPTS: usize = 8;

/// Create a room: draw a join code and host key, seed the question deck, and
/// persist the lobby-state record.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<CreateRoomResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let now = SystemTime::now();

    let settings = request.settings.into_settings();
    let room_id = Uuid::new_v4();
    let questions = match request.questions {
        Some(inputs) => build_custom_questions(room_id, inputs, &settings)?,
        None => build_default_questions(state.config(), room_id, &settings),
    };

    let mut room_code = generate_room_code();
    let mut attempts = 1;
    while store
        .find_room_by_code(room_code.clone())
        .await?
        .is_some()
    {
        attempts += 1;
        if attempts > MAX_CODE_ATTEMPTS {
            return Err(ServiceError::Conflict(
                "could not allocate an unused room code".into(),
            ));
        }
        room_code = generate_room_code();
    }

    let host_key = generate_host_key();
    let room = RoomEntity {
        id: room_id,
        room_code: room_code.clone(),
        host_key: host_key.clone(),
        title: request.title,
        settings,
        game_state: GameStateEntity::lobby(),
        created_at: now,
        last_activity_at: now,
        last_host_ping: None,
        expires_at: now + ROOM_TTL,
    };

    store.insert_room(room.clone()).await?;
    store.insert_questions(questions).await?;

    info!(room_code = %room_code, room_id = %room_id, "room created");

    Ok(CreateRoomResponse {
        room: RoomSnapshot::new(&room, Vec::new(), true),
        host_key,
    })
}

/// Join a room as a player, or rejoin in place when the device is already
/// known. Display-name collisions are resolved by numeric suffixing.
pub async fn join_room(
    state: &SharedState,
    room_code: &str,
    request: JoinRoomRequest,
) -> Result<JoinRoomResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let room = find_room(state, room_code).await?;
    let now = SystemTime::now();
    let requested_name = sanitize_display_name(&request.display_name);

    let player = match store
        .find_player_by_client(room.id, request.client_uuid.clone())
        .await?
    {
        Some(existing) => {
            // A rejoin may rename, but never into another player's name.
            let other_names: Vec<String> = store
                .list_players(room.id)
                .await?
                .into_iter()
                .filter(|player| player.id != existing.id)
                .map(|player| player.display_name)
                .collect();
            let new_name = if requested_name == existing.display_name {
                existing.display_name.clone()
            } else {
                unique_display_name(&requested_name, &other_names)
            };
            store
                .update_player_presence(existing.id, true, Some(new_name), now)
                .await?
                .ok_or_else(|| ServiceError::NotFound("player vanished during rejoin".into()))?
        }
        None => {
            let existing_names: Vec<String> = store
                .list_players(room.id)
                .await?
                .into_iter()
                .map(|player| player.display_name)
                .collect();
            let player = PlayerEntity {
                id: Uuid::new_v4(),
                room_id: room.id,
                client_uuid: request.client_uuid,
                display_name: unique_display_name(&requested_name, &existing_names),
                connected: true,
                last_seen_at: now,
                points: 0,
                joined_at: now,
            };
            store.insert_player(player.clone()).await?;
            player
        }
    };

    let snapshot = room_snapshot(state, &room).await?;
    sse_events::broadcast_room_changed(state, &snapshot);

    Ok(JoinRoomResponse {
        player: player.into(),
        room: snapshot,
    })
}

/// Full snapshot of a room by join code: the polling-fallback payload.
pub async fn get_room(state: &SharedState, room_code: &str) -> Result<RoomSnapshot, ServiceError> {
    let room = find_room(state, room_code).await?;
    room_snapshot(state, &room).await
}

/// Fetch a question of the room.
///
/// The correct choice is included only for a caller presenting the host key,
/// or once the room has moved past the question's answering window.
pub async fn get_question(
    state: &SharedState,
    room_code: &str,
    round_number: u32,
    question_number: u32,
    host_key: Option<&str>,
) -> Result<QuestionView, ServiceError> {
    let store = state.require_room_store().await?;
    let room = find_room(state, room_code).await?;

    let question = store
        .find_question(room.id, round_number, question_number)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "question {question_number} of round {round_number} not found"
            ))
        })?;

    let is_host = host_key.is_some_and(|key| key == room.host_key);
    let reveal =
        is_host || question_revealed(&room.game_state, round_number, question_number);

    Ok(QuestionView::from_entity(question, reveal))
}

/// Current standings of a room, ranked by points.
pub async fn get_leaderboard(
    state: &SharedState,
    room_code: &str,
) -> Result<Vec<crate::dto::common::LeaderboardEntry>, ServiceError> {
    let store = state.require_room_store().await?;
    let room = find_room(state, room_code).await?;
    let players = store.list_players(room.id).await?;
    Ok(crate::dto::common::leaderboard(players))
}

/// Delete rooms past their expiry, returning how many were swept.
pub async fn cleanup_expired(state: &SharedState) -> Result<usize, ServiceError> {
    let store = state.require_room_store().await?;
    let swept = store
        .delete_rooms_expired_before(SystemTime::now())
        .await?;
    for code in &swept {
        state.hubs().remove(code);
    }
    if !swept.is_empty() {
        info!(deleted = swept.len(), "swept expired rooms");
    }
    Ok(swept.len())
}

/// Look a room up by join code, normalizing case.
pub(crate) async fn find_room(
    state: &SharedState,
    room_code: &str,
) -> Result<RoomEntity, ServiceError> {
    let store = state.require_room_store().await?;
    store
        .find_room_by_code(room_code.to_uppercase())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_code}` not found")))
}

/// Assemble the shared snapshot for a loaded room.
pub(crate) async fn room_snapshot(
    state: &SharedState,
    room: &RoomEntity,
) -> Result<RoomSnapshot, ServiceError> {
    let store = state.require_room_store().await?;
    let players = store.list_players(room.id).await?;
    let host_online = presence_service::host_online(
        room.last_host_ping,
        room.game_state.status,
        SystemTime::now(),
    );
    Ok(RoomSnapshot::new(room, players, host_online))
}

/// Whether a question's correct answer may be shown to non-host callers.
fn question_revealed(state: &GameStateEntity, round_number: u32, question_number: u32) -> bool {
    match state.status {
        PhaseKey::Lobby | PhaseKey::Paused => false,
        PhaseKey::Finished => true,
        // Earlier rounds are settled; the current round reveals everything
        // before the current question.
        PhaseKey::RoundSummary => round_number <= state.current_round,
        PhaseKey::Trivia => {
            (round_number, question_number) < (state.current_round, state.current_question)
        }
        PhaseKey::TriviaReview | PhaseKey::Scavenger | PhaseKey::Review => {
            (round_number, question_number) <= (state.current_round, state.current_question)
        }
    }
}

/// Resolve a display-name collision by appending the first free numeric
/// suffix, deterministic in join order.
fn unique_display_name(requested: &str, taken: &[String]) -> String {
    if !taken.iter().any(|name| name == requested) {
        return requested.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{requested}{counter}");
        if !taken.iter().any(|name| name == &candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Seed a room's deck from the configured default questions, cycling the
/// deck when the game needs more slots than it holds.
fn build_default_questions(
    config: &AppConfig,
    room_id: Uuid,
    settings: &GameSettingsEntity,
) -> Vec<QuestionEntity> {
    let mut questions = Vec::new();
    let mut slot = 0;
    for round in 1..=settings.number_of_rounds {
        for number in 1..=settings.questions_per_round {
            let template = config.deck_question(slot);
            questions.push(QuestionEntity {
                id: Uuid::new_v4(),
                room_id,
                round_number: round,
                question_number: number,
                stem: template.stem.clone(),
                choices: template.choices.clone(),
                scavenger_instruction: template.scavenger_instruction.clone(),
            });
            slot += 1;
        }
    }
    questions
}

/// Check a custom deck covers every (round, question) slot exactly once and
/// convert it to entities.
fn build_custom_questions(
    room_id: Uuid,
    inputs: Vec<QuestionInput>,
    settings: &GameSettingsEntity,
) -> Result<Vec<QuestionEntity>, ServiceError> {
    let expected = (settings.number_of_rounds * settings.questions_per_round) as usize;
    if inputs.len() != expected {
        return Err(ServiceError::InvalidInput(format!(
            "expected {expected} questions for {} rounds of {}, got {}",
            settings.number_of_rounds,
            settings.questions_per_round,
            inputs.len()
        )));
    }

    let mut seen = std::collections::HashSet::new();
    let mut questions = Vec::with_capacity(inputs.len());
    for input in inputs {
        if input.round_number > settings.number_of_rounds
            || input.question_number > settings.questions_per_round
        {
            return Err(ServiceError::InvalidInput(format!(
                "question position ({}, {}) is outside the configured game",
                input.round_number, input.question_number
            )));
        }
        if !seen.insert((input.round_number, input.question_number)) {
            return Err(ServiceError::InvalidInput(format!(
                "duplicate question position ({}, {})",
                input.round_number, input.question_number
            )));
        }
        questions.push(QuestionEntity {
            id: Uuid::new_v4(),
            room_id,
            round_number: input.round_number,
            question_number: input.question_number,
            stem: input.stem,
            choices: input
                .choices
                .into_iter()
                .map(|choice| crate::dao::models::ChoiceEntity {
                    id: choice.id,
                    label: choice.label,
                    is_correct: choice.is_correct,
                })
                .collect(),
            scavenger_instruction: input.scavenger_instruction,
        });
    }
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixing_is_deterministic_in_join_order() {
        let mut taken: Vec<String> = Vec::new();
        for expected in ["Ada", "Ada1", "Ada2", "Ada3"] {
            let name = unique_display_name("Ada", &taken);
            assert_eq!(name, expected);
            taken.push(name);
        }
    }

    #[test]
    fn suffixing_skips_holes_left_by_other_names() {
        let taken = vec!["Ada".into(), "Ada2".into()];
        assert_eq!(unique_display_name("Ada", &taken), "Ada1");
        let taken = vec!["Ada".into(), "Ada1".into(), "Ada2".into()];
        assert_eq!(unique_display_name("Ada", &taken), "Ada3");
    }

    #[test]
    fn reveal_tracks_game_position() {
        let state = |status, round, question| GameStateEntity {
            status,
            current_round: round,
            current_question: question,
            question_start_time: None,
            scavenger_start_time: None,
        };

        // During a question, its own answer stays hidden.
        assert!(!question_revealed(&state(PhaseKey::Trivia, 2, 2), 2, 2));
        // Earlier questions are settled.
        assert!(question_revealed(&state(PhaseKey::Trivia, 2, 2), 2, 1));
        assert!(question_revealed(&state(PhaseKey::Trivia, 2, 2), 1, 3));
        // Once the reveal phase is reached the current question opens up.
        assert!(question_revealed(&state(PhaseKey::TriviaReview, 2, 2), 2, 2));
        assert!(question_revealed(&state(PhaseKey::Review, 2, 2), 2, 2));
        // Lobby reveals nothing; finished reveals everything.
        assert!(!question_revealed(&state(PhaseKey::Lobby, 0, 0), 1, 1));
        assert!(question_revealed(&state(PhaseKey::Finished, 0, 0), 3, 3));
    }

    #[test]
    fn default_deck_fills_every_slot() {
        let config = AppConfig::default();
        let settings = GameSettingsEntity {
            number_of_rounds: 3,
            questions_per_round: 4,
            ..GameSettingsEntity::default()
        };
        let questions = build_default_questions(&config, Uuid::new_v4(), &settings);
        assert_eq!(questions.len(), 12);
        for round in 1..=3 {
            for number in 1..=4 {
                assert!(
                    questions
                        .iter()
                        .any(|q| q.round_number == round && q.question_number == number)
                );
            }
        }
    }

    #[tokio::test]
    async fn joining_suffixes_collisions_and_rejoining_updates_in_place() {
        use std::sync::Arc;

        use crate::dao::room_store::memory::MemoryRoomStore;
        use crate::dto::room::{CreateRoomRequest, GameSettingsInput};
        use crate::state::AppState;

        let state = AppState::new(AppConfig::default());
        state
            .install_room_store(Arc::new(MemoryRoomStore::new()))
            .await;

        let created = create_room(
            &state,
            CreateRoomRequest {
                title: "Office party".into(),
                settings: GameSettingsInput::default(),
                questions: None,
            },
        )
        .await
        .unwrap();
        let code = created.room.room_code;

        let join = |client: &str, name: &str| {
            let state = state.clone();
            let code = code.clone();
            let request = JoinRoomRequest {
                display_name: name.to_string(),
                client_uuid: client.to_string(),
            };
            async move { join_room(&state, &code, request).await.unwrap() }
        };

        let first = join("device-1", "Sam").await;
        let second = join("device-2", "Sam").await;
        let third = join("device-3", "Sam").await;
        assert_eq!(first.player.display_name, "Sam");
        assert_eq!(second.player.display_name, "Sam1");
        assert_eq!(third.player.display_name, "Sam2");

        // Device 1 comes back under a new name: same row, updated fields.
        let rejoined = join("device-1", "Sammy").await;
        assert_eq!(rejoined.player.id, first.player.id);
        assert_eq!(rejoined.player.display_name, "Sammy");
        assert_eq!(rejoined.room.players.len(), 3);
    }

    #[test]
    fn custom_deck_must_cover_every_slot() {
        let settings = GameSettingsEntity {
            number_of_rounds: 1,
            questions_per_round: 2,
            ..GameSettingsEntity::default()
        };
        let question = |round, number| QuestionInput {
            round_number: round,
            question_number: number,
            stem: "Q?".into(),
            choices: Vec::new(),
            scavenger_instruction: "Find it".into(),
        };

        let err = build_custom_questions(Uuid::new_v4(), vec![question(1, 1)], &settings);
        assert!(err.is_err());

        let err = build_custom_questions(
            Uuid::new_v4(),
            vec![question(1, 1), question(1, 1)],
            &settings,
        );
        assert!(err.is_err());

        let ok = build_custom_questions(
            Uuid::new_v4(),
            vec![question(1, 1), question(1, 2)],
            &settings,
        );
        assert!(ok.is_ok());
    }
}
