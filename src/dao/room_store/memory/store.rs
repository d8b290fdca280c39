use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::dao::models::{
    GameStateEntity, PhaseKey, PlayerEntity, QuestionEntity, RoomEntity, ScavengerEntity,
    SubmissionEntity,
};
use crate::dao::room_store::{LedgerInsert, NewScavenger, RoomStore, StateWrite};
use crate::dao::storage::{StorageError, StorageResult};

/// Process-local [`RoomStore`] backend.
///
/// Every table is a [`DashMap`] so single-row operations (the CAS state
/// write, score increments) are atomic under the per-entry lock. Scavenger
/// insertion additionally serializes per question through a mutex so the
/// arrival order is a real sequence rather than a racy count-then-insert.
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    inner: Arc<Tables>,
}

#[derive(Default)]
struct Tables {
    rooms: DashMap<Uuid, RoomEntity>,
    codes: DashMap<String, Uuid>,
    players: DashMap<Uuid, PlayerEntity>,
    // Player ids per room in join order.
    room_players: DashMap<Uuid, Vec<Uuid>>,
    client_index: DashMap<(Uuid, String), Uuid>,
    questions: DashMap<Uuid, QuestionEntity>,
    question_index: DashMap<(Uuid, u32, u32), Uuid>,
    submissions: DashMap<Uuid, SubmissionEntity>,
    // (question, player) uniqueness constraint for trivia answers.
    submission_index: DashMap<(Uuid, Uuid), Uuid>,
    question_submissions: DashMap<Uuid, Vec<Uuid>>,
    scavengers: DashMap<Uuid, ScavengerEntity>,
    scavenger_index: DashMap<(Uuid, Uuid), Uuid>,
    question_scavengers: DashMap<Uuid, Vec<Uuid>>,
    scavenger_sequence: DashMap<Uuid, Arc<Mutex<u32>>>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomStore for MemoryRoomStore {
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            tables.codes.insert(room.room_code.clone(), room.id);
            tables.room_players.insert(room.id, Vec::new());
            tables.rooms.insert(room.id, room);
            Ok(())
        })
    }

    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move { Ok(tables.rooms.get(&id).map(|entry| entry.clone())) })
    }

    fn find_room_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let Some(id) = tables.codes.get(&code).map(|entry| *entry) else {
                return Ok(None);
            };
            match tables.rooms.get(&id) {
                Some(room) => Ok(Some(room.clone())),
                None => Err(StorageError::corrupt(format!(
                    "code `{code}` points at missing room `{id}`"
                ))),
            }
        })
    }

    fn update_game_state(
        &self,
        room_id: Uuid,
        expected: PhaseKey,
        next: GameStateEntity,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<StateWrite>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let Some(mut room) = tables.rooms.get_mut(&room_id) else {
                return Ok(StateWrite::Missing);
            };
            if room.game_state.status != expected {
                return Ok(StateWrite::Stale {
                    actual: room.game_state.status,
                });
            }
            room.game_state = next;
            room.last_activity_at = now;
            Ok(StateWrite::Applied(Box::new(room.clone())))
        })
    }

    fn touch_host_ping(
        &self,
        room_id: Uuid,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            if let Some(mut room) = tables.rooms.get_mut(&room_id) {
                room.last_host_ping = Some(now);
            }
            Ok(())
        })
    }

    fn delete_rooms_expired_before(
        &self,
        cutoff: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<String>>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let expired: Vec<(Uuid, String)> = tables
                .rooms
                .iter()
                .filter(|entry| entry.expires_at < cutoff)
                .map(|entry| (entry.id, entry.room_code.clone()))
                .collect();

            for (room_id, code) in &expired {
                tables.rooms.remove(room_id);
                tables.codes.remove(code);
                remove_room_players(&tables, *room_id);
                remove_room_questions(&tables, *room_id);
                remove_room_submissions(&tables, *room_id);
                remove_room_scavengers(&tables, *room_id);
            }

            Ok(expired.into_iter().map(|(_, code)| code).collect())
        })
    }

    fn list_players(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let ids = tables
                .room_players
                .get(&room_id)
                .map(|entry| entry.clone())
                .unwrap_or_default();
            let mut players = Vec::with_capacity(ids.len());
            for id in ids {
                match tables.players.get(&id) {
                    Some(player) => players.push(player.clone()),
                    None => {
                        return Err(StorageError::corrupt(format!(
                            "room `{room_id}` references missing player `{id}`"
                        )));
                    }
                }
            }
            Ok(players)
        })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move { Ok(tables.players.get(&id).map(|entry| entry.clone())) })
    }

    fn find_player_by_client(
        &self,
        room_id: Uuid,
        client_uuid: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let Some(id) = tables
                .client_index
                .get(&(room_id, client_uuid))
                .map(|entry| *entry)
            else {
                return Ok(None);
            };
            Ok(tables.players.get(&id).map(|entry| entry.clone()))
        })
    }

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            tables
                .client_index
                .insert((player.room_id, player.client_uuid.clone()), player.id);
            tables
                .room_players
                .entry(player.room_id)
                .or_default()
                .push(player.id);
            tables.players.insert(player.id, player);
            Ok(())
        })
    }

    fn update_player_presence(
        &self,
        player_id: Uuid,
        connected: bool,
        display_name: Option<String>,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let Some(mut player) = tables.players.get_mut(&player_id) else {
                return Ok(None);
            };
            player.connected = connected;
            player.last_seen_at = now;
            if let Some(name) = display_name {
                player.display_name = name;
            }
            Ok(Some(player.clone()))
        })
    }

    fn reset_points(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let ids = tables
                .room_players
                .get(&room_id)
                .map(|entry| entry.clone())
                .unwrap_or_default();
            for id in ids {
                if let Some(mut player) = tables.players.get_mut(&id) {
                    player.points = 0;
                }
            }
            Ok(())
        })
    }

    fn increment_points(
        &self,
        player_id: Uuid,
        delta: u32,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let Some(mut player) = tables.players.get_mut(&player_id) else {
                return Ok(None);
            };
            player.points += delta;
            Ok(Some(player.clone()))
        })
    }

    fn insert_questions(
        &self,
        questions: Vec<QuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            for question in questions {
                tables.question_index.insert(
                    (
                        question.room_id,
                        question.round_number,
                        question.question_number,
                    ),
                    question.id,
                );
                tables.questions.insert(question.id, question);
            }
            Ok(())
        })
    }

    fn find_question(
        &self,
        room_id: Uuid,
        round_number: u32,
        question_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let Some(id) = tables
                .question_index
                .get(&(room_id, round_number, question_number))
                .map(|entry| *entry)
            else {
                return Ok(None);
            };
            Ok(tables.questions.get(&id).map(|entry| entry.clone()))
        })
    }

    fn find_question_by_id(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move { Ok(tables.questions.get(&id).map(|entry| entry.clone())) })
    }

    fn find_submission_by_player(
        &self,
        question_id: Uuid,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<SubmissionEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let Some(id) = tables
                .submission_index
                .get(&(question_id, player_id))
                .map(|entry| *entry)
            else {
                return Ok(None);
            };
            Ok(tables.submissions.get(&id).map(|entry| entry.clone()))
        })
    }

    fn insert_submission(
        &self,
        submission: SubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<LedgerInsert<SubmissionEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            use dashmap::mapref::entry::Entry;

            let key = (submission.question_id, submission.player_id);
            match tables.submission_index.entry(key) {
                Entry::Occupied(_) => Ok(LedgerInsert::Duplicate),
                Entry::Vacant(slot) => {
                    slot.insert(submission.id);
                    tables
                        .question_submissions
                        .entry(submission.question_id)
                        .or_default()
                        .push(submission.id);
                    tables.submissions.insert(submission.id, submission.clone());
                    Ok(LedgerInsert::Inserted(submission))
                }
            }
        })
    }

    fn count_submissions(&self, question_id: Uuid) -> BoxFuture<'static, StorageResult<usize>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            Ok(tables
                .question_submissions
                .get(&question_id)
                .map(|entry| entry.len())
                .unwrap_or(0))
        })
    }

    fn delete_submissions(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<usize>> {
        let tables = self.inner.clone();
        Box::pin(async move { Ok(remove_room_submissions(&tables, room_id)) })
    }

    fn insert_scavenger(
        &self,
        submission: NewScavenger,
    ) -> BoxFuture<'static, StorageResult<LedgerInsert<ScavengerEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let sequence = tables
                .scavenger_sequence
                .entry(submission.question_id)
                .or_insert_with(|| Arc::new(Mutex::new(0)))
                .clone();
            // Serializes order assignment and the duplicate check per
            // question; two concurrent submitters get consecutive orders.
            let mut next_order = sequence.lock().await;

            let key = (submission.question_id, submission.player_id);
            if tables.scavenger_index.contains_key(&key) {
                return Ok(LedgerInsert::Duplicate);
            }

            *next_order += 1;
            let entity = ScavengerEntity {
                id: Uuid::new_v4(),
                room_id: submission.room_id,
                player_id: submission.player_id,
                question_id: submission.question_id,
                submission_order: *next_order,
                approved: None,
                approved_by_host_at: None,
                points_awarded: 0,
                submitted_at: submission.submitted_at,
            };

            tables.scavenger_index.insert(key, entity.id);
            tables
                .question_scavengers
                .entry(entity.question_id)
                .or_default()
                .push(entity.id);
            tables.scavengers.insert(entity.id, entity.clone());
            Ok(LedgerInsert::Inserted(entity))
        })
    }

    fn find_scavenger_by_player(
        &self,
        question_id: Uuid,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ScavengerEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let Some(id) = tables
                .scavenger_index
                .get(&(question_id, player_id))
                .map(|entry| *entry)
            else {
                return Ok(None);
            };
            Ok(tables.scavengers.get(&id).map(|entry| entry.clone()))
        })
    }

    fn find_scavenger(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ScavengerEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move { Ok(tables.scavengers.get(&id).map(|entry| entry.clone())) })
    }

    fn list_scavengers(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScavengerEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let ids = tables
                .question_scavengers
                .get(&question_id)
                .map(|entry| entry.clone())
                .unwrap_or_default();
            let mut rows = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(row) = tables.scavengers.get(&id) {
                    rows.push(row.clone());
                }
            }
            rows.sort_by_key(|row| row.submission_order);
            Ok(rows)
        })
    }

    fn count_scavengers(&self, question_id: Uuid) -> BoxFuture<'static, StorageResult<usize>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            Ok(tables
                .question_scavengers
                .get(&question_id)
                .map(|entry| entry.len())
                .unwrap_or(0))
        })
    }

    fn count_approved_scavengers(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let ids = tables
                .question_scavengers
                .get(&question_id)
                .map(|entry| entry.clone())
                .unwrap_or_default();
            let approved = ids
                .iter()
                .filter(|id| {
                    tables
                        .scavengers
                        .get(id)
                        .is_some_and(|row| row.approved == Some(true))
                })
                .count();
            Ok(approved)
        })
    }

    fn review_scavenger(
        &self,
        id: Uuid,
        approved: bool,
        points_awarded: u32,
        reviewed_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<ScavengerEntity>>> {
        let tables = self.inner.clone();
        Box::pin(async move {
            let Some(mut row) = tables.scavengers.get_mut(&id) else {
                return Ok(None);
            };
            row.approved = Some(approved);
            row.approved_by_host_at = Some(reviewed_at);
            row.points_awarded = points_awarded;
            Ok(Some(row.clone()))
        })
    }

    fn delete_scavengers(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<usize>> {
        let tables = self.inner.clone();
        Box::pin(async move { Ok(remove_room_scavengers(&tables, room_id)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

fn remove_room_players(tables: &Tables, room_id: Uuid) {
    let Some((_, ids)) = tables.room_players.remove(&room_id) else {
        return;
    };
    for id in ids {
        if let Some((_, player)) = tables.players.remove(&id) {
            tables
                .client_index
                .remove(&(player.room_id, player.client_uuid));
        }
    }
}

fn remove_room_questions(tables: &Tables, room_id: Uuid) {
    let ids: Vec<Uuid> = tables
        .questions
        .iter()
        .filter(|entry| entry.room_id == room_id)
        .map(|entry| entry.id)
        .collect();
    for id in ids {
        if let Some((_, question)) = tables.questions.remove(&id) {
            tables.question_index.remove(&(
                question.room_id,
                question.round_number,
                question.question_number,
            ));
        }
    }
}

fn remove_room_submissions(tables: &Tables, room_id: Uuid) -> usize {
    let ids: Vec<Uuid> = tables
        .submissions
        .iter()
        .filter(|entry| entry.room_id == room_id)
        .map(|entry| entry.id)
        .collect();
    for id in &ids {
        if let Some((_, row)) = tables.submissions.remove(id) {
            tables
                .submission_index
                .remove(&(row.question_id, row.player_id));
            if let Some(mut per_question) = tables.question_submissions.get_mut(&row.question_id) {
                per_question.retain(|existing| existing != id);
            }
        }
    }
    ids.len()
}

fn remove_room_scavengers(tables: &Tables, room_id: Uuid) -> usize {
    let ids: Vec<Uuid> = tables
        .scavengers
        .iter()
        .filter(|entry| entry.room_id == room_id)
        .map(|entry| entry.id)
        .collect();
    let mut touched_questions = Vec::new();
    for id in &ids {
        if let Some((_, row)) = tables.scavengers.remove(id) {
            tables
                .scavenger_index
                .remove(&(row.question_id, row.player_id));
            if let Some(mut per_question) = tables.question_scavengers.get_mut(&row.question_id) {
                per_question.retain(|existing| existing != id);
            }
            touched_questions.push(row.question_id);
        }
    }
    // Restart the order sequence for emptied questions so a fresh game
    // starts counting from one again.
    for question_id in touched_questions {
        let emptied = tables
            .question_scavengers
            .get(&question_id)
            .map(|entry| entry.is_empty())
            .unwrap_or(true);
        if emptied {
            tables.scavenger_sequence.remove(&question_id);
        }
    }
    ids.len()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dao::models::GameSettingsEntity;

    fn sample_room(code: &str) -> RoomEntity {
        let now = SystemTime::now();
        RoomEntity {
            id: Uuid::new_v4(),
            room_code: code.to_string(),
            host_key: "k".repeat(32),
            title: "Friday game night".into(),
            settings: GameSettingsEntity::default(),
            game_state: GameStateEntity::lobby(),
            created_at: now,
            last_activity_at: now,
            last_host_ping: None,
            expires_at: now + Duration::from_secs(24 * 3600),
        }
    }

    fn sample_player(room_id: Uuid, client: &str, name: &str) -> PlayerEntity {
        let now = SystemTime::now();
        PlayerEntity {
            id: Uuid::new_v4(),
            room_id,
            client_uuid: client.into(),
            display_name: name.into(),
            connected: true,
            last_seen_at: now,
            points: 0,
            joined_at: now,
        }
    }

    #[tokio::test]
    async fn state_write_rejects_stale_expectation() {
        let store = MemoryRoomStore::new();
        let room = sample_room("AB2345");
        let room_id = room.id;
        store.insert_room(room).await.unwrap();

        let now = SystemTime::now();
        let trivia = GameStateEntity {
            status: PhaseKey::Trivia,
            current_round: 1,
            current_question: 1,
            question_start_time: Some(now),
            scavenger_start_time: None,
        };
        let applied = store
            .update_game_state(room_id, PhaseKey::Lobby, trivia.clone(), now)
            .await
            .unwrap();
        assert!(matches!(applied, StateWrite::Applied(_)));

        // A second writer that still believes the room is in the lobby must
        // be rejected without clobbering the committed state.
        let stale = store
            .update_game_state(room_id, PhaseKey::Lobby, trivia, now)
            .await
            .unwrap();
        assert_eq!(
            stale,
            StateWrite::Stale {
                actual: PhaseKey::Trivia
            }
        );
    }

    #[tokio::test]
    async fn state_write_reports_missing_room() {
        let store = MemoryRoomStore::new();
        let outcome = store
            .update_game_state(
                Uuid::new_v4(),
                PhaseKey::Lobby,
                GameStateEntity::lobby(),
                SystemTime::now(),
            )
            .await
            .unwrap();
        assert_eq!(outcome, StateWrite::Missing);
    }

    #[tokio::test]
    async fn duplicate_answer_is_rejected() {
        let store = MemoryRoomStore::new();
        let room = sample_room("CD6789");
        let player = sample_player(room.id, "client-1", "Ada");
        let question_id = Uuid::new_v4();
        store.insert_room(room.clone()).await.unwrap();
        store.insert_player(player.clone()).await.unwrap();

        let submission = SubmissionEntity {
            id: Uuid::new_v4(),
            room_id: room.id,
            player_id: player.id,
            question_id,
            answer_choice_id: "a".into(),
            answer_time_ms: 1200,
            is_correct: true,
            points_awarded: 98,
            answered_at: SystemTime::now(),
        };
        let first = store.insert_submission(submission.clone()).await.unwrap();
        assert!(matches!(first, LedgerInsert::Inserted(_)));

        let second = store
            .insert_submission(SubmissionEntity {
                id: Uuid::new_v4(),
                ..submission
            })
            .await
            .unwrap();
        assert_eq!(second, LedgerInsert::Duplicate);
        assert_eq!(store.count_submissions(question_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_scavengers_get_consecutive_orders() {
        let store = MemoryRoomStore::new();
        let room = sample_room("EF2345");
        let question_id = Uuid::new_v4();
        store.insert_room(room.clone()).await.unwrap();

        let mut handles = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            let room_id = room.id;
            handles.push(tokio::spawn(async move {
                store
                    .insert_scavenger(NewScavenger {
                        room_id,
                        player_id: Uuid::new_v4(),
                        question_id,
                        submitted_at: SystemTime::now() + Duration::from_millis(n),
                    })
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            assert!(matches!(
                handle.await.unwrap(),
                LedgerInsert::Inserted(_)
            ));
        }

        let mut orders: Vec<u32> = store
            .list_scavengers(question_id)
            .await
            .unwrap()
            .iter()
            .map(|row| row.submission_order)
            .collect();
        orders.sort_unstable();
        assert_eq!(orders, (1..=8).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn duplicate_scavenger_is_rejected() {
        let store = MemoryRoomStore::new();
        let room = sample_room("GH6789");
        let player_id = Uuid::new_v4();
        let question_id = Uuid::new_v4();
        store.insert_room(room.clone()).await.unwrap();

        let submission = NewScavenger {
            room_id: room.id,
            player_id,
            question_id,
            submitted_at: SystemTime::now(),
        };
        assert!(matches!(
            store.insert_scavenger(submission.clone()).await.unwrap(),
            LedgerInsert::Inserted(_)
        ));
        assert_eq!(
            store.insert_scavenger(submission).await.unwrap(),
            LedgerInsert::Duplicate
        );
    }

    #[tokio::test]
    async fn increments_are_atomic_across_tasks() {
        let store = MemoryRoomStore::new();
        let room = sample_room("JK2345");
        let player = sample_player(room.id, "client-1", "Grace");
        store.insert_room(room).await.unwrap();
        store.insert_player(player.clone()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            let id = player.id;
            handles.push(tokio::spawn(
                async move { store.increment_points(id, 3).await },
            ));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let updated = store.find_player(player.id).await.unwrap().unwrap();
        assert_eq!(updated.points, 150);
    }

    #[tokio::test]
    async fn expired_rooms_are_swept_with_dependents() {
        let store = MemoryRoomStore::new();
        let mut room = sample_room("LM6789");
        room.expires_at = SystemTime::now() - Duration::from_secs(60);
        let player = sample_player(room.id, "client-1", "Lin");
        store.insert_room(room.clone()).await.unwrap();
        store.insert_player(player).await.unwrap();

        let deleted = store
            .delete_rooms_expired_before(SystemTime::now())
            .await
            .unwrap();
        assert_eq!(deleted, vec!["LM6789".to_string()]);
        assert!(
            store
                .find_room_by_code("LM6789".into())
                .await
                .unwrap()
                .is_none()
        );
        assert!(store.list_players(room.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejoin_updates_presence_in_place() {
        let store = MemoryRoomStore::new();
        let room = sample_room("NP2345");
        let player = sample_player(room.id, "client-1", "Sam");
        store.insert_room(room.clone()).await.unwrap();
        store.insert_player(player.clone()).await.unwrap();

        store
            .update_player_presence(player.id, false, None, SystemTime::now())
            .await
            .unwrap();
        let rejoined = store
            .update_player_presence(player.id, true, Some("Sammy".into()), SystemTime::now())
            .await
            .unwrap()
            .unwrap();

        assert!(rejoined.connected);
        assert_eq!(rejoined.display_name, "Sammy");
        assert_eq!(store.list_players(room.id).await.unwrap().len(), 1);
    }
}
