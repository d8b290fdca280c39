pub mod memory;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    GameStateEntity, PhaseKey, PlayerEntity, QuestionEntity, RoomEntity, ScavengerEntity,
    SubmissionEntity,
};
use crate::dao::storage::StorageResult;

/// Outcome of a compare-and-swap game-state write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateWrite {
    /// The expected tag matched; the room now carries the new state.
    Applied(Box<RoomEntity>),
    /// The persisted tag had already moved on; nothing was written.
    Stale {
        /// Tag actually found in storage.
        actual: PhaseKey,
    },
    /// No room with the given id exists.
    Missing,
}

/// Outcome of inserting into a ledger with a per-(player, question)
/// uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerInsert<T> {
    /// Row accepted.
    Inserted(T),
    /// A row for the same (player, question) already exists.
    Duplicate,
}

/// Fields supplied when appending a scavenger submission; the store assigns
/// `submission_order` from an atomic per-question sequence so two concurrent
/// submissions can never observe the same order.
#[derive(Debug, Clone)]
pub struct NewScavenger {
    /// Room the submission belongs to.
    pub room_id: Uuid,
    /// Submitting player.
    pub player_id: Uuid,
    /// Question whose challenge this answers.
    pub question_id: Uuid,
    /// Arrival timestamp.
    pub submitted_at: SystemTime,
}

/// Abstraction over the authoritative record store shared by every client.
///
/// The game treats persistence as a generic transactional key/value surface:
/// lookups by code or id, a conditional state write, atomic score
/// increments, and aggregate counts. Engine internals are out of scope.
pub trait RoomStore: Send + Sync {
    /// Persist a freshly created room.
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look a room up by primary key.
    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Look a room up by its join code (case-sensitive, stored uppercase).
    fn find_room_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Replace the room's game state iff the persisted phase tag still equals
    /// `expected`. Also bumps `last_activity_at`.
    fn update_game_state(
        &self,
        room_id: Uuid,
        expected: PhaseKey,
        next: GameStateEntity,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<StateWrite>>;
    /// Record a host liveness ping.
    fn touch_host_ping(
        &self,
        room_id: Uuid,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete rooms whose `expires_at` lies before `cutoff`, returning the
    /// codes of the removed rooms (dependent rows go with them).
    fn delete_rooms_expired_before(
        &self,
        cutoff: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<String>>>;

    /// Players of a room in join order.
    fn list_players(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    /// Look a player up by primary key.
    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Look a player up by device identity within a room.
    fn find_player_by_client(
        &self,
        room_id: Uuid,
        client_uuid: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Persist a new player row.
    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Update connection status (and optionally the display name) of an
    /// existing player, returning the updated row.
    fn update_player_presence(
        &self,
        player_id: Uuid,
        connected: bool,
        display_name: Option<String>,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Reset every player's points in a room to zero.
    fn reset_points(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<()>>;
    /// Atomically add `delta` to a player's points, returning the updated
    /// row. This is the only sanctioned way to change a score.
    fn increment_points(
        &self,
        player_id: Uuid,
        delta: u32,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;

    /// Persist the question deck of a room.
    fn insert_questions(
        &self,
        questions: Vec<QuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Look a question up by (room, round, number).
    fn find_question(
        &self,
        room_id: Uuid,
        round_number: u32,
        question_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    /// Look a question up by primary key.
    fn find_question_by_id(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;

    /// Look up a player's trivia answer for a question, if any. Backs the
    /// client-side duplicate-submission check.
    fn find_submission_by_player(
        &self,
        question_id: Uuid,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<SubmissionEntity>>>;
    /// Append a trivia answer; at most one per (player, question).
    fn insert_submission(
        &self,
        submission: SubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<LedgerInsert<SubmissionEntity>>>;
    /// Number of trivia answers recorded for a question.
    fn count_submissions(&self, question_id: Uuid) -> BoxFuture<'static, StorageResult<usize>>;
    /// Drop every trivia answer of a room (fresh-game reset).
    fn delete_submissions(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<usize>>;

    /// Append a scavenger submission; at most one per (player, question);
    /// the store assigns the arrival order atomically.
    fn insert_scavenger(
        &self,
        submission: NewScavenger,
    ) -> BoxFuture<'static, StorageResult<LedgerInsert<ScavengerEntity>>>;
    /// Look up a player's scavenger submission for a question, if any.
    fn find_scavenger_by_player(
        &self,
        question_id: Uuid,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ScavengerEntity>>>;
    /// Look a scavenger submission up by primary key.
    fn find_scavenger(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ScavengerEntity>>>;
    /// Scavenger submissions for a question, ordered by arrival.
    fn list_scavengers(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScavengerEntity>>>;
    /// Number of scavenger submissions recorded for a question.
    fn count_scavengers(&self, question_id: Uuid) -> BoxFuture<'static, StorageResult<usize>>;
    /// Number of already-approved scavenger submissions for a question.
    fn count_approved_scavengers(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<usize>>;
    /// Record the host's verdict and the points computed for it.
    fn review_scavenger(
        &self,
        id: Uuid,
        approved: bool,
        points_awarded: u32,
        reviewed_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<ScavengerEntity>>>;
    /// Drop every scavenger submission of a room (fresh-game reset).
    fn delete_scavengers(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<usize>>;

    /// Probe backend connectivity.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a lost backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
