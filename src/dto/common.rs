use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{GameSettingsEntity, GameStateEntity, PlayerEntity, RoomEntity},
    dto::{format_system_time, phase::GameStatus},
};

/// Wire form of a room's game state.
///
/// Timer anchors are absolute RFC 3339 timestamps: a late-joining client
/// computes remaining time locally instead of waiting for a "start" event.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct GameStateSnapshot {
    /// Current phase.
    pub status: GameStatus,
    /// 1-based round counter; zero outside rounds.
    pub current_round: u32,
    /// 1-based question counter; zero outside questions.
    pub current_question: u32,
    /// Anchor of the running trivia timer, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_start_time: Option<String>,
    /// Anchor of the running scavenger timer, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scavenger_start_time: Option<String>,
}

impl From<&GameStateEntity> for GameStateSnapshot {
    fn from(state: &GameStateEntity) -> Self {
        Self {
            status: state.status.into(),
            current_round: state.current_round,
            current_question: state.current_question,
            question_start_time: state.question_start_time.map(format_system_time),
            scavenger_start_time: state.scavenger_start_time.map(format_system_time),
        }
    }
}

/// Game settings exposed back to clients.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct GameSettingsSnapshot {
    /// Total number of rounds.
    pub number_of_rounds: u32,
    /// Questions played per round.
    pub questions_per_round: u32,
    /// Trivia time limit in seconds.
    pub time_per_trivia_question: u64,
    /// Scavenger time limit in seconds.
    pub time_per_scavenger: u64,
    /// Base points for a correct trivia answer.
    pub trivia_base_point: u32,
    /// Whether faster answers earn more.
    pub trivia_time_scaling: bool,
    /// Points for the first approved scavenger submission.
    pub points_for_first_scavenger: u32,
    /// Points for later approved submissions.
    pub points_for_other_approved_scavengers: u32,
    /// Consolation points for rejections.
    pub points_for_rejected_scavengers: u32,
}

impl From<&GameSettingsEntity> for GameSettingsSnapshot {
    fn from(settings: &GameSettingsEntity) -> Self {
        Self {
            number_of_rounds: settings.number_of_rounds,
            questions_per_round: settings.questions_per_round,
            time_per_trivia_question: settings.time_per_trivia_question,
            time_per_scavenger: settings.time_per_scavenger,
            trivia_base_point: settings.trivia_base_point,
            trivia_time_scaling: settings.trivia_time_scaling,
            points_for_first_scavenger: settings.points_for_first_scavenger,
            points_for_other_approved_scavengers: settings.points_for_other_approved_scavengers,
            points_for_rejected_scavengers: settings.points_for_rejected_scavengers,
        }
    }
}

/// Public projection of a player.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct PlayerSummary {
    /// Player id.
    pub id: Uuid,
    /// Display name, unique within the room.
    pub display_name: String,
    /// Whether the player currently has a live session.
    pub connected: bool,
    /// Running score.
    pub points: u32,
    /// When the player first joined.
    pub joined_at: String,
}

impl From<PlayerEntity> for PlayerSummary {
    fn from(player: PlayerEntity) -> Self {
        Self {
            id: player.id,
            display_name: player.display_name,
            connected: player.connected,
            points: player.points,
            joined_at: format_system_time(player.joined_at),
        }
    }
}

/// Full room snapshot: the one payload both the polling fallback and the SSE
/// feed deliver, so clients apply state identically regardless of channel.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct RoomSnapshot {
    /// Room id.
    pub id: Uuid,
    /// Human-shareable join code.
    pub room_code: String,
    /// Display title.
    pub title: String,
    /// Immutable game configuration.
    pub settings: GameSettingsSnapshot,
    /// Current state-machine record.
    pub game_state: GameStateSnapshot,
    /// Last host liveness ping, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_host_ping: Option<String>,
    /// Whether the host pinged recently enough to be considered present.
    pub host_online: bool,
    /// Players sorted by points, descending.
    pub players: Vec<PlayerSummary>,
}

impl RoomSnapshot {
    /// Assemble the snapshot from the persisted room and its players.
    ///
    /// `host_online` is precomputed by the caller because it depends on the
    /// current wall clock.
    pub fn new(room: &RoomEntity, players: Vec<PlayerEntity>, host_online: bool) -> Self {
        let mut players: Vec<PlayerSummary> = players.into_iter().map(Into::into).collect();
        players.sort_by(|a, b| b.points.cmp(&a.points));

        Self {
            id: room.id,
            room_code: room.room_code.clone(),
            title: room.title.clone(),
            settings: (&room.settings).into(),
            game_state: (&room.game_state).into(),
            last_host_ping: room.last_host_ping.map(format_system_time),
            host_online,
            players,
        }
    }
}

/// One row of the standings.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct LeaderboardEntry {
    /// Player id.
    pub player_id: Uuid,
    /// Display name.
    pub display_name: String,
    /// Score.
    pub points: u32,
    /// 1-based rank, ties broken by join order.
    pub rank: u32,
}

/// Standings computed from a player list.
pub fn leaderboard(players: Vec<PlayerEntity>) -> Vec<LeaderboardEntry> {
    let mut players = players;
    players.sort_by(|a, b| b.points.cmp(&a.points));
    players
        .into_iter()
        .enumerate()
        .map(|(index, player)| LeaderboardEntry {
            player_id: player.id,
            display_name: player.display_name,
            points: player.points,
            rank: index as u32 + 1,
        })
        .collect()
}
