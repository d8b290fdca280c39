//! Host liveness: the ping endpoint hosts hit on a fixed cadence and the
//! threshold players use to decide the host has gone away.

use std::time::{Duration, SystemTime};

use crate::{
    dao::models::PhaseKey,
    error::ServiceError,
    services::room_service,
    state::SharedState,
};

/// Cadence at which a host session emits liveness pings. The coordinator
/// also pings right before each transition so the write itself never reads
/// as a disconnect.
pub const HOST_PING_INTERVAL: Duration = Duration::from_millis(3000);

/// Silence longer than this during an active phase marks the host offline.
pub const HOST_OFFLINE_THRESHOLD: Duration = Duration::from_millis(10_000);

/// Record a host liveness ping.
pub async fn host_ping(
    state: &SharedState,
    room_code: &str,
    host_key: &str,
) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::find_room(state, room_code).await?;
    if room.host_key != host_key {
        return Err(ServiceError::Unauthorized("host key mismatch".into()));
    }
    store.touch_host_ping(room.id, SystemTime::now()).await?;
    Ok(())
}

/// Record a player heartbeat or an explicit disconnect.
///
/// Connected-player counts feed the auto-advance comparisons, so players
/// marking themselves disconnected lowers the bar for "all accounted for".
pub async fn player_presence(
    state: &SharedState,
    room_code: &str,
    player_id: uuid::Uuid,
    connected: bool,
) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::find_room(state, room_code).await?;

    let player = store
        .find_player(player_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("player not found".into()))?;
    if player.room_id != room.id {
        return Err(ServiceError::NotFound("player not found".into()));
    }

    store
        .update_player_presence(player_id, connected, None, SystemTime::now())
        .await?;

    if player.connected != connected {
        if let Ok(snapshot) = room_service::room_snapshot(state, &room).await {
            crate::services::sse_events::broadcast_room_changed(state, &snapshot);
        }
    }
    Ok(())
}

/// Whether the host counts as present.
///
/// Outside active phases (lobby, finished) there is no liveness expectation;
/// players only suspend their phase UI when a running game loses its host.
/// This is a client-side posture: it never pauses the state machine itself.
pub fn host_online(last_ping: Option<SystemTime>, status: PhaseKey, now: SystemTime) -> bool {
    if !status.is_active() {
        return true;
    }
    match last_ping {
        Some(ping) => now
            .duration_since(ping)
            .map(|silence| silence <= HOST_OFFLINE_THRESHOLD)
            // A ping timestamped ahead of our clock still counts as fresh.
            .unwrap_or(true),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lobby_and_finished_never_report_offline() {
        let now = SystemTime::now();
        assert!(host_online(None, PhaseKey::Lobby, now));
        assert!(host_online(None, PhaseKey::Finished, now));
        assert!(host_online(
            Some(now - Duration::from_secs(3600)),
            PhaseKey::Lobby,
            now
        ));
    }

    #[test]
    fn active_phase_applies_the_threshold() {
        let now = SystemTime::now();
        assert!(host_online(
            Some(now - Duration::from_millis(9_999)),
            PhaseKey::Trivia,
            now
        ));
        assert!(!host_online(
            Some(now - Duration::from_millis(10_001)),
            PhaseKey::Trivia,
            now
        ));
        assert!(!host_online(None, PhaseKey::Scavenger, now));
    }

    #[test]
    fn future_pings_count_as_fresh() {
        let now = SystemTime::now();
        assert!(host_online(
            Some(now + Duration::from_secs(2)),
            PhaseKey::Review,
            now
        ));
    }

    #[tokio::test]
    async fn player_presence_flips_the_connected_flag() {
        use std::sync::Arc;

        use crate::config::AppConfig;
        use crate::dao::room_store::memory::MemoryRoomStore;
        use crate::dto::room::{CreateRoomRequest, GameSettingsInput, JoinRoomRequest};
        use crate::state::AppState;

        let state = AppState::new(AppConfig::default());
        state
            .install_room_store(Arc::new(MemoryRoomStore::new()))
            .await;

        let created = room_service::create_room(
            &state,
            CreateRoomRequest {
                title: "Presence test".into(),
                settings: GameSettingsInput::default(),
                questions: None,
            },
        )
        .await
        .unwrap();
        let code = created.room.room_code;

        let joined = room_service::join_room(
            &state,
            &code,
            JoinRoomRequest {
                display_name: "Ada".into(),
                client_uuid: "device-1".into(),
            },
        )
        .await
        .unwrap();

        player_presence(&state, &code, joined.player.id, false)
            .await
            .unwrap();
        let snapshot = room_service::get_room(&state, &code).await.unwrap();
        assert!(!snapshot.players[0].connected);

        player_presence(&state, &code, joined.player.id, true)
            .await
            .unwrap();
        let snapshot = room_service::get_room(&state, &code).await.unwrap();
        assert!(snapshot.players[0].connected);
    }
}
