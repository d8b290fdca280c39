use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

use crate::dto::sse::ServerEvent;

/// Broadcast capacity per room stream; laggards skip missed events and
/// resynchronize from the next snapshot.
const CHANNEL_CAPACITY: usize = 16;

/// Registry of per-room SSE channels, created lazily on first use.
#[derive(Default)]
pub struct RoomHubs {
    rooms: DashMap<String, Arc<RoomChannels>>,
}

impl RoomHubs {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Channels for a room, creating them on first subscription.
    pub fn channels(&self, room_code: &str) -> Arc<RoomChannels> {
        self.rooms
            .entry(room_code.to_string())
            .or_insert_with(|| Arc::new(RoomChannels::new()))
            .clone()
    }

    /// Channels for a room, without creating them.
    pub fn existing(&self, room_code: &str) -> Option<Arc<RoomChannels>> {
        self.rooms.get(room_code).map(|entry| entry.clone())
    }

    /// Drop the channels of a deleted room. Live subscribers see their
    /// stream end once the last sender clone goes away.
    pub fn remove(&self, room_code: &str) {
        self.rooms.remove(room_code);
    }
}

/// The two event streams of one room: the public feed every client follows
/// and the host feed that also owns the auto-advance coordinator.
pub struct RoomChannels {
    public: SseHub,
    host: HostChannel,
}

impl RoomChannels {
    fn new() -> Self {
        Self {
            public: SseHub::new(CHANNEL_CAPACITY),
            host: HostChannel::new(CHANNEL_CAPACITY),
        }
    }

    /// Hub fanning out events to every connected client of the room.
    pub fn public(&self) -> &SseHub {
        &self.public
    }

    /// Host-only channel bundle.
    pub fn host(&self) -> &HostChannel {
        &self.host
    }
}

/// Host-only stream state: its hub plus the single active host session.
pub struct HostChannel {
    hub: SseHub,
    session: Mutex<Option<HostSession>>,
}

impl HostChannel {
    fn new(capacity: usize) -> Self {
        Self {
            hub: SseHub::new(capacity),
            session: Mutex::new(None),
        }
    }

    /// Hub for host-only events.
    pub fn hub(&self) -> &SseHub {
        &self.hub
    }

    /// Slot guarding the single active host stream per room.
    pub fn session(&self) -> &Mutex<Option<HostSession>> {
        &self.session
    }
}

/// An attached host stream: its token and the coordinator task spawned for
/// it. Dropping the session aborts the coordinator.
pub struct HostSession {
    /// Token identifying this attachment.
    pub token: String,
    /// The auto-advance polling loop bound to this host connection.
    pub coordinator: JoinHandle<()>,
}

impl Drop for HostSession {
    fn drop(&mut self) {
        self.coordinator.abort();
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}
