use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use shiritori_core::GenreDictionary;
use shiritori_types::{RoomInfo, RoomSettings};

use crate::room::{GameOverHook, Room};

/// How often the cleanup task checks for empty rooms.
pub const ROOM_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);
/// How long a room can stay empty before being removed.
pub const ROOM_MAX_EMPTY_AGE: Duration = Duration::from_secs(5 * 60);

const ROOM_ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ROOM_ID_LEN: usize = 6;

/// Registry of all active rooms plus the global player-name index used to
/// refuse duplicate names across connections.
pub struct RoomManager {
    rooms: RwLock<HashMap<String, Arc<Room>>>,
    /// player name -> room ID
    player_rooms: RwLock<HashMap<String, String>>,
    genres: Arc<GenreDictionary>,
    on_game_over: Option<GameOverHook>,
    cleanup: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl RoomManager {
    pub fn new(genres: Arc<GenreDictionary>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            player_rooms: RwLock::new(HashMap::new()),
            genres,
            on_game_over: None,
            cleanup: std::sync::Mutex::new(None),
        }
    }

    /// Installs the callback run on every game over (e.g. the result
    /// archiver's entry point).
    pub fn with_game_over_hook(mut self, hook: GameOverHook) -> Self {
        self.on_game_over = Some(hook);
        self
    }

    /// Creates a room with a fresh 6-character id and the given owner.
    pub async fn create_room(&self, owner: &str, settings: RoomSettings) -> Arc<Room> {
        let mut rooms = self.rooms.write().await;
        let id = loop {
            let candidate = generate_room_id();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let room = Room::new(
            id.clone(),
            owner.to_string(),
            settings,
            self.genres.clone(),
            self.on_game_over.clone(),
        );
        rooms.insert(id, room.clone());
        room
    }

    pub async fn get_room(&self, id: &str) -> Option<Arc<Room>> {
        self.rooms.read().await.get(id).cloned()
    }

    pub async fn remove_room(&self, id: &str) {
        self.rooms.write().await.remove(id);
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Snapshot of all non-private rooms for the lobby.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let rooms: Vec<Arc<Room>> = self.rooms.read().await.values().cloned().collect();
        let mut list = Vec::with_capacity(rooms.len());
        for room in rooms {
            if let Some(info) = room.listing().await {
                list.push(info);
            }
        }
        list
    }

    /// Records that a player name is occupied by a room.
    pub async fn track_player(&self, name: &str, room_id: &str) {
        self.player_rooms
            .write()
            .await
            .insert(name.to_string(), room_id.to_string());
    }

    pub async fn untrack_player(&self, name: &str) {
        self.player_rooms.write().await.remove(name);
    }

    /// The room a player name is currently in, if any.
    pub async fn player_room_id(&self, name: &str) -> Option<String> {
        self.player_rooms.read().await.get(name).cloned()
    }

    /// Launches the background sweeper that removes rooms left empty for
    /// longer than `max_empty_age`.
    pub fn start_cleanup(self: &Arc<Self>, interval: Duration, max_empty_age: Duration) {
        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(
                tokio::time::Instant::now() + interval,
                interval,
            );
            loop {
                ticker.tick().await;
                manager.cleanup_empty_rooms(max_empty_age).await;
            }
        });
        let mut slot = self.cleanup.lock().expect("cleanup lock poisoned");
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    /// Stops the sweeper. Idempotent.
    pub fn stop_cleanup(&self) {
        let mut slot = self.cleanup.lock().expect("cleanup lock poisoned");
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    /// Removes rooms whose `empty_since` is older than `max_age`.
    pub async fn cleanup_empty_rooms(&self, max_age: Duration) {
        let rooms: Vec<(String, Arc<Room>)> = self
            .rooms
            .read()
            .await
            .iter()
            .map(|(id, room)| (id.clone(), room.clone()))
            .collect();

        for (id, room) in rooms {
            if room.empty_longer_than(max_age).await {
                self.rooms.write().await.remove(&id);
                info!("room cleaned up (empty timeout): roomId={}", id);
            }
        }
    }
}

fn generate_room_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ROOM_ID_LEN)
        .map(|_| ROOM_ID_CHARS[rng.gen_range(0..ROOM_ID_CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn manager() -> Arc<RoomManager> {
        Arc::new(RoomManager::new(Arc::new(GenreDictionary::builtin())))
    }

    fn outbox() -> mpsc::Sender<String> {
        mpsc::channel(crate::room::OUTBOX_CAPACITY).0
    }

    #[tokio::test]
    async fn room_ids_are_six_lowercase_alphanumerics() {
        for _ in 0..50 {
            let id = generate_room_id();
            assert_eq!(id.len(), ROOM_ID_LEN);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn create_get_remove_roundtrip() {
        let rm = manager();
        let room = rm.create_room("alice", RoomSettings::default()).await;
        assert!(rm.get_room(&room.id).await.is_some());
        assert_eq!(rm.room_count().await, 1);
        rm.remove_room(&room.id).await;
        assert!(rm.get_room(&room.id).await.is_none());
        assert_eq!(rm.room_count().await, 0);
    }

    #[tokio::test]
    async fn private_rooms_are_hidden_from_listing() {
        let rm = manager();
        rm.create_room(
            "alice",
            RoomSettings {
                name: "public".to_string(),
                ..Default::default()
            },
        )
        .await;
        rm.create_room(
            "bob",
            RoomSettings {
                name: "secret".to_string(),
                private: true,
                ..Default::default()
            },
        )
        .await;

        let list = rm.list_rooms().await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "public");
        assert_eq!(list[0].max_players, 8);
    }

    #[tokio::test]
    async fn name_index_tracks_presence() {
        let rm = manager();
        rm.track_player("alice", "abc123").await;
        assert_eq!(rm.player_room_id("alice").await.as_deref(), Some("abc123"));
        rm.untrack_player("alice").await;
        assert_eq!(rm.player_room_id("alice").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_removes_only_stale_empty_rooms() {
        let rm = manager();

        // becomes empty now, then ages past the grace window
        let old_empty = rm.create_room("alice", RoomSettings::default()).await;
        old_empty.seat_creator("alice", outbox()).await;
        old_empty.leave("alice").await;

        tokio::time::advance(Duration::from_secs(6 * 60)).await;

        // becomes empty only one minute ago
        let new_empty = rm.create_room("bob", RoomSettings::default()).await;
        new_empty.seat_creator("bob", outbox()).await;
        new_empty.leave("bob").await;
        tokio::time::advance(Duration::from_secs(60)).await;

        // still occupied
        let active = rm.create_room("carol", RoomSettings::default()).await;
        active.seat_creator("carol", outbox()).await;

        rm.cleanup_empty_rooms(ROOM_MAX_EMPTY_AGE).await;

        assert!(rm.get_room(&old_empty.id).await.is_none());
        assert!(rm.get_room(&new_empty.id).await.is_some());
        assert!(rm.get_room(&active.id).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn rejoining_clears_empty_since() {
        let rm = manager();
        let room = rm.create_room("alice", RoomSettings::default()).await;
        room.seat_creator("alice", outbox()).await;
        room.leave("alice").await;

        tokio::time::advance(Duration::from_secs(4 * 60)).await;
        room.seat_player("bob", outbox()).await.unwrap();
        tokio::time::advance(Duration::from_secs(10 * 60)).await;

        rm.cleanup_empty_rooms(ROOM_MAX_EMPTY_AGE).await;
        assert!(rm.get_room(&room.id).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweeper_runs_and_stops() {
        let rm = manager();
        let room = rm.create_room("alice", RoomSettings::default()).await;
        room.seat_creator("alice", outbox()).await;
        room.leave("alice").await;

        rm.start_cleanup(Duration::from_secs(60), ROOM_MAX_EMPTY_AGE);
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(7 * 60)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(rm.get_room(&room.id).await.is_none());

        rm.stop_cleanup();
        rm.stop_cleanup(); // double stop is safe
    }
}
