use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use shiritori_core::kana_row_names;
use shiritori_types::{ClientMessage, RoomSettings, ServerMessage};

use crate::room::{Room, StartGameError};
use crate::room_manager::RoomManager;
use crate::websocket::rate_limiter::ConnectionRateLimiter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message types the dispatcher understands. Anything else is answered with
/// an `unknown message type` error.
const KNOWN_TYPES: &[&str] = &[
    "get_rooms",
    "get_genres",
    "create_room",
    "join",
    "leave_room",
    "start_game",
    "answer",
    "vote",
    "challenge",
    "rebuttal",
    "withdraw_challenge",
    "ping",
];

/// One logical client session: the display name once declared, the current
/// room, and the connection's rate limiter. The outbox is shared with the
/// writer task and handed to rooms on join.
pub struct Session {
    id: ConnectionId,
    rooms: Arc<RoomManager>,
    outbox: mpsc::Sender<String>,
    player_name: Option<String>,
    current_room: Option<Arc<Room>>,
    limiter: ConnectionRateLimiter,
}

impl Session {
    pub fn new(id: ConnectionId, rooms: Arc<RoomManager>, outbox: mpsc::Sender<String>) -> Self {
        Self {
            id,
            rooms,
            outbox,
            player_name: None,
            current_room: None,
            limiter: ConnectionRateLimiter::new(),
        }
    }

    /// Handles one inbound text frame. Returns true when the session must
    /// disconnect (protocol error or rate-limit escalation).
    pub async fn handle_text(&mut self, text: &str) -> bool {
        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                warn!("invalid message from {}: {}", self.id, e);
                return true;
            }
        };
        let msg_type = value
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string();

        let (allowed, should_disconnect) = self.limiter.allow(&msg_type);
        if !allowed {
            if should_disconnect {
                warn!(
                    "rate limit exceeded, disconnecting: connection={} type={}",
                    self.id, msg_type
                );
                self.send_err("レート制限を超過しました。接続を切断します。");
                return true;
            }
            self.send_err("操作が速すぎます。少し待ってからやり直してください。");
            return false;
        }

        if !KNOWN_TYPES.contains(&msg_type.as_str()) {
            self.send_err(&format!("unknown message type: {}", msg_type));
            return false;
        }

        let msg: ClientMessage = match serde_json::from_value(value) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("malformed {} message from {}: {}", msg_type, self.id, e);
                return true;
            }
        };

        match msg {
            ClientMessage::GetRooms => self.handle_get_rooms().await,
            ClientMessage::GetGenres => self.handle_get_genres(),
            ClientMessage::CreateRoom { name, settings } => {
                self.handle_create_room(name, settings).await
            }
            ClientMessage::Join { name, room_id } => self.handle_join(name, room_id).await,
            ClientMessage::LeaveRoom => self.leave_current_room().await,
            ClientMessage::StartGame { settings } => self.handle_start_game(settings).await,
            ClientMessage::Answer { word } => self.handle_answer(&word).await,
            ClientMessage::Vote { accept } => self.handle_vote(accept).await,
            ClientMessage::Challenge => self.handle_challenge().await,
            ClientMessage::Rebuttal { rebuttal } => self.handle_rebuttal(&rebuttal).await,
            ClientMessage::WithdrawChallenge => self.handle_withdraw_challenge().await,
            ClientMessage::Ping => self.send(&ServerMessage::Pong),
        }
        false
    }

    fn send(&self, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => {
                let _ = self.outbox.try_send(json);
            }
            Err(e) => warn!("failed to serialize message for {}: {:?}", self.id, e),
        }
    }

    fn send_err(&self, message: &str) {
        self.send(&ServerMessage::error(message));
    }

    async fn handle_get_rooms(&self) {
        let rooms = self.rooms.list_rooms().await;
        self.send(&ServerMessage::Rooms { rooms });
    }

    fn handle_get_genres(&self) {
        self.send(&ServerMessage::Genres {
            kana_rows: kana_row_names(),
        });
    }

    /// True when the declared name is free, or occupied by this very session
    /// re-entering its own room.
    async fn name_is_available(&self, name: &str) -> bool {
        let Some(existing_room_id) = self.rooms.player_room_id(name).await else {
            return true;
        };
        self.player_name.as_deref() == Some(name)
            && self
                .current_room
                .as_ref()
                .is_some_and(|room| room.id == existing_room_id)
    }

    async fn handle_create_room(&mut self, name: Option<String>, settings: Option<RoomSettings>) {
        let (Some(name), Some(settings)) = (name, settings) else {
            self.send_err("名前とルーム設定が必要です");
            return;
        };
        if !self.name_is_available(&name).await {
            self.send_err(&format!("「{}」は既に別のルームに参加しています", name));
            return;
        }

        self.leave_current_room().await;

        let room = self.rooms.create_room(&name, settings).await;
        room.seat_creator(&name, self.outbox.clone()).await;
        self.rooms.track_player(&name, &room.id).await;
        info!("room created: roomId={} player={}", room.id, name);

        self.player_name = Some(name);
        self.current_room = Some(room);
    }

    async fn handle_join(&mut self, name: Option<String>, room_id: Option<String>) {
        let (Some(name), Some(room_id)) = (name, room_id) else {
            self.send_err("名前とルームIDが必要です");
            return;
        };
        if !self.name_is_available(&name).await {
            self.send_err(&format!("「{}」は既に別のルームに参加しています", name));
            return;
        }
        let Some(room) = self.rooms.get_room(&room_id).await else {
            self.send_err(&format!("ルームが見つかりません: {}", room_id));
            return;
        };

        self.leave_current_room().await;

        if let Err(message) = room.seat_player(&name, self.outbox.clone()).await {
            self.send_err(&message);
            return;
        }
        self.rooms.track_player(&name, &room.id).await;
        info!("player joined: roomId={} player={}", room.id, name);

        self.player_name = Some(name);
        self.current_room = Some(room);
    }

    /// Removes this session's player from their room, notifying the
    /// remainder. The declared name survives for re-join identity checks.
    pub async fn leave_current_room(&mut self) {
        let Some(room) = self.current_room.take() else {
            return;
        };
        let Some(name) = self.player_name.clone() else {
            return;
        };
        room.leave(&name).await;
        self.rooms.untrack_player(&name).await;
    }

    async fn handle_start_game(&mut self, settings: Option<RoomSettings>) {
        let Some((room, name)) = self.room_and_name() else {
            self.send_err("ルームに参加していません");
            return;
        };
        match room.start_game(&name, settings).await {
            Ok(()) => {}
            Err(StartGameError::User(message)) => self.send_err(&message),
            Err(StartGameError::Internal(message)) => {
                warn!("start game failed: roomId={} error={}", room.id, message);
            }
        }
    }

    async fn handle_answer(&mut self, word: &str) {
        let Some((room, name)) = self.room_and_name() else {
            self.send_err("ルームに参加していません");
            return;
        };
        room.submit_word(&name, word).await;
    }

    async fn handle_vote(&mut self, accept: Option<bool>) {
        let Some((room, name)) = self.room_and_name() else {
            self.send_err("ルームに参加していません");
            return;
        };
        let Some(accept) = accept else {
            self.send_err("投票内容が必要です");
            return;
        };
        room.cast_vote(&name, accept).await;
    }

    async fn handle_challenge(&mut self) {
        let Some((room, name)) = self.room_and_name() else {
            self.send_err("ルームに参加していません");
            return;
        };
        if let Err(message) = room.start_challenge(&name).await {
            self.send_err(&message);
        }
    }

    async fn handle_rebuttal(&mut self, rebuttal: &str) {
        let Some((room, name)) = self.room_and_name() else {
            self.send_err("ルームに参加していません");
            return;
        };
        if rebuttal.is_empty() {
            self.send_err("反論メッセージが必要です");
            return;
        }
        room.rebuttal(&name, rebuttal).await;
    }

    async fn handle_withdraw_challenge(&mut self) {
        let Some((room, name)) = self.room_and_name() else {
            self.send_err("ルームに参加していません");
            return;
        };
        if !room.withdraw_challenge(&name).await {
            self.send_err("指摘を取り下げることができません");
        }
    }

    fn room_and_name(&self) -> Option<(Arc<Room>, String)> {
        let room = self.current_room.clone()?;
        let name = self.player_name.clone()?;
        Some((room, name))
    }
}
