use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::game::{RoomInfo, RoomSnapshot, VoteKind, WordEntry};
use crate::settings::RoomSettings;

/// Messages a client may send over the WebSocket.
///
/// The wire format is `{"type": "<snake_case tag>", ...fields}`. Fields that
/// the server validates itself (rather than failing the decode) are optional
/// here so a missing field produces a precise user-facing error.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    GetRooms,
    GetGenres,
    CreateRoom {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        settings: Option<RoomSettings>,
    },
    #[serde(rename_all = "camelCase")]
    Join {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        room_id: Option<String>,
    },
    LeaveRoom,
    StartGame {
        #[serde(default)]
        settings: Option<RoomSettings>,
    },
    Answer {
        #[serde(default)]
        word: String,
    },
    Vote {
        #[serde(default)]
        accept: Option<bool>,
    },
    Challenge,
    Rebuttal {
        #[serde(default)]
        rebuttal: String,
    },
    WithdrawChallenge,
    Ping,
}

/// Messages the server sends back to clients, both direct responses and
/// room broadcasts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Rooms {
        rooms: Vec<RoomInfo>,
    },
    #[serde(rename_all = "camelCase")]
    Genres {
        kana_rows: Vec<String>,
    },
    RoomJoined(RoomSnapshot),
    RoomState(RoomSnapshot),
    PlayerJoined {
        player: String,
    },
    PlayerLeft {
        player: String,
    },
    PlayerList {
        players: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    GameStarted {
        current_word: String,
        history: Vec<WordEntry>,
        time_limit: u32,
        current_turn: String,
        turn_order: Vec<String>,
        lives: HashMap<String, i32>,
        max_lives: i32,
    },
    #[serde(rename_all = "camelCase")]
    WordAccepted {
        word: String,
        player: String,
        current_word: String,
        scores: HashMap<String, i32>,
        history: Vec<WordEntry>,
        current_turn: String,
        lives: HashMap<String, i32>,
    },
    AnswerRejected {
        word: String,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Timer {
        time_left: u32,
    },
    #[serde(rename_all = "camelCase")]
    GameOver {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        loser: Option<String>,
        scores: HashMap<String, i32>,
        history: Vec<WordEntry>,
        lives: HashMap<String, i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        result_url: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    VoteRequest {
        vote_type: VoteKind,
        word: String,
        player: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        challenger: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        genre: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        reason: String,
        vote_count: usize,
        total_players: usize,
    },
    #[serde(rename_all = "camelCase")]
    VoteUpdate {
        vote_count: usize,
        total_players: usize,
    },
    #[serde(rename_all = "camelCase")]
    VoteResult {
        vote_type: VoteKind,
        word: String,
        player: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        challenger: Option<String>,
        accepted: bool,
        message: String,
        // Present only when a rejected challenge reverted game state.
        #[serde(skip_serializing_if = "Option::is_none")]
        reverted: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_word: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_turn: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        lives: Option<HashMap<String, i32>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        scores: Option<HashMap<String, i32>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        history: Option<Vec<WordEntry>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        penalty_player: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        penalty_lives: Option<i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        eliminated: Option<bool>,
    },
    Rebuttal {
        player: String,
        rebuttal: String,
    },
    ChallengeWithdrawn {
        challenger: String,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Penalty {
        player: String,
        reason: String,
        lives: i32,
        eliminated: bool,
        all_lives: HashMap<String, i32>,
    },
    #[serde(rename_all = "camelCase")]
    TurnUpdate {
        turn_order: Vec<String>,
        current_turn: String,
        lives: HashMap<String, i32>,
        max_lives: i32,
        scores: HashMap<String, i32>,
    },
    SettingsUpdated {
        settings: RoomSettings,
    },
    Error {
        message: String,
    },
    Pong,
}

impl ServerMessage {
    /// Convenience constructor for error responses.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
