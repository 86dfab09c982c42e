use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::settings::RoomSettings;

/// A word played during a game, as the player typed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WordEntry {
    pub word: String,
    pub player: String,
    pub time: String, // RFC 3339 string
}

/// Lifecycle of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

/// Which kind of vote is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    /// The submitted word failed genre membership.
    Genre,
    /// Another player contests the most recent accepted word.
    Challenge,
}

/// Summary of a room for the lobby listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub id: String,
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub status: RoomStatus,
    pub genre: String,
    pub time_limit: u32,
    pub owner: String,
    pub settings: RoomSettings,
}

/// A player's name and score, as shown in room snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerSummary {
    pub name: String,
    pub score: i32,
}

/// Full room state, sent on join and on explicit resync.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: String,
    pub settings: RoomSettings,
    pub players: Vec<PlayerSummary>,
    pub history: Vec<WordEntry>,
    pub current_word: String,
    pub status: RoomStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_left: Option<u32>,
    pub turn_order: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<String>,
    pub owner: String,
    pub lives: HashMap<String, i32>,
    pub max_lives: i32,
}
