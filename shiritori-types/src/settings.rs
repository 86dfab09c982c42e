use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Default number of lives per player when the room doesn't configure one.
pub const DEFAULT_MAX_LIVES: i32 = 3;
/// Default maximum number of players per room.
pub const DEFAULT_MAX_PLAYERS: usize = 8;

/// Configuration for a game room, chosen by the room creator.
///
/// All fields are optional on the wire; zero values mean "unbounded" for the
/// length limits and "use the default" for lives and player caps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub min_len: usize,
    #[serde(default)]
    pub max_len: usize,
    /// Genre label; empty or "なし" means no genre restriction.
    #[serde(default)]
    pub genre: String,
    /// Turn time limit in seconds; 0 disables the turn timer.
    #[serde(default)]
    pub time_limit: u32,
    /// Allowed kana rows, e.g. ["あ行", "か行"]; empty = all rows allowed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_rows: Vec<String>,
    /// Disallow dakuten/handakuten characters.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_dakuten: bool,
    /// Max lives per player (default 3 if 0).
    #[serde(default)]
    pub max_lives: i32,
    /// Max players per room (default 8 if 0).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_players: usize,
    /// If true, the room is hidden from the lobby list.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub private: bool,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl RoomSettings {
    /// The effective life count, applying the default for unset values.
    pub fn effective_max_lives(&self) -> i32 {
        if self.max_lives <= 0 {
            DEFAULT_MAX_LIVES
        } else {
            self.max_lives
        }
    }

    /// The effective player cap, applying the default for unset values.
    pub fn effective_max_players(&self) -> usize {
        if self.max_players == 0 {
            DEFAULT_MAX_PLAYERS
        } else {
            self.max_players
        }
    }

    /// True when no genre restriction applies.
    pub fn has_genre(&self) -> bool {
        !self.genre.is_empty() && self.genre != "なし"
    }
}
