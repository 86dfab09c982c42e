use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use shiritori_types::{RoomSettings, WordEntry};

use crate::genre::GenreDictionary;
use crate::kana::{
    char_count, first_char, is_japanese, last_char, to_hiragana, validate_allowed_rows,
    validate_no_dakuten,
};

/// Per-player game state.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub score: i32,
    pub lives: i32,
}

/// The outcome of a word submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Word accepted; engine state advanced.
    Accepted,
    /// Hard rejection; no state change; only the submitter is notified.
    Rejected(String),
    /// The word passed every structural check but failed genre membership;
    /// a genre vote decides. Engine state is unchanged.
    NeedsVote(String),
    /// Word not accepted and the submitter loses a life. The turn stays.
    Penalty(String),
}

/// Core gameplay state for one room: word validation, turn order, history,
/// scores, and lives. Mutated only under the owning room's lock.
#[derive(Debug)]
pub struct GameEngine {
    settings: RoomSettings,
    genres: Arc<GenreDictionary>,
    history: Vec<WordEntry>,
    current_word: String,
    used_words: HashSet<String>,
    turn_order: Vec<String>,
    turn_index: usize,
    players: HashMap<String, PlayerState>,
}

impl GameEngine {
    /// Creates an engine for the given turn order. Every player starts with
    /// a zero score and the configured life count.
    pub fn new(
        settings: RoomSettings,
        turn_order: Vec<String>,
        genres: Arc<GenreDictionary>,
    ) -> Self {
        let max_lives = settings.effective_max_lives();
        let players = turn_order
            .iter()
            .map(|name| {
                (
                    name.clone(),
                    PlayerState {
                        score: 0,
                        lives: max_lives,
                    },
                )
            })
            .collect();
        Self {
            settings,
            genres,
            history: Vec::new(),
            current_word: String::new(),
            used_words: HashSet::new(),
            turn_order,
            turn_index: 0,
            players,
        }
    }

    /// Adds a player mid-game, appended to the end of the turn order with
    /// full lives.
    pub fn add_player(&mut self, name: &str) {
        self.players.insert(
            name.to_string(),
            PlayerState {
                score: 0,
                lives: self.settings.effective_max_lives(),
            },
        );
        self.turn_order.push(name.to_string());
    }

    /// Removes a player from the game.
    pub fn remove_player(&mut self, name: &str) {
        self.players.remove(name);
        if let Some(pos) = self.turn_order.iter().position(|n| n == name) {
            self.turn_order.remove(pos);
            if !self.turn_order.is_empty() && self.turn_index >= self.turn_order.len() {
                self.turn_index = 0;
            }
        }
    }

    /// Validates a word and applies it if it passes every check. The first
    /// failing check determines the outcome.
    pub fn validate_and_submit(
        &mut self,
        word: &str,
        player_name: &str,
        has_vote_pending: bool,
    ) -> SubmitOutcome {
        if has_vote_pending {
            return SubmitOutcome::Rejected(
                "投票中です。投票が終わるまでお待ちください".to_string(),
            );
        }

        // Check it's this player's turn
        if let Some(current) = self.turn_order.get(self.turn_index) {
            if current != player_name {
                return SubmitOutcome::Rejected(format!("{}さんの番です", current));
            }
        }

        // Check player is not eliminated
        if self.players.get(player_name).is_some_and(|ps| ps.lives <= 0) {
            return SubmitOutcome::Rejected("あなたは脱落済みです".to_string());
        }

        if !is_japanese(word) {
            return SubmitOutcome::Rejected("ひらがな・カタカナで入力してください".to_string());
        }

        let hiragana = to_hiragana(word);

        // Character-count bounds (0 = unbounded)
        let wlen = char_count(&hiragana);
        if self.settings.min_len > 0 && wlen < self.settings.min_len {
            return SubmitOutcome::Rejected(format!(
                "{}文字以上で入力してください",
                self.settings.min_len
            ));
        }
        if self.settings.max_len > 0 && wlen > self.settings.max_len {
            return SubmitOutcome::Rejected(format!(
                "{}文字以下で入力してください",
                self.settings.max_len
            ));
        }

        // Chaining: skip for the first word
        if !self.current_word.is_empty() {
            let prev_hiragana = to_hiragana(&self.current_word);
            let expected = last_char(&prev_hiragana);
            if expected != first_char(&hiragana) {
                let expected = expected.unwrap_or('?');
                return SubmitOutcome::Rejected(format!(
                    "「{}」から始まる言葉を入力してください",
                    expected
                ));
            }
        }

        // Already used: penalty
        if self.used_words.contains(&hiragana) {
            self.apply_penalty(player_name);
            return SubmitOutcome::Penalty("この言葉はすでに使われています".to_string());
        }

        // Ends with ん: penalty
        if hiragana.chars().last() == Some('ん') {
            self.apply_penalty(player_name);
            return SubmitOutcome::Penalty("「ん」で終わる言葉を使いました".to_string());
        }

        if self.settings.no_dakuten {
            if let Some(bad) = validate_no_dakuten(&hiragana) {
                self.apply_penalty(player_name);
                return SubmitOutcome::Penalty(format!(
                    "「{}」は濁音・半濁音の文字です（濁音・半濁音禁止ルール）",
                    bad
                ));
            }
        }

        if let Some((bad, row)) = validate_allowed_rows(&hiragana, &self.settings.allowed_rows) {
            self.apply_penalty(player_name);
            return SubmitOutcome::Penalty(format!(
                "「{}」は{}の文字です（使用可能な行: {}）",
                bad,
                row,
                self.settings.allowed_rows.join("・")
            ));
        }

        // Genre membership: with two or more players a vote decides;
        // solo play is a hard rejection.
        if !self.genres.contains(&hiragana, &self.settings.genre) {
            let message = format!(
                "ジャンル「{}」の言葉を入力してください",
                self.settings.genre
            );
            if self.players.len() >= 2 {
                return SubmitOutcome::NeedsVote(message);
            }
            return SubmitOutcome::Rejected(message);
        }

        self.apply_word(word, &hiragana, player_name);
        SubmitOutcome::Accepted
    }

    /// Applies an accepted word: records it, awards a point, and advances the
    /// turn past eliminated players. Also used when a genre vote accepts.
    pub fn apply_word(&mut self, word: &str, hiragana: &str, player_name: &str) {
        self.used_words.insert(hiragana.to_string());
        self.current_word = word.to_string();
        self.history.push(WordEntry {
            word: word.to_string(),
            player: player_name.to_string(),
            time: chrono::Utc::now().to_rfc3339(),
        });

        if let Some(ps) = self.players.get_mut(player_name) {
            ps.score += 1;
        }

        self.advance_turn();
    }

    fn advance_turn(&mut self) {
        if self.turn_order.is_empty() {
            return;
        }
        let start = self.turn_index;
        loop {
            self.turn_index = (self.turn_index + 1) % self.turn_order.len();
            if self.turn_index == start {
                break;
            }
            let next = &self.turn_order[self.turn_index];
            if self.players.get(next).is_some_and(|ps| ps.lives > 0) {
                break;
            }
        }
    }

    fn apply_penalty(&mut self, player_name: &str) {
        if let Some(ps) = self.players.get_mut(player_name) {
            ps.lives -= 1;
        }
    }

    /// Reverts the last word (a challenge was upheld): the history entry and
    /// used-word record are dropped, the submitter loses the point and a
    /// life, and the turn returns to them.
    pub fn revert_word(&mut self, word: &str, player_name: &str) {
        self.history.pop();
        self.used_words.remove(&to_hiragana(word));

        if let Some(ps) = self.players.get_mut(player_name) {
            if ps.score > 0 {
                ps.score -= 1;
            }
        }

        if let Some(pos) = self.turn_order.iter().position(|n| n == player_name) {
            self.turn_index = pos;
        }

        self.apply_penalty(player_name);

        self.current_word = self
            .history
            .last()
            .map(|entry| entry.word.clone())
            .unwrap_or_default();
    }

    /// Names of players with lives remaining.
    pub fn alive_players(&self) -> Vec<String> {
        self.players
            .iter()
            .filter(|(_, ps)| ps.lives > 0)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Checks whether the named player is eliminated and whether the game is
    /// over. Solo games end when nobody is alive; otherwise the game ends
    /// when at most one player remains alive, who is the last survivor.
    pub fn check_elimination(
        &self,
        player_name: &str,
        total_players: usize,
    ) -> (bool, bool, Option<String>) {
        let eliminated = self.players.get(player_name).is_some_and(|ps| ps.lives <= 0);
        let alive = self.alive_players();

        if total_players <= 1 {
            (eliminated, alive.is_empty(), None)
        } else if alive.len() <= 1 {
            (eliminated, true, alive.into_iter().next())
        } else {
            (eliminated, false, None)
        }
    }

    pub fn scores(&self) -> HashMap<String, i32> {
        self.players
            .iter()
            .map(|(name, ps)| (name.clone(), ps.score))
            .collect()
    }

    pub fn lives(&self) -> HashMap<String, i32> {
        self.players
            .iter()
            .map(|(name, ps)| (name.clone(), ps.lives))
            .collect()
    }

    pub fn player_lives(&self, name: &str) -> i32 {
        self.players.get(name).map_or(0, |ps| ps.lives)
    }

    pub fn player_score(&self, name: &str) -> i32 {
        self.players.get(name).map_or(0, |ps| ps.score)
    }

    pub fn max_lives(&self) -> i32 {
        self.settings.effective_max_lives()
    }

    /// The player whose turn it is, if any.
    pub fn current_turn(&self) -> Option<&str> {
        self.turn_order.get(self.turn_index).map(String::as_str)
    }

    pub fn history(&self) -> &[WordEntry] {
        &self.history
    }

    pub fn current_word(&self) -> &str {
        &self.current_word
    }

    pub fn turn_order(&self) -> &[String] {
        &self.turn_order
    }

    pub fn is_used(&self, hiragana: &str) -> bool {
        self.used_words.contains(hiragana)
    }

    pub fn used_word_count(&self) -> usize {
        self.used_words.len()
    }
}
