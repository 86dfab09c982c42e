use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tracing::{error, info};

use shiritori_core::{
    to_hiragana, GameEngine, GenreDictionary, SubmitOutcome, TurnTimer, VoteManager,
    VoteResolution,
};
use shiritori_types::{
    PlayerSummary, RoomInfo, RoomSnapshot, RoomSettings, RoomStatus, ServerMessage, VoteKind,
    WordEntry,
};

/// How long players have to vote before auto-resolution.
pub const VOTE_TIMEOUT: Duration = Duration::from_secs(15);
/// Capacity of each player's outgoing message queue.
pub const OUTBOX_CAPACITY: usize = 256;

/// Everything the game-over consumer needs to archive a result. The archive
/// itself lives outside this server; the hook may return a shareable result
/// URL which is attached to the `game_over` broadcast.
#[derive(Debug, Clone)]
pub struct GameOverReport {
    pub room_id: String,
    pub room_name: String,
    pub genre: String,
    pub reason: String,
    pub winner: Option<String>,
    pub loser: Option<String>,
    pub scores: HashMap<String, i32>,
    pub history: Vec<WordEntry>,
    pub lives: HashMap<String, i32>,
}

pub type GameOverHook = Arc<dyn Fn(&GameOverReport) -> Option<String> + Send + Sync>;

/// A connected player: connection-level score/lives mirror plus the bounded
/// outgoing queue. The queue is shared with the connection's writer task.
pub struct Player {
    pub name: String,
    pub score: i32,
    pub lives: i32,
    outbox: mpsc::Sender<String>,
}

impl Player {
    /// Non-blocking send; the message is dropped for this player if their
    /// queue is full.
    fn offer(&self, json: &str) {
        let _ = self.outbox.try_send(json.to_string());
    }
}

/// Errors from starting a game. User errors go back to the sender; internal
/// ones are only logged, matching how silently-ignored double starts behave.
#[derive(Debug)]
pub enum StartGameError {
    User(String),
    Internal(String),
}

struct RoomState {
    owner: String,
    settings: RoomSettings,
    status: RoomStatus,
    players: HashMap<String, Player>,
    engine: Option<GameEngine>,
    votes: VoteManager,
    empty_since: Option<tokio::time::Instant>,
    on_game_over: Option<GameOverHook>,
    genres: Arc<GenreDictionary>,
}

impl RoomState {
    fn broadcast(&self, msg: &ServerMessage) {
        let json = match serde_json::to_string(msg) {
            Ok(json) => json,
            Err(e) => {
                error!("failed to serialize broadcast: {:?}", e);
                return;
            }
        };
        for player in self.players.values() {
            player.offer(&json);
        }
    }

    fn send_to(&self, name: &str, msg: &ServerMessage) {
        let Some(player) = self.players.get(name) else {
            return;
        };
        match serde_json::to_string(msg) {
            Ok(json) => player.offer(&json),
            Err(e) => error!("failed to serialize message: {:?}", e),
        }
    }

    fn roster(&self) -> Vec<String> {
        self.players.keys().cloned().collect()
    }

    /// Mirrors engine score/lives back onto the connection-level players.
    fn sync_players_from_engine(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let scores = engine.scores();
        let lives = engine.lives();
        for (name, player) in self.players.iter_mut() {
            if let Some(score) = scores.get(name) {
                player.score = *score;
            }
            if let Some(lives) = lives.get(name) {
                player.lives = *lives;
            }
        }
    }

    fn scores(&self) -> HashMap<String, i32> {
        match self.engine.as_ref() {
            Some(engine) => engine.scores(),
            None => self
                .players
                .iter()
                .map(|(name, p)| (name.clone(), p.score))
                .collect(),
        }
    }

    fn lives(&self) -> HashMap<String, i32> {
        match self.engine.as_ref() {
            Some(engine) => engine.lives(),
            None => self
                .players
                .iter()
                .map(|(name, p)| (name.clone(), p.lives))
                .collect(),
        }
    }
}

/// A single game room: composed engine, vote manager, and turn timer, all
/// serialized under one lock. Broadcasts are enqueued while the lock is held
/// so every player observes the same order of effects.
pub struct Room {
    pub id: String,
    timer: TurnTimer,
    state: Mutex<RoomState>,
}

impl Room {
    pub fn new(
        id: String,
        owner: String,
        settings: RoomSettings,
        genres: Arc<GenreDictionary>,
        on_game_over: Option<GameOverHook>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Room>| {
            let tick_room = weak.clone();
            let expired_room = weak.clone();
            let timer = TurnTimer::new(
                Arc::new(move |time_left| {
                    if let Some(room) = tick_room.upgrade() {
                        tokio::spawn(async move {
                            room.broadcast_timer_tick(time_left).await;
                        });
                    }
                }),
                Arc::new(move || {
                    if let Some(room) = expired_room.upgrade() {
                        tokio::spawn(async move {
                            room.handle_time_up().await;
                        });
                    }
                }),
            );

            Room {
                id,
                timer,
                state: Mutex::new(RoomState {
                    owner,
                    settings,
                    status: RoomStatus::Waiting,
                    players: HashMap::new(),
                    engine: None,
                    votes: VoteManager::new(),
                    empty_since: None,
                    on_game_over,
                    genres,
                }),
            }
        })
    }

    /// Seats the room creator: they become the first player and receive the
    /// initial `room_joined` snapshot.
    pub async fn seat_creator(&self, name: &str, outbox: mpsc::Sender<String>) {
        let mut st = self.state.lock().await;
        self.insert_player(&mut st, name, outbox);

        let snapshot = self.snapshot_locked(&st);
        st.send_to(name, &ServerMessage::RoomJoined(snapshot));
        st.broadcast(&ServerMessage::PlayerList {
            players: st.roster(),
        });
    }

    /// Seats a joining player after capacity and name checks. Mid-game joins
    /// enter the turn order with full lives and trigger a `turn_update`.
    pub async fn seat_player(
        &self,
        name: &str,
        outbox: mpsc::Sender<String>,
    ) -> Result<(), String> {
        let mut st = self.state.lock().await;
        if st.players.contains_key(name) {
            return Err(format!("名前「{}」はすでに使われています", name));
        }
        let max_players = st.settings.effective_max_players();
        if st.players.len() >= max_players {
            return Err(format!("ルームが満員です（最大{}人）", max_players));
        }

        self.insert_player(&mut st, name, outbox);

        let snapshot = self.snapshot_locked(&st);
        st.send_to(name, &ServerMessage::RoomJoined(snapshot));
        st.broadcast(&ServerMessage::PlayerJoined {
            player: name.to_string(),
        });
        st.broadcast(&ServerMessage::PlayerList {
            players: st.roster(),
        });

        if st.status == RoomStatus::Playing {
            if let Some(engine) = st.engine.as_ref() {
                st.broadcast(&ServerMessage::TurnUpdate {
                    turn_order: engine.turn_order().to_vec(),
                    current_turn: engine.current_turn().unwrap_or_default().to_string(),
                    lives: engine.lives(),
                    max_lives: engine.max_lives(),
                    scores: engine.scores(),
                });
            }
        }
        Ok(())
    }

    fn insert_player(&self, st: &mut RoomState, name: &str, outbox: mpsc::Sender<String>) {
        let mut player = Player {
            name: name.to_string(),
            score: 0,
            lives: 0,
            outbox,
        };
        st.empty_since = None;

        if st.status == RoomStatus::Playing {
            if let Some(engine) = st.engine.as_mut() {
                engine.add_player(name);
                player.score = engine.player_score(name);
                player.lives = engine.player_lives(name);
            }
        }
        st.players.insert(name.to_string(), player);
    }

    /// Removes a player, notifies the remainder, and stamps `empty_since`
    /// when the room runs dry. Returns the remaining player count.
    pub async fn leave(&self, name: &str) -> usize {
        let mut st = self.state.lock().await;
        st.players.remove(name);
        if let Some(engine) = st.engine.as_mut() {
            engine.remove_player(name);
        }

        st.broadcast(&ServerMessage::PlayerLeft {
            player: name.to_string(),
        });
        st.broadcast(&ServerMessage::PlayerList {
            players: st.roster(),
        });

        let remaining = st.players.len();
        if remaining == 0 {
            self.timer.stop();
            st.empty_since = Some(tokio::time::Instant::now());
            info!("room now empty, scheduled for cleanup: roomId={}", self.id);
        }
        remaining
    }

    pub async fn player_names(&self) -> Vec<String> {
        self.state.lock().await.roster()
    }

    /// Starts the game: owner first, everyone else shuffled behind them,
    /// fresh engine with full lives, timer armed when a limit is set. An
    /// optional settings override is applied and broadcast first.
    pub async fn start_game(
        &self,
        starter: &str,
        new_settings: Option<RoomSettings>,
    ) -> Result<(), StartGameError> {
        let mut st = self.state.lock().await;

        if st.owner != starter {
            return Err(StartGameError::User(
                "ゲームを開始できるのはルーム作成者のみです".to_string(),
            ));
        }

        if let Some(mut settings) = new_settings {
            if st.status == RoomStatus::Playing {
                return Err(StartGameError::User(
                    "ゲーム中は設定を変更できません".to_string(),
                ));
            }
            // Preserve the room name when the override omits it
            if settings.name.is_empty() {
                settings.name = st.settings.name.clone();
            }
            st.settings = settings;
            st.broadcast(&ServerMessage::SettingsUpdated {
                settings: st.settings.clone(),
            });
        }

        if st.status == RoomStatus::Playing {
            return Err(StartGameError::Internal("game already in progress".to_string()));
        }
        if st.players.is_empty() {
            return Err(StartGameError::Internal("need at least 1 player".to_string()));
        }

        self.timer.stop();
        st.status = RoomStatus::Playing;

        let mut rest: Vec<String> = st
            .players
            .keys()
            .filter(|name| **name != st.owner)
            .cloned()
            .collect();
        {
            use rand::seq::SliceRandom;
            rest.shuffle(&mut rand::thread_rng());
        }
        let mut turn_order = vec![st.owner.clone()];
        turn_order.extend(rest);

        let engine = GameEngine::new(st.settings.clone(), turn_order, st.genres.clone());
        st.engine = Some(engine);
        st.votes.clear();
        st.sync_players_from_engine();

        if st.settings.time_limit > 0 {
            self.timer.start(st.settings.time_limit);
        }

        let engine = st.engine.as_ref().expect("engine just created");
        st.broadcast(&ServerMessage::GameStarted {
            current_word: String::new(),
            history: Vec::new(),
            time_limit: st.settings.time_limit,
            current_turn: engine.current_turn().unwrap_or_default().to_string(),
            turn_order: engine.turn_order().to_vec(),
            lives: engine.lives(),
            max_lives: engine.max_lives(),
        });
        Ok(())
    }

    /// Runs a word through the validation pipeline and applies the outcome's
    /// side effects and broadcasts.
    pub async fn submit_word(self: &Arc<Self>, player_name: &str, word: &str) {
        let mut st = self.state.lock().await;

        if st.status != RoomStatus::Playing || st.engine.is_none() {
            st.send_to(
                player_name,
                &ServerMessage::AnswerRejected {
                    word: word.to_string(),
                    message: "ゲームが開始されていません".to_string(),
                },
            );
            return;
        }

        let has_vote_pending = st.votes.has_pending();
        let outcome = st
            .engine
            .as_mut()
            .expect("checked above")
            .validate_and_submit(word, player_name, has_vote_pending);

        match outcome {
            SubmitOutcome::Accepted => {
                self.timer.reset();
                st.votes.clear();
                st.sync_players_from_engine();
                self.broadcast_word_accepted(&st, word, player_name);
            }

            SubmitOutcome::Rejected(message) => {
                st.send_to(
                    player_name,
                    &ServerMessage::AnswerRejected {
                        word: word.to_string(),
                        message,
                    },
                );
            }

            SubmitOutcome::NeedsVote(message) => {
                let genre = st.settings.genre.clone();
                let roster = st.roster();
                let hiragana = to_hiragana(word);
                let summary =
                    st.votes
                        .start_genre_vote(word, &hiragana, player_name, &genre, &roster);
                st.broadcast(&ServerMessage::VoteRequest {
                    vote_type: VoteKind::Genre,
                    word: summary.word,
                    player: summary.player,
                    challenger: None,
                    genre: Some(genre),
                    message: Some(message),
                    reason: summary.reason,
                    vote_count: summary.vote_count,
                    total_players: summary.total_players,
                });
                drop(st);
                self.schedule_vote_timeout();
            }

            SubmitOutcome::Penalty(reason) => {
                st.sync_players_from_engine();
                let engine = st.engine.as_ref().expect("checked above");
                let lives_left = engine.player_lives(player_name);
                let (eliminated, game_over, last_survivor) =
                    engine.check_elimination(player_name, st.players.len());
                let all_lives = engine.lives();

                st.broadcast(&ServerMessage::Penalty {
                    player: player_name.to_string(),
                    reason,
                    lives: lives_left,
                    eliminated,
                    all_lives,
                });

                if game_over {
                    let reason = match &last_survivor {
                        Some(winner) => format!("{}さんの勝利！", winner),
                        None => "ゲーム終了".to_string(),
                    };
                    self.finish_game_locked(&mut st, reason, last_survivor, None);
                }
            }
        }
    }

    /// Records a ballot. Unresolved votes broadcast progress; resolution
    /// applies the outcome to the game state.
    pub async fn cast_vote(self: &Arc<Self>, player_name: &str, accept: bool) {
        let mut st = self.state.lock().await;
        let roster = st.roster();
        match st.votes.cast_vote(player_name, accept, &roster) {
            None => {
                let (vote_count, total_players) = st.votes.counts(&roster);
                st.broadcast(&ServerMessage::VoteUpdate {
                    vote_count,
                    total_players,
                });
            }
            Some(resolution) => self.apply_vote_resolution(&mut st, resolution),
        }
    }

    /// Timeout path: resolve with whatever ballots exist. No-op when the
    /// vote already resolved or was withdrawn.
    pub async fn force_resolve_vote(self: &Arc<Self>) {
        let mut st = self.state.lock().await;
        let roster = st.roster();
        if let Some(resolution) = st.votes.force_resolve(&roster) {
            self.apply_vote_resolution(&mut st, resolution);
        }
    }

    fn apply_vote_resolution(self: &Arc<Self>, st: &mut RoomState, resolution: VoteResolution) {
        match resolution.kind {
            VoteKind::Genre => {
                if resolution.accepted {
                    if let Some(engine) = st.engine.as_mut() {
                        engine.apply_word(
                            &resolution.word,
                            &resolution.hiragana,
                            &resolution.player,
                        );
                    }
                    self.timer.reset();
                    st.sync_players_from_engine();
                    st.broadcast(&ServerMessage::VoteResult {
                        vote_type: VoteKind::Genre,
                        word: resolution.word.clone(),
                        player: resolution.player.clone(),
                        challenger: None,
                        accepted: true,
                        message: format!("投票により「{}」が承認されました！", resolution.word),
                        reverted: None,
                        current_word: None,
                        current_turn: None,
                        lives: None,
                        scores: None,
                        history: None,
                        penalty_player: None,
                        penalty_lives: None,
                        eliminated: None,
                    });
                    self.broadcast_word_accepted(st, &resolution.word, &resolution.player);
                } else {
                    // The submitter keeps their turn and tries another word
                    st.broadcast(&ServerMessage::VoteResult {
                        vote_type: VoteKind::Genre,
                        word: resolution.word.clone(),
                        player: resolution.player.clone(),
                        challenger: None,
                        accepted: false,
                        message: format!("投票により「{}」は却下されました", resolution.word),
                        reverted: None,
                        current_word: None,
                        current_turn: None,
                        lives: None,
                        scores: None,
                        history: None,
                        penalty_player: None,
                        penalty_lives: None,
                        eliminated: None,
                    });
                }
            }

            VoteKind::Challenge => {
                if resolution.accepted {
                    st.broadcast(&ServerMessage::VoteResult {
                        vote_type: VoteKind::Challenge,
                        word: resolution.word.clone(),
                        player: resolution.player.clone(),
                        challenger: resolution.challenger.clone(),
                        accepted: true,
                        message: format!(
                            "投票により「{}」は有効と認められました",
                            resolution.word
                        ),
                        reverted: None,
                        current_word: None,
                        current_turn: None,
                        lives: None,
                        scores: None,
                        history: None,
                        penalty_player: None,
                        penalty_lives: None,
                        eliminated: None,
                    });
                    return;
                }

                // Challenge upheld: the word comes back out of the game and
                // the original submitter pays for it.
                if let Some(engine) = st.engine.as_mut() {
                    engine.revert_word(&resolution.word, &resolution.player);
                }
                self.timer.reset();
                st.sync_players_from_engine();

                let engine = match st.engine.as_ref() {
                    Some(engine) => engine,
                    None => return,
                };
                let current_turn = engine.current_turn().unwrap_or_default().to_string();
                let lives = engine.lives();
                let scores = engine.scores();
                let history = engine.history().to_vec();
                let current_word = engine.current_word().to_string();
                let penalty_lives = engine.player_lives(&resolution.player);
                let (eliminated, game_over, last_survivor) =
                    engine.check_elimination(&resolution.player, st.players.len());

                st.broadcast(&ServerMessage::VoteResult {
                    vote_type: VoteKind::Challenge,
                    word: resolution.word.clone(),
                    player: resolution.player.clone(),
                    challenger: resolution.challenger.clone(),
                    accepted: false,
                    message: format!(
                        "投票により「{}」は却下されました。{}さんはライフ-1、もう一度入力してください",
                        resolution.word, resolution.player
                    ),
                    reverted: Some(true),
                    current_word: Some(current_word),
                    current_turn: Some(current_turn),
                    lives: Some(lives),
                    scores: Some(scores),
                    history: Some(history),
                    penalty_player: Some(resolution.player.clone()),
                    penalty_lives: Some(penalty_lives),
                    eliminated: Some(eliminated),
                });

                if game_over {
                    let reason = match &last_survivor {
                        Some(winner) => format!("{}さんの勝利！", winner),
                        None => "ゲーム終了".to_string(),
                    };
                    self.finish_game_locked(st, reason, last_survivor, None);
                }
            }
        }
    }

    /// Starts a challenge vote against the most recent accepted word and
    /// schedules its timeout.
    pub async fn start_challenge(self: &Arc<Self>, challenger: &str) -> Result<(), String> {
        let mut st = self.state.lock().await;

        if st.status != RoomStatus::Playing || st.engine.is_none() {
            return Err("ゲームが開始されていません".to_string());
        }
        let last = match st.engine.as_ref().and_then(|e| e.history().last()) {
            Some(entry) => entry.clone(),
            None => return Err("まだ単語がありません".to_string()),
        };

        let roster = st.roster();
        let summary = st
            .votes
            .start_challenge_vote(challenger, &last, &roster)
            .map_err(|e| e.to_string())?;

        st.broadcast(&ServerMessage::VoteRequest {
            vote_type: VoteKind::Challenge,
            word: summary.word,
            player: summary.player,
            challenger: summary.challenger,
            genre: None,
            message: None,
            reason: summary.reason,
            vote_count: summary.vote_count,
            total_players: summary.total_players,
        });
        drop(st);
        self.schedule_vote_timeout();
        Ok(())
    }

    /// Lets the active challenger withdraw; broadcasts on success.
    pub async fn withdraw_challenge(&self, challenger: &str) -> bool {
        let mut st = self.state.lock().await;
        if !st.votes.withdraw_challenge(challenger) {
            return false;
        }
        st.broadcast(&ServerMessage::ChallengeWithdrawn {
            challenger: challenger.to_string(),
            message: format!("{}さんが指摘を取り下げました", challenger),
        });
        true
    }

    /// Relays a rebuttal from the challenged player during a pending
    /// challenge vote. Silently ignored otherwise.
    pub async fn rebuttal(&self, player_name: &str, rebuttal: &str) {
        let st = self.state.lock().await;
        let allowed = st
            .votes
            .pending()
            .is_some_and(|pv| !pv.resolved && pv.kind == VoteKind::Challenge && pv.player == player_name);
        if !allowed {
            return;
        }
        st.broadcast(&ServerMessage::Rebuttal {
            player: player_name.to_string(),
            rebuttal: rebuttal.to_string(),
        });
    }

    /// Turn-timer expiry: the player on turn loses and the game ends.
    pub async fn handle_time_up(&self) {
        let mut st = self.state.lock().await;
        if st.status != RoomStatus::Playing {
            return;
        }
        let loser = st
            .engine
            .as_ref()
            .and_then(|e| e.current_turn().map(str::to_string));
        self.finish_game_locked(&mut st, "タイムアップ".to_string(), None, loser);
    }

    async fn broadcast_timer_tick(&self, time_left: u32) {
        let st = self.state.lock().await;
        st.broadcast(&ServerMessage::Timer { time_left });
    }

    fn broadcast_word_accepted(&self, st: &RoomState, word: &str, player_name: &str) {
        let Some(engine) = st.engine.as_ref() else {
            return;
        };
        st.broadcast(&ServerMessage::WordAccepted {
            word: word.to_string(),
            player: player_name.to_string(),
            current_word: word.to_string(),
            scores: engine.scores(),
            history: engine.history().to_vec(),
            current_turn: engine.current_turn().unwrap_or_default().to_string(),
            lives: engine.lives(),
        });
    }

    /// Ends the game: status flips to finished, the vote slot and timer are
    /// cleared, the game-over hook runs, and `game_over` is broadcast.
    fn finish_game_locked(
        &self,
        st: &mut RoomState,
        reason: String,
        winner: Option<String>,
        loser: Option<String>,
    ) {
        st.status = RoomStatus::Finished;
        st.votes.clear();
        self.timer.stop();

        let (scores, history, lives) = match st.engine.as_ref() {
            Some(engine) => (engine.scores(), engine.history().to_vec(), engine.lives()),
            None => (st.scores(), Vec::new(), st.lives()),
        };

        let report = GameOverReport {
            room_id: self.id.clone(),
            room_name: st.settings.name.clone(),
            genre: st.settings.genre.clone(),
            reason: reason.clone(),
            winner: winner.clone(),
            loser: loser.clone(),
            scores: scores.clone(),
            history: history.clone(),
            lives: lives.clone(),
        };
        let result_url = st.on_game_over.as_ref().and_then(|hook| hook(&report));

        info!("game over: roomId={} reason={}", self.id, reason);
        st.broadcast(&ServerMessage::GameOver {
            reason,
            winner,
            loser,
            scores,
            history,
            lives,
            result_url,
        });
    }

    fn schedule_vote_timeout(self: &Arc<Self>) {
        let room = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(VOTE_TIMEOUT).await;
            room.force_resolve_vote().await;
        });
    }

    fn snapshot_locked(&self, st: &RoomState) -> RoomSnapshot {
        let (history, current_word, turn_order, current_turn) = match st.engine.as_ref() {
            Some(engine) => (
                engine.history().to_vec(),
                engine.current_word().to_string(),
                engine.turn_order().to_vec(),
                engine.current_turn().map(str::to_string),
            ),
            None => (Vec::new(), String::new(), Vec::new(), None),
        };

        let scores = st.scores();
        let players = st
            .players
            .keys()
            .map(|name| PlayerSummary {
                name: name.clone(),
                score: scores.get(name).copied().unwrap_or(0),
            })
            .collect();

        let time_left = if st.settings.time_limit > 0 && st.status == RoomStatus::Playing {
            Some(self.timer.time_left())
        } else {
            None
        };

        RoomSnapshot {
            room_id: self.id.clone(),
            settings: st.settings.clone(),
            players,
            history,
            current_word,
            status: st.status,
            time_left,
            turn_order,
            current_turn,
            owner: st.owner.clone(),
            lives: st.lives(),
            max_lives: st.settings.effective_max_lives(),
        }
    }

    /// Full state snapshot, as sent in `room_joined` / `room_state`.
    pub async fn snapshot(&self) -> RoomSnapshot {
        let st = self.state.lock().await;
        self.snapshot_locked(&st)
    }

    /// Lobby-listing summary; `None` for private rooms.
    pub async fn listing(&self) -> Option<RoomInfo> {
        let st = self.state.lock().await;
        if st.settings.private {
            return None;
        }
        Some(RoomInfo {
            id: self.id.clone(),
            name: st.settings.name.clone(),
            player_count: st.players.len(),
            max_players: st.settings.effective_max_players(),
            status: st.status,
            genre: st.settings.genre.clone(),
            time_limit: st.settings.time_limit,
            owner: st.owner.clone(),
            settings: st.settings.clone(),
        })
    }

    /// True when the room has been empty for longer than `max_age`.
    pub async fn empty_longer_than(&self, max_age: Duration) -> bool {
        let st = self.state.lock().await;
        st.empty_since
            .is_some_and(|since| since.elapsed() > max_age)
    }

    /// Test/observability helpers
    pub async fn status(&self) -> RoomStatus {
        self.state.lock().await.status
    }

    pub async fn scores(&self) -> HashMap<String, i32> {
        self.state.lock().await.scores()
    }

    pub async fn lives(&self) -> HashMap<String, i32> {
        self.state.lock().await.lives()
    }

    pub async fn has_pending_vote(&self) -> bool {
        self.state.lock().await.votes.has_pending()
    }

    pub async fn current_turn(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .engine
            .as_ref()
            .and_then(|e| e.current_turn().map(str::to_string))
    }

    pub async fn history_len(&self) -> usize {
        self.state
            .lock()
            .await
            .engine
            .as_ref()
            .map_or(0, |e| e.history().len())
    }

    pub fn time_left(&self) -> u32 {
        self.timer.time_left()
    }
}
