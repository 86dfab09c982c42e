use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use shiritori_core::GenreDictionary;
use shiritori_server::room::{Room, OUTBOX_CAPACITY};
use shiritori_types::{RoomSettings, RoomStatus};

fn outbox() -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
    mpsc::channel(OUTBOX_CAPACITY)
}

/// Creates a playing room with the given players; the first is the owner.
async fn playing_room(settings: RoomSettings, players: &[&str]) -> Arc<Room> {
    let room = Room::new(
        "room01".to_string(),
        players[0].to_string(),
        settings,
        Arc::new(GenreDictionary::builtin()),
        None,
    );
    let (tx, _rx) = outbox();
    room.seat_creator(players[0], tx).await;
    for name in &players[1..] {
        let (tx, _rx) = outbox();
        room.seat_player(name, tx).await.unwrap();
    }
    room.start_game(players[0], None).await.unwrap();
    room
}

async fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<serde_json::Value> {
    let mut out = Vec::new();
    while let Ok(json) = rx.try_recv() {
        out.push(serde_json::from_str(&json).unwrap());
    }
    out
}

#[tokio::test]
async fn challenge_works_with_two_players() {
    let room = playing_room(RoomSettings::default(), &["alice", "bob"]).await;

    room.submit_word("alice", "しりとり").await;
    assert_eq!(room.scores().await["alice"], 1);

    // bob may challenge alice's word even though it's his turn
    room.start_challenge("bob").await.unwrap();
    assert!(room.has_pending_vote().await);
}

#[tokio::test]
async fn self_challenge_is_blocked() {
    let room = playing_room(RoomSettings::default(), &["alice", "bob"]).await;

    room.submit_word("alice", "しりとり").await;

    let err = room.start_challenge("alice").await.unwrap_err();
    assert_eq!(err, "自分の単語には指摘できません");
    assert!(!room.has_pending_vote().await);
}

#[tokio::test]
async fn only_one_challenge_at_a_time() {
    let room = playing_room(RoomSettings::default(), &["alice", "bob", "charlie"]).await;

    room.submit_word("alice", "しりとり").await;
    room.start_challenge("bob").await.unwrap();

    let err = room.start_challenge("charlie").await.unwrap_err();
    assert_eq!(err, "投票中です。投票が終わるまでお待ちください");
}

#[tokio::test]
async fn rejected_challenge_reverts_score_and_life() {
    let room = playing_room(RoomSettings::default(), &["alice", "bob", "charlie"]).await;

    room.submit_word("alice", "しりとり").await;
    assert_eq!(room.scores().await["alice"], 1);
    assert_eq!(room.history_len().await, 1);

    // bob challenges (auto-reject); charlie also rejects -> unanimous
    room.start_challenge("bob").await.unwrap();
    room.cast_vote("charlie", false).await;

    assert_eq!(room.scores().await["alice"], 0);
    assert_eq!(room.lives().await["alice"], 2);
    assert_eq!(room.current_turn().await.as_deref(), Some("alice"));
    assert_eq!(room.history_len().await, 0);
    assert!(!room.has_pending_vote().await);
}

#[tokio::test]
async fn accepted_challenge_keeps_state() {
    let room = playing_room(RoomSettings::default(), &["alice", "bob", "charlie", "dave"]).await;

    room.submit_word("alice", "しりとり").await;
    room.start_challenge("bob").await.unwrap();

    // charlie and dave outvote bob's auto-reject
    room.cast_vote("charlie", true).await;
    room.cast_vote("dave", true).await;

    assert_eq!(room.scores().await["alice"], 1);
    assert_eq!(room.lives().await["alice"], 3);
    assert!(!room.has_pending_vote().await);
    // turn advanced normally past alice (the rest of the order is shuffled)
    assert_ne!(room.current_turn().await.as_deref(), Some("alice"));
}

#[tokio::test(start_paused = true)]
async fn unresolved_vote_times_out_to_reject() {
    let room = playing_room(RoomSettings::default(), &["alice", "bob", "charlie"]).await;

    room.submit_word("alice", "しりとり").await;
    room.start_challenge("bob").await.unwrap();

    // nobody else votes within the window: absentees count as reject
    tokio::time::sleep(Duration::from_secs(16)).await;

    assert!(!room.has_pending_vote().await);
    assert_eq!(room.scores().await["alice"], 0);
    assert_eq!(room.lives().await["alice"], 2);
}

#[tokio::test(start_paused = true)]
async fn withdrawn_challenge_cancels_the_timeout() {
    let room = playing_room(RoomSettings::default(), &["alice", "bob", "charlie"]).await;

    room.submit_word("alice", "しりとり").await;
    room.start_challenge("bob").await.unwrap();
    assert!(room.withdraw_challenge("bob").await);

    tokio::time::sleep(Duration::from_secs(16)).await;

    // the stale timeout resolved nothing
    assert_eq!(room.scores().await["alice"], 1);
    assert_eq!(room.lives().await["alice"], 3);
}

#[tokio::test]
async fn genre_vote_accept_applies_the_word() {
    let settings = RoomSettings {
        genre: "食べ物".to_string(),
        ..Default::default()
    };
    let room = playing_room(settings, &["alice", "bob"]).await;

    // not in the food list: a genre vote opens instead of an accept
    room.submit_word("alice", "しりとり").await;
    assert!(room.has_pending_vote().await);
    assert_eq!(room.history_len().await, 0);

    // bob agrees; with alice's auto-accept that's a majority
    room.cast_vote("bob", true).await;

    assert_eq!(room.scores().await["alice"], 1);
    assert_eq!(room.history_len().await, 1);
    assert_eq!(room.current_turn().await.as_deref(), Some("bob"));
}

#[tokio::test]
async fn genre_vote_reject_keeps_the_turn() {
    let settings = RoomSettings {
        genre: "食べ物".to_string(),
        ..Default::default()
    };
    let room = playing_room(settings, &["alice", "bob"]).await;

    room.submit_word("alice", "しりとり").await;
    room.cast_vote("bob", false).await;

    assert_eq!(room.scores().await["alice"], 0);
    assert_eq!(room.history_len().await, 0);
    // alice keeps her turn for another try
    assert_eq!(room.current_turn().await.as_deref(), Some("alice"));
    assert_eq!(room.lives().await["alice"], 3);
}

#[tokio::test]
async fn allowed_rows_penalty_preserves_current_word() {
    let settings = RoomSettings {
        allowed_rows: vec!["あ行".to_string(), "か行".to_string()],
        ..Default::default()
    };
    let room = playing_room(settings, &["alice", "bob"]).await;

    room.submit_word("alice", "あき").await;
    assert_eq!(room.scores().await["alice"], 1);

    room.submit_word("bob", "きた").await;
    assert_eq!(room.lives().await["bob"], 2);
    // no turn advance, current word unchanged
    assert_eq!(room.current_turn().await.as_deref(), Some("bob"));
    assert_eq!(room.history_len().await, 1);
}

#[tokio::test]
async fn elimination_broadcasts_penalty_then_game_over() {
    let settings = RoomSettings {
        max_lives: 1,
        ..Default::default()
    };
    let room = Room::new(
        "room01".to_string(),
        "alice".to_string(),
        settings,
        Arc::new(GenreDictionary::builtin()),
        None,
    );
    let (alice_tx, _alice_rx) = outbox();
    room.seat_creator("alice", alice_tx).await;
    let (bob_tx, mut bob_rx) = outbox();
    room.seat_player("bob", bob_tx).await.unwrap();
    room.start_game("alice", None).await.unwrap();
    drain(&mut bob_rx).await;

    room.submit_word("alice", "みかん").await;

    let messages = drain(&mut bob_rx).await;
    let types: Vec<&str> = messages
        .iter()
        .map(|m| m["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["penalty", "game_over"]);
    assert_eq!(messages[0]["player"], "alice");
    assert_eq!(messages[0]["eliminated"], true);
    assert_eq!(messages[1]["winner"], "bob");

    assert_eq!(room.status().await, RoomStatus::Finished);
}

#[tokio::test(start_paused = true)]
async fn turn_timer_expiry_ends_the_game() {
    let settings = RoomSettings {
        time_limit: 3,
        ..Default::default()
    };
    let room = Room::new(
        "room01".to_string(),
        "alice".to_string(),
        settings,
        Arc::new(GenreDictionary::builtin()),
        None,
    );
    let (alice_tx, mut alice_rx) = outbox();
    room.seat_creator("alice", alice_tx).await;
    let (bob_tx, _bob_rx) = outbox();
    room.seat_player("bob", bob_tx).await.unwrap();
    room.start_game("alice", None).await.unwrap();
    drain(&mut alice_rx).await;

    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert_eq!(room.status().await, RoomStatus::Finished);
    let messages = drain(&mut alice_rx).await;
    let game_over = messages
        .iter()
        .find(|m| m["type"] == "game_over")
        .expect("game_over broadcast");
    assert_eq!(game_over["reason"], "タイムアップ");
    assert_eq!(game_over["loser"], "alice");
    // ticks were broadcast along the way
    assert!(messages.iter().any(|m| m["type"] == "timer"));
}

#[tokio::test(start_paused = true)]
async fn accepted_words_reset_the_turn_timer() {
    let settings = RoomSettings {
        time_limit: 5,
        ..Default::default()
    };
    let room = playing_room(settings, &["alice", "bob"]).await;

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(room.time_left(), 2);

    room.submit_word("alice", "しりとり").await;
    assert_eq!(room.time_left(), 5);

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(room.status().await, RoomStatus::Playing);
}

#[tokio::test]
async fn rejected_submission_reaches_only_the_submitter() {
    let room = Room::new(
        "room01".to_string(),
        "alice".to_string(),
        RoomSettings::default(),
        Arc::new(GenreDictionary::builtin()),
        None,
    );
    let (alice_tx, mut alice_rx) = outbox();
    room.seat_creator("alice", alice_tx).await;
    let (bob_tx, mut bob_rx) = outbox();
    room.seat_player("bob", bob_tx).await.unwrap();
    room.start_game("alice", None).await.unwrap();
    drain(&mut alice_rx).await;
    drain(&mut bob_rx).await;

    // bob submits out of turn
    room.submit_word("bob", "しりとり").await;

    let bob_msgs = drain(&mut bob_rx).await;
    assert_eq!(bob_msgs.len(), 1);
    assert_eq!(bob_msgs[0]["type"], "answer_rejected");
    assert_eq!(bob_msgs[0]["message"], "aliceさんの番です");
    assert!(drain(&mut alice_rx).await.is_empty());
}

#[tokio::test]
async fn mid_game_join_gets_full_lives_and_turn_update() {
    let room = Room::new(
        "room01".to_string(),
        "alice".to_string(),
        RoomSettings::default(),
        Arc::new(GenreDictionary::builtin()),
        None,
    );
    let (alice_tx, _alice_rx) = outbox();
    room.seat_creator("alice", alice_tx).await;
    let (bob_tx, _bob_rx) = outbox();
    room.seat_player("bob", bob_tx).await.unwrap();
    room.start_game("alice", None).await.unwrap();

    let (carol_tx, mut carol_rx) = outbox();
    room.seat_player("carol", carol_tx).await.unwrap();

    assert_eq!(room.lives().await["carol"], 3);
    let messages = drain(&mut carol_rx).await;
    assert!(messages.iter().any(|m| m["type"] == "turn_update"));
    let snapshot = &messages[0];
    assert_eq!(snapshot["type"], "room_joined");
    assert_eq!(snapshot["status"], "playing");
}

#[tokio::test]
async fn room_capacity_is_enforced() {
    let settings = RoomSettings {
        max_players: 2,
        ..Default::default()
    };
    let room = Room::new(
        "room01".to_string(),
        "alice".to_string(),
        settings,
        Arc::new(GenreDictionary::builtin()),
        None,
    );
    let (tx, _rx) = outbox();
    room.seat_creator("alice", tx).await;
    let (tx, _rx) = outbox();
    room.seat_player("bob", tx).await.unwrap();

    let (tx, _rx) = outbox();
    let err = room.seat_player("carol", tx).await.unwrap_err();
    assert_eq!(err, "ルームが満員です（最大2人）");

    let (tx, _rx) = outbox();
    let err = room.seat_player("bob", tx).await.unwrap_err();
    assert_eq!(err, "名前「bob」はすでに使われています");

    let mut names = room.player_names().await;
    names.sort();
    assert_eq!(names, vec!["alice", "bob"]);
}

#[tokio::test]
async fn settings_override_on_start_is_broadcast() {
    let room = Room::new(
        "room01".to_string(),
        "alice".to_string(),
        RoomSettings {
            name: "部屋".to_string(),
            ..Default::default()
        },
        Arc::new(GenreDictionary::builtin()),
        None,
    );
    let (tx, mut rx) = outbox();
    room.seat_creator("alice", tx).await;
    drain(&mut rx).await;

    let override_settings = RoomSettings {
        max_lives: 5,
        ..Default::default()
    };
    room.start_game("alice", Some(override_settings)).await.unwrap();

    let messages = drain(&mut rx).await;
    assert_eq!(messages[0]["type"], "settings_updated");
    // the room name survives an override that omits it
    assert_eq!(messages[0]["settings"]["name"], "部屋");
    assert_eq!(messages[0]["settings"]["maxLives"], 5);
    assert_eq!(messages[1]["type"], "game_started");
    assert_eq!(messages[1]["maxLives"], 5);
}
