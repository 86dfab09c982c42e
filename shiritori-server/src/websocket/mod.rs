use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};
use warp::ws::{Message, WebSocket};

use crate::room::OUTBOX_CAPACITY;
use crate::room_manager::RoomManager;

pub mod rate_limiter;
pub mod session;


pub use rate_limiter::ConnectionRateLimiter;
pub use session::{ConnectionId, Session};

/// Time allowed to write a message to the peer.
const WRITE_WAIT: Duration = Duration::from_secs(10);
/// Time allowed between reads before the peer is considered dead. Our pings
/// keep a healthy peer's pongs arriving well inside this window.
const PONG_WAIT: Duration = Duration::from_secs(60);
/// Keepalive ping period. Must be less than `PONG_WAIT`.
const PING_PERIOD: Duration = Duration::from_secs(30);

/// Runs one client connection: a reader loop in this task plus a spawned
/// writer that drains the connection's outgoing queue with keepalives.
pub async fn handle_connection(websocket: WebSocket, rooms: Arc<RoomManager>) {
    let connection_id = ConnectionId::new();
    info!("new websocket connection: {}", connection_id);

    let (ws_sender, mut ws_receiver) = websocket.split();
    let (outbox, outbox_rx) = mpsc::channel::<String>(OUTBOX_CAPACITY);
    tokio::spawn(write_pump(connection_id, ws_sender, outbox_rx));

    let mut session = Session::new(connection_id, rooms, outbox);

    loop {
        let msg = match tokio::time::timeout(PONG_WAIT, ws_receiver.next()).await {
            Err(_) => {
                warn!("read timeout, dead peer: {}", connection_id);
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                warn!("websocket error for {}: {}", connection_id, e);
                break;
            }
            Ok(Some(Ok(msg))) => msg,
        };

        if msg.is_close() {
            break;
        }
        // Pongs and other control frames only refresh the read deadline
        let Ok(text) = msg.to_str() else {
            continue;
        };
        if session.handle_text(text).await {
            break;
        }
    }

    session.leave_current_room().await;
    info!("connection {} disconnected", connection_id);
    // Dropping the session closes the outbox; the writer drains and exits.
}

async fn write_pump(
    connection_id: ConnectionId,
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut outbox: mpsc::Receiver<String>,
) {
    let start = tokio::time::Instant::now() + PING_PERIOD;
    let mut ping = tokio::time::interval_at(start, PING_PERIOD);

    loop {
        tokio::select! {
            maybe_msg = outbox.recv() => {
                let Some(json) = maybe_msg else {
                    let _ = ws_sender.send(Message::close()).await;
                    return;
                };
                match tokio::time::timeout(WRITE_WAIT, ws_sender.send(Message::text(json))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!("failed to send to {}: {}", connection_id, e);
                        return;
                    }
                    Err(_) => {
                        warn!("write deadline exceeded for {}", connection_id);
                        return;
                    }
                }
            }
            _ = ping.tick() => {
                match tokio::time::timeout(WRITE_WAIT, ws_sender.send(Message::ping(Vec::new()))).await {
                    Ok(Ok(())) => {}
                    _ => return,
                }
            }
        }
    }
}
