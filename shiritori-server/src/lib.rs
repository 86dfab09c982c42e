use std::sync::Arc;

use serde::Serialize;
use warp::http::StatusCode;
use warp::Filter;

use shiritori_types::{RoomSettings, RoomStatus};

pub mod config;
pub mod room;
pub mod room_manager;
pub mod websocket;

use room_manager::RoomManager;

pub fn create_routes(
    rooms: Arc<RoomManager>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let rooms_filter = warp::any().map({
        let rooms = rooms.clone();
        move || rooms.clone()
    });

    // WebSocket endpoint
    let websocket_route = warp::path("ws")
        .and(warp::ws())
        .and(rooms_filter.clone())
        .map(|ws: warp::ws::Ws, rooms: Arc<RoomManager>| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, rooms))
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    // Room summary for invite-card previews
    let room_info = warp::path!("room" / String)
        .and(warp::get())
        .and(rooms_filter)
        .and_then(handle_room_info);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket_route
        .or(health)
        .or(room_info)
        .with(cors)
        .with(warp::log("shiritori_server"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomInfoResponse {
    id: String,
    name: String,
    owner: String,
    status: RoomStatus,
    player_count: usize,
    settings: RoomSettings,
    players: Vec<String>,
}

async fn handle_room_info(
    room_id: String,
    rooms: Arc<RoomManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match rooms.get_room(&room_id).await {
        Some(room) => {
            let snapshot = room.snapshot().await;
            let players: Vec<String> = snapshot.players.iter().map(|p| p.name.clone()).collect();
            let response = RoomInfoResponse {
                id: room.id.clone(),
                name: snapshot.settings.name.clone(),
                owner: snapshot.owner.clone(),
                status: snapshot.status,
                player_count: players.len(),
                settings: snapshot.settings,
                players,
            };
            Ok(warp::reply::with_status(
                warp::reply::json(&response),
                StatusCode::OK,
            ))
        }
        None => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": "Room not found"
            })),
            StatusCode::NOT_FOUND,
        )),
    }
}
