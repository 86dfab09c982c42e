use std::sync::Arc;

use tokio::signal;
use tracing::info;

use shiritori_core::GenreDictionary;
use shiritori_server::room::{GameOverHook, GameOverReport};
use shiritori_server::room_manager::{RoomManager, ROOM_CLEANUP_INTERVAL, ROOM_MAX_EMPTY_AGE};
use shiritori_server::{config::Config, create_routes};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting shiritori server...");

    let config = Config::new();

    let genres = match &config.genres_directory {
        Some(dir) => match GenreDictionary::from_dir(dir) {
            Ok(dict) => {
                info!("Loaded genre word lists from directory: {}", dir);
                Arc::new(dict)
            }
            Err(e) => {
                tracing::error!("Failed to load genre lists from '{}': {}", dir, e);
                tracing::error!("Set GENRES_DIRECTORY to a directory of .txt word lists, or unset it to use the built-in lists.");
                std::process::exit(1);
            }
        },
        None => Arc::new(GenreDictionary::builtin()),
    };

    // The result archive is an external collaborator; this hook is its entry
    // point. Without an archiver we only log the report.
    let on_game_over: GameOverHook = Arc::new(|report: &GameOverReport| {
        info!(
            "game finished: roomId={} reason={} winner={:?} words={}",
            report.room_id,
            report.reason,
            report.winner,
            report.history.len()
        );
        None
    });

    let rooms = Arc::new(RoomManager::new(genres).with_game_over_hook(on_game_over));
    rooms.start_cleanup(ROOM_CLEANUP_INTERVAL, ROOM_MAX_EMPTY_AGE);

    let routes = create_routes(rooms.clone());

    let addr = (
        config.host.parse::<std::net::IpAddr>().expect("Invalid HOST"),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!("Server started on {}. Press Ctrl+C to stop.", addr);
    server.await;
    rooms.stop_cleanup();
    info!("Server shutdown complete.");
}
