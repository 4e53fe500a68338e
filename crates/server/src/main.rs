use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Router,
};
use shared::protocol::{ClientCommand, ServerMessage};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod app_state;
mod config;
mod store;

use app_state::AppState;
use config::{load_settings, prepare_sequence_path, Settings};
use store::{FileSequenceStore, MemorySequenceStore, SequenceStore};

/// `sequence_file` value that keeps the sequence in memory only.
const MEMORY_STORE: &str = ":memory:";
const PUSH_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let store = open_store(&settings)?;
    let (events, _) = broadcast::channel(PUSH_CAPACITY);
    let app = build_router(Arc::new(AppState { store, events }));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn SequenceStore>> {
    if settings.sequence_file.as_os_str() == MEMORY_STORE {
        warn!("sequence kept in memory only; saves are lost on restart");
        return Ok(Arc::new(MemorySequenceStore::default()));
    }
    let path = prepare_sequence_path(&settings.sequence_file)?;
    info!(path = %path.display(), "using sequence file");
    Ok(Arc::new(FileSequenceStore::new(path)))
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: WebSocket) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let connection_id = Uuid::new_v4();
    info!(%connection_id, "ws: editor connected");

    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut pushes = state.events.subscribe();

    let send_task = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                Some(message) = outbound_rx.recv() => message,
                pushed = pushes.recv() => match pushed {
                    Ok(message) => message,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(%connection_id, skipped, "ws: editor lagging behind pushes");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                else => break,
            };
            let text = match message.to_frame() {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let _ = outbound_tx.send(ServerMessage::Pong);
        match serde_json::from_str::<ClientCommand>(&text) {
            Ok(command) => handle_command(&state, command, &outbound_tx, connection_id).await,
            Err(err) => warn!(%connection_id, %err, "ws: ignoring unrecognized command"),
        }
    }

    send_task.abort();
    info!(%connection_id, "ws: editor disconnected");
}

async fn handle_command(
    state: &AppState,
    command: ClientCommand,
    outbound: &mpsc::UnboundedSender<ServerMessage>,
    connection_id: Uuid,
) {
    debug!(%connection_id, cmd = command.name(), "ws: command received");
    match command {
        ClientCommand::GetSequence => match state.store.load().await {
            Ok(sequence) => {
                info!(%connection_id, steps = sequence.len(), "ws: sending sequence");
                let _ = outbound.send(ServerMessage::Sequence { sequence });
            }
            Err(err) => error!(%connection_id, error = %format!("{err:#}"), "ws: failed to load sequence"),
        },
        ClientCommand::SaveSequence { sequence } => {
            if let Err(err) = state.store.save(&sequence).await {
                error!(%connection_id, error = %format!("{err:#}"), "ws: failed to save sequence");
                return;
            }
            info!(%connection_id, steps = sequence.len(), "ws: sequence saved, pushing to editors");
            let _ = state.events.send(ServerMessage::Sequence { sequence });
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
