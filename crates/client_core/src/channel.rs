//! The sync channel: one persistent websocket to the controller, translated
//! into typed [`ChannelEvent`]s.

use std::sync::Arc;

use futures::{Sink, SinkExt, StreamExt};
use shared::{
    domain::Sequence,
    error::ProtocolError,
    protocol::{ClientCommand, ServerMessage},
};
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ChannelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    SequenceReceived(Sequence),
    ProtocolError(ProtocolError),
    ChannelClosed { reason: Option<String> },
}

struct ChannelShared {
    state: ChannelState,
    // Bumped on every connect so a finished older connection cannot close a newer one.
    generation: u64,
    // Last generation that already emitted `ChannelClosed`.
    reported: u64,
    outbound: Option<mpsc::UnboundedSender<Message>>,
}

pub struct SyncChannel {
    shared: Arc<Mutex<ChannelShared>>,
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl SyncChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let channel = Self {
            shared: Arc::new(Mutex::new(ChannelShared {
                state: ChannelState::Disconnected,
                generation: 0,
                reported: 0,
                outbound: None,
            })),
            events,
        };
        (channel, events_rx)
    }

    pub async fn state(&self) -> ChannelState {
        self.shared.lock().await.state
    }

    /// Opens the websocket at `url` and requests the current sequence.
    ///
    /// A failed attempt leaves the channel `Closed` and also emits
    /// `ChannelClosed`, same as losing an open connection.
    pub async fn connect(&self, url: &Url) -> Result<(), ChannelError> {
        let hello = ClientCommand::GetSequence
            .to_frame()
            .map_err(|err| ChannelError::Encode(err.to_string()))?;

        let generation = {
            let mut guard = self.shared.lock().await;
            if matches!(guard.state, ChannelState::Connecting | ChannelState::Open) {
                return Err(ChannelError::AlreadyActive { state: guard.state });
            }
            guard.state = ChannelState::Connecting;
            guard.generation += 1;
            guard.generation
        };

        info!(%url, "sync: connecting");
        let ws_stream = match connect_async(url.as_str()).await {
            Ok((stream, _)) => stream,
            Err(err) => {
                let reason = err.to_string();
                warn!(%url, %reason, "sync: connect failed");
                finish_connection(&self.shared, &self.events, generation, Some(reason.clone()))
                    .await;
                return Err(ChannelError::Connect {
                    url: url.to_string(),
                    reason,
                });
            }
        };
        let (writer, mut reader) = ws_stream.split();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<Message>();
        spawn_writer(
            writer,
            outbound_rx,
            Arc::clone(&self.shared),
            self.events.clone(),
            generation,
        );

        {
            let mut guard = self.shared.lock().await;
            guard.state = ChannelState::Open;
            guard.outbound = Some(outbound_tx.clone());
        }
        let _ = outbound_tx.send(Message::Text(hello));
        info!(%url, "sync: channel open, requested sequence");

        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        tokio::spawn(async move {
            let reason = loop {
                let Some(frame) = reader.next().await else {
                    break None;
                };
                match frame {
                    Ok(Message::Text(text)) => match ServerMessage::decode(&text) {
                        Ok(ServerMessage::Sequence { sequence }) => {
                            if !is_delivering(&shared, generation).await {
                                debug!(generation, "sync: dropping sequence from closed connection");
                                continue;
                            }
                            debug!(steps = sequence.len(), "sync: received sequence");
                            let _ = events.send(ChannelEvent::SequenceReceived(sequence));
                        }
                        Ok(other) => {
                            debug!(kind = other.kind(), "sync: ignoring server message");
                        }
                        Err(err) => {
                            warn!(%err, "sync: malformed server frame");
                            if is_delivering(&shared, generation).await {
                                let _ = events.send(ChannelEvent::ProtocolError(err));
                            }
                        }
                    },
                    Ok(Message::Close(frame)) => {
                        break frame
                            .map(|frame| frame.reason.to_string())
                            .filter(|reason| !reason.is_empty());
                    }
                    Ok(_) => {}
                    Err(err) => break Some(err.to_string()),
                }
            };
            finish_connection(&shared, &events, generation, reason).await;
        });

        Ok(())
    }

    /// Transmits the full sequence. Only valid while `Open`; nothing is queued
    /// for later.
    pub async fn send_save(&self, sequence: &Sequence) -> Result<(), ChannelError> {
        let guard = self.shared.lock().await;
        let outbound = match (guard.state, guard.outbound.as_ref()) {
            (ChannelState::Open, Some(outbound)) => outbound,
            (state, _) => return Err(ChannelError::NotReady { state }),
        };

        let frame = ClientCommand::SaveSequence {
            sequence: sequence.clone(),
        }
        .to_frame()
        .map_err(|err| ChannelError::Encode(err.to_string()))?;
        // The writer task is gone, so the connection is closing even if the
        // state has not caught up yet.
        outbound
            .send(Message::Text(frame))
            .map_err(|_| ChannelError::NotReady {
                state: ChannelState::Closed,
            })?;
        debug!(steps = sequence.len(), "sync: save_sequence sent");
        Ok(())
    }

    /// Client-side close. The channel reports `Closed` right away; the close
    /// handshake finishes in the background and ends with `ChannelClosed`.
    pub async fn close(&self) {
        let mut guard = self.shared.lock().await;
        if guard.state == ChannelState::Disconnected {
            return;
        }
        info!(state = ?guard.state, "sync: closing channel");
        guard.state = ChannelState::Closed;
        guard.outbound = None;
    }
}

/// Drains queued frames into the socket. A failed send ends the connection.
fn spawn_writer<S>(
    mut writer: S,
    mut outbound_rx: mpsc::UnboundedReceiver<Message>,
    shared: Arc<Mutex<ChannelShared>>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    generation: u64,
) -> JoinHandle<()>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: std::fmt::Display,
{
    tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let sent = writer.send(message).await.map_err(|err| err.to_string());
            if let Err(reason) = sent {
                warn!(%reason, "sync: websocket send failed");
                finish_connection(&shared, &events, generation, Some(reason)).await;
                return;
            }
        }
        let _ = writer.close().await;
    })
}

/// Frames from `generation` reach the editor only while it is the live, open
/// connection.
async fn is_delivering(shared: &Mutex<ChannelShared>, generation: u64) -> bool {
    let guard = shared.lock().await;
    guard.generation == generation && guard.state == ChannelState::Open
}

async fn finish_connection(
    shared: &Mutex<ChannelShared>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
    generation: u64,
    reason: Option<String>,
) {
    {
        let mut guard = shared.lock().await;
        if guard.generation != generation {
            debug!(generation, "sync: superseded connection finished");
            return;
        }
        if guard.reported == generation {
            return;
        }
        guard.reported = generation;
        guard.state = ChannelState::Closed;
        guard.outbound = None;
    }
    info!(reason = reason.as_deref().unwrap_or("none"), "sync: channel closed");
    let _ = events.send(ChannelEvent::ChannelClosed { reason });
}

#[cfg(test)]
#[path = "tests/channel_tests.rs"]
mod tests;
