use std::time::Duration;

use shared::domain::{Axis, MotorId, Sequence};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use url::Url;

pub mod channel;
pub mod error;
pub mod reducer;
pub mod transport;

pub use channel::{ChannelEvent, ChannelState, SyncChannel};
pub use error::{ChannelError, EditorError};
pub use reducer::EditIntent;

const EDITOR_EVENT_CAPACITY: usize = 64;

/// What the event loop owner should do after the connection drops. The channel
/// itself never reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    #[default]
    Never,
    FixedDelay(Duration),
}

impl ReconnectPolicy {
    pub fn delay(&self) -> Option<Duration> {
        match self {
            ReconnectPolicy::Never => None,
            ReconnectPolicy::FixedDelay(delay) => Some(*delay),
        }
    }
}

/// Everything the presentation layer needs to re-render or report.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    SequenceReplaced(Sequence),
    SequenceEdited(Sequence),
    SaveSent,
    Error(EditorError),
}

/// Sole owner of the current sequence. Local intents go through the reducer,
/// saves go out through the sync channel, and a sequence pushed by the
/// controller replaces the held one wholesale (unsaved edits are dropped).
pub struct EditorController {
    sequence: Sequence,
    channel: SyncChannel,
    channel_events: mpsc::UnboundedReceiver<ChannelEvent>,
    page_url: Option<Url>,
    reconnect_policy: ReconnectPolicy,
    events: broadcast::Sender<EditorEvent>,
}

impl Default for EditorController {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorController {
    pub fn new() -> Self {
        let (channel, channel_events) = SyncChannel::new();
        let (events, _) = broadcast::channel(EDITOR_EVENT_CAPACITY);
        Self {
            sequence: Sequence::default(),
            channel,
            channel_events,
            page_url: None,
            reconnect_policy: ReconnectPolicy::Never,
            events,
        }
    }

    pub fn with_reconnect_policy(mut self, reconnect_policy: ReconnectPolicy) -> Self {
        self.reconnect_policy = reconnect_policy;
        self
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        self.reconnect_policy
    }

    pub async fn channel_state(&self) -> ChannelState {
        self.channel.state().await
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    /// Connects to the sync endpoint belonging to `page_url`.
    ///
    /// `reconnect` targets the last page URL that was actually dialed,
    /// failed dials included. A rejected call leaves it untouched.
    pub async fn connect(&mut self, page_url: &Url) -> Result<(), ChannelError> {
        let ws_url = transport::sync_url(page_url)?;
        let result = self.channel.connect(&ws_url).await;
        if matches!(result, Ok(()) | Err(ChannelError::Connect { .. })) {
            self.page_url = Some(page_url.clone());
        }
        result
    }

    pub async fn reconnect(&mut self) -> Result<(), ChannelError> {
        let Some(page_url) = self.page_url.clone() else {
            return Err(ChannelError::NotReady {
                state: self.channel.state().await,
            });
        };
        info!(%page_url, "editor: reconnecting");
        self.connect(&page_url).await
    }

    pub async fn disconnect(&mut self) {
        self.channel.close().await;
    }

    pub fn apply_intent(&mut self, intent: EditIntent) -> Result<(), EditorError> {
        match reducer::apply(&self.sequence, &intent) {
            Ok(next) => {
                debug!(intent = intent.name(), steps = next.len(), "editor: applied edit");
                self.sequence = next;
                self.publish(EditorEvent::SequenceEdited(self.sequence.clone()));
                Ok(())
            }
            Err(err) => {
                let err = EditorError::from(err);
                warn!(intent = intent.name(), %err, "editor: rejected edit");
                self.publish(EditorEvent::Error(err.clone()));
                Err(err)
            }
        }
    }

    pub fn on_motor_change(
        &mut self,
        step: usize,
        motor: MotorId,
        value: f64,
        axis: Axis,
    ) -> Result<(), EditorError> {
        self.apply_intent(EditIntent::SetMotorValue {
            step,
            motor,
            axis,
            value,
        })
    }

    pub fn on_dwell_change(&mut self, step: usize, value: f64) -> Result<(), EditorError> {
        self.apply_intent(EditIntent::SetDwell { step, value })
    }

    pub fn on_add_step(&mut self) -> Result<(), EditorError> {
        self.apply_intent(EditIntent::AddStep)
    }

    pub fn on_remove_last_step(&mut self) -> Result<(), EditorError> {
        self.apply_intent(EditIntent::RemoveLastStep)
    }

    pub fn on_loop_change(&mut self, enabled: bool) -> Result<(), EditorError> {
        self.apply_intent(EditIntent::SetLoop(enabled))
    }

    pub fn on_start_with_home_change(&mut self, enabled: bool) -> Result<(), EditorError> {
        self.apply_intent(EditIntent::SetStartWithHome(enabled))
    }

    /// Fire-and-forget: the controller acknowledges by pushing a fresh sequence,
    /// if at all.
    pub async fn on_save(&mut self) -> Result<(), EditorError> {
        match self.channel.send_save(&self.sequence).await {
            Ok(()) => {
                info!(steps = self.sequence.len(), "editor: save sent");
                self.publish(EditorEvent::SaveSent);
                Ok(())
            }
            Err(err) => {
                let err = match err {
                    ChannelError::NotReady { state } => EditorError::ChannelNotReady { state },
                    other => EditorError::ProtocolError(other.to_string()),
                };
                warn!(%err, "editor: save rejected");
                self.publish(EditorEvent::Error(err.clone()));
                Err(err)
            }
        }
    }

    pub fn handle_channel_event(&mut self, event: ChannelEvent) -> EditorEvent {
        let event = match event {
            ChannelEvent::SequenceReceived(sequence) => {
                info!(steps = sequence.len(), "editor: sequence replaced by controller");
                self.sequence = sequence;
                EditorEvent::SequenceReplaced(self.sequence.clone())
            }
            ChannelEvent::ProtocolError(err) => EditorEvent::Error(err.into()),
            ChannelEvent::ChannelClosed { reason } => {
                EditorEvent::Error(EditorError::ChannelClosed { reason })
            }
        };
        self.publish(event.clone());
        event
    }

    /// Waits for the next event from the sync channel and applies it.
    pub async fn next_event(&mut self) -> Option<EditorEvent> {
        let event = self.channel_events.recv().await?;
        Some(self.handle_channel_event(event))
    }

    fn publish(&self, event: EditorEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
