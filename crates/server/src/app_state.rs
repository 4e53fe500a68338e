use std::sync::Arc;

use shared::protocol::ServerMessage;
use tokio::sync::broadcast;

use crate::store::SequenceStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<dyn SequenceStore>,
    /// Sequence pushes fanned out to every connected editor.
    pub(crate) events: broadcast::Sender<ServerMessage>,
}
