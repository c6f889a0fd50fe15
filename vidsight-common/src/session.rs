//! Session-keyed progress registry
//!
//! Maps a session identifier to at most one open progress channel.
//!
//! Delivery is best-effort and at-most-once:
//! - `push` to a session with no registered channel is a silent no-op (nothing is buffered)
//! - a later `subscribe` for the same id replaces the earlier channel (last writer wins);
//!   the replaced subscriber sees its stream end
//! - dropping a [`ProgressSubscription`] unregisters it, unless it has already been replaced
//!
//! Final analysis results never depend on any progress event being received.

use crate::events::{ChannelMessage, ProgressEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::debug;

struct ChannelSlot {
    generation: u64,
    tx: mpsc::UnboundedSender<ChannelMessage>,
}

/// Registry of open progress channels, one per session id
///
/// Cheap to clone; all clones share the same registry.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    channels: Arc<Mutex<HashMap<String, ChannelSlot>>>,
    next_generation: Arc<AtomicU64>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ChannelSlot>> {
        // Slots hold no invariants a panicking holder could break
        self.channels.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open a progress channel for `session_id`
    ///
    /// The returned subscription yields `Connected` first, then progress messages
    /// in emission order.
    pub fn subscribe(&self, session_id: impl Into<String>) -> ProgressSubscription {
        let session_id = session_id.into();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        // Receiver is alive, send cannot fail
        let _ = tx.send(ChannelMessage::Connected);

        let replaced = self
            .lock()
            .insert(session_id.clone(), ChannelSlot { generation, tx })
            .is_some();

        debug!(session_id = %session_id, generation, replaced, "Progress channel registered");

        ProgressSubscription {
            session_id,
            generation,
            rx,
            registry: self.clone(),
        }
    }

    /// Deliver `event` to the channel registered for `session_id`, if any
    ///
    /// Never blocks and never fails.
    pub fn push(&self, session_id: &str, event: ProgressEvent) {
        let mut channels = self.lock();

        let Some(slot) = channels.get(session_id) else {
            debug!(session_id = %session_id, step = event.step_index, "No progress channel, event dropped");
            return;
        };

        if slot.tx.send(event.into()).is_err() {
            // Consumer went away without unsubscribing
            debug!(session_id = %session_id, "Progress channel closed, removing");
            channels.remove(session_id);
        }
    }

    /// Remove whatever channel is registered for `session_id`
    ///
    /// The subscriber's stream ends once it drains already-delivered messages.
    pub fn unsubscribe(&self, session_id: &str) {
        if self.lock().remove(session_id).is_some() {
            debug!(session_id = %session_id, "Progress channel unregistered");
        }
    }

    /// Remove the channel only if it is still the given registration
    fn release(&self, session_id: &str, generation: u64) {
        let mut channels = self.lock();
        if channels
            .get(session_id)
            .is_some_and(|slot| slot.generation == generation)
        {
            channels.remove(session_id);
            debug!(session_id = %session_id, generation, "Progress subscriber disconnected");
        }
    }

    /// Whether a channel is currently registered for `session_id`
    pub fn is_subscribed(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    /// Number of sessions with an open channel
    pub fn active_sessions(&self) -> usize {
        self.lock().len()
    }
}

/// Receiving end of one session's progress channel
///
/// Unregisters itself on drop (consumer disconnect).
pub struct ProgressSubscription {
    session_id: String,
    generation: u64,
    rx: mpsc::UnboundedReceiver<ChannelMessage>,
    registry: SessionRegistry,
}

impl ProgressSubscription {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Next message, or `None` once the channel has been unregistered or replaced
    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    pub fn try_recv(&mut self) -> Option<ChannelMessage> {
        self.rx.try_recv().ok()
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.registry.release(&self.session_id, self.generation);
    }
}
