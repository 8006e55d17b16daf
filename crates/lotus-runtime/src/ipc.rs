//! Named-channel messaging between the host and renderer pages.
//!
//! Inbound pairs arrive from the engine through the router and are
//! published to channel subscribers. Outbound messages are broadcast to
//! every live window; there is no per-window addressing here (use
//! [`Window::send_to_renderer`](crate::Window::send_to_renderer) for that).

use lotus_common::{EventEmitter, LotusError, SubscriptionId};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::outbox::Outbox;
use crate::window::WindowRegistry;

#[derive(Debug, Default)]
pub struct IpcChannel {
    subscribers: EventEmitter<String, Value, Outbox>,
}

impl IpcChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every message on `channel`. Replies and other
    /// commands go through the [`Outbox`] the listener is handed.
    pub fn on(
        &mut self,
        channel: impl Into<String>,
        listener: impl FnMut(&Outbox, &Value) + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(channel.into(), listener)
    }

    /// Subscribe to the next message on `channel` only.
    pub fn once(
        &mut self,
        channel: impl Into<String>,
        listener: impl FnMut(&Outbox, &Value) + 'static,
    ) -> SubscriptionId {
        self.subscribers.once(channel.into(), listener)
    }

    pub fn off(&mut self, subscription: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(subscription)
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.subscribers.listener_count(channel)
    }

    /// Deliver an inbound message to the subscribers of `channel`.
    /// A channel nobody listens on swallows the message.
    pub fn publish(&mut self, channel: &str, outbox: &Outbox, payload: &Value) -> usize {
        let delivered = self.subscribers.emit(channel, outbox, payload);
        if delivered == 0 {
            trace!(channel, "no subscribers for ipc message");
        }
        delivered
    }

    /// Broadcast `payload` on `channel` to every live window. The payload
    /// is serialized once. Returns how many windows it went to.
    pub fn send<T: Serialize + ?Sized>(
        &self,
        windows: &WindowRegistry,
        channel: &str,
        payload: &T,
    ) -> Result<usize, LotusError> {
        if windows.is_empty() {
            debug!(channel, "ipc send with no open windows");
            return Ok(0);
        }

        let json =
            serde_json::to_string(payload).map_err(|e| LotusError::Serialize(e.to_string()))?;
        Ok(windows.broadcast(channel, &json))
    }
}
