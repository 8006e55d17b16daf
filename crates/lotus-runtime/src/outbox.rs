//! Commands queued from inside listeners.
//!
//! Listeners run while the runtime is mid-dispatch and cannot borrow it.
//! They get an [`Outbox`] instead; whatever they queue is executed in
//! order once the current buffer has been routed.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use lotus_common::{LotusError, WindowId};
use lotus_config::WindowOptions;
use serde::Serialize;
use tracing::trace;

/// A command addressed to one window.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowCommand {
    LoadUrl(String),
    /// Channel and an already-serialized JSON payload.
    SendToRenderer { channel: String, json: String },
    ExecuteScript(String),
    Close,
    SetTitle(String),
    Resize { width: u32, height: u32 },
    SetPosition { x: i32, y: i32 },
    Show,
    Hide,
    Minimize,
    Unminimize,
    Maximize,
    Unmaximize,
    Focus,
    SetAlwaysOnTop(bool),
    RequestAttention,
    SetDecorations(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// IPC message for every live window.
    Broadcast { channel: String, json: String },
    ToWindow { id: WindowId, command: WindowCommand },
    CreateWindow(WindowOptions),
    Quit,
}

/// Shared FIFO of [`Outbound`] commands. Clones share one queue.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    queue: Rc<RefCell<VecDeque<Outbound>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Broadcast `payload` on `channel`. Serialized now, so a failure is
    /// reported to the caller rather than at flush time.
    pub fn send<T: Serialize + ?Sized>(&self, channel: &str, payload: &T) -> Result<(), LotusError> {
        let json = to_json(payload)?;
        self.push(Outbound::Broadcast {
            channel: channel.to_string(),
            json,
        });
        Ok(())
    }

    /// Send `payload` on `channel` to one window only.
    pub fn send_to<T: Serialize + ?Sized>(
        &self,
        id: WindowId,
        channel: &str,
        payload: &T,
    ) -> Result<(), LotusError> {
        let json = to_json(payload)?;
        self.to_window(
            id,
            WindowCommand::SendToRenderer {
                channel: channel.to_string(),
                json,
            },
        );
        Ok(())
    }

    pub fn create_window(&self, options: WindowOptions) {
        self.push(Outbound::CreateWindow(options));
    }

    pub fn to_window(&self, id: WindowId, command: WindowCommand) {
        self.push(Outbound::ToWindow { id, command });
    }

    pub fn load_url(&self, id: WindowId, url: &str) {
        self.to_window(id, WindowCommand::LoadUrl(url.to_string()));
    }

    pub fn execute_script(&self, id: WindowId, script: &str) {
        self.to_window(id, WindowCommand::ExecuteScript(script.to_string()));
    }

    pub fn close_window(&self, id: WindowId) {
        self.to_window(id, WindowCommand::Close);
    }

    pub fn quit(&self) {
        self.push(Outbound::Quit);
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Oldest queued command. The borrow ends before the caller runs it,
    /// so executing a command may queue more.
    pub(crate) fn pop(&self) -> Option<Outbound> {
        self.queue.borrow_mut().pop_front()
    }

    fn push(&self, command: Outbound) {
        trace!(?command, "command queued");
        self.queue.borrow_mut().push_back(command);
    }
}

fn to_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, LotusError> {
    serde_json::to_string(payload).map_err(|e| LotusError::Serialize(e.to_string()))
}
