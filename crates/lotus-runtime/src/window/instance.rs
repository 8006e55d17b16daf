use std::cell::RefCell;

use lotus_common::{EventEmitter, LotusError, SubscriptionId, WindowId};
use lotus_config::WindowOptions;
use serde::Serialize;
use tracing::{debug, trace};

use crate::bridge::WindowHandle;
use crate::events::{WindowEventKind, WindowEventName};
use crate::outbox::WindowCommand;

use super::lifecycle::{transition, WindowState};

/// A live engine window. Owned by the [`WindowRegistry`](super::WindowRegistry);
/// gone from it once the engine reports `window-closed`.
pub struct Window {
    id: WindowId,
    state: WindowState,
    /// Effective options after defaults and root resolution.
    options: WindowOptions,
    /// Set by the first `frame-ready`.
    first_frame: bool,
    /// Last URL requested (best-effort tracking).
    current_url: RefCell<Option<String>>,
    handle: Box<dyn WindowHandle>,
    listeners: EventEmitter<WindowEventName, WindowEventKind, Window>,
}

impl Window {
    pub(crate) fn new(options: WindowOptions, handle: Box<dyn WindowHandle>) -> Self {
        Self {
            id: handle.id(),
            state: WindowState::Created,
            current_url: RefCell::new(options.initial_url.clone()),
            options,
            first_frame: false,
            handle,
            listeners: EventEmitter::new(),
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn options(&self) -> &WindowOptions {
        &self.options
    }

    /// Whether the engine has painted at least one frame.
    pub fn has_painted(&self) -> bool {
        self.first_frame
    }

    pub fn current_url(&self) -> Option<String> {
        self.current_url.borrow().clone()
    }

    // -- Listeners --

    /// Listen for `event` on this window until unsubscribed. The listener
    /// gets the window itself, so it can issue commands from inside.
    pub fn on(
        &mut self,
        event: WindowEventName,
        listener: impl FnMut(&Window, &WindowEventKind) + 'static,
    ) -> SubscriptionId {
        self.listeners.subscribe(event, listener)
    }

    /// Listen for the next `event` only.
    pub fn once(
        &mut self,
        event: WindowEventName,
        listener: impl FnMut(&Window, &WindowEventKind) + 'static,
    ) -> SubscriptionId {
        self.listeners.once(event, listener)
    }

    pub fn off(&mut self, subscription: SubscriptionId) -> bool {
        self.listeners.unsubscribe(subscription)
    }

    /// Feed one engine event through the lifecycle. Returns whether
    /// listeners were notified.
    pub(crate) fn apply(&mut self, event: &WindowEventKind) -> bool {
        let step = transition(self.state, event);
        if !step.emit {
            trace!(window_id = %self.id, ?event, "event after close dropped");
            return false;
        }

        if step.next != self.state {
            debug!(
                window_id = %self.id,
                from = ?self.state,
                to = ?step.next,
                "window state changed"
            );
            self.state = step.next;
        }
        if matches!(event, WindowEventKind::FrameReady) && !self.first_frame {
            debug!(window_id = %self.id, "first frame painted");
            self.first_frame = true;
        }

        // Listeners borrow the window, so they are detached while they run.
        let mut listeners = std::mem::take(&mut self.listeners);
        listeners.emit(&event.name(), self, event);
        self.listeners = listeners;
        true
    }

    // -- Commands (fire-and-forget) --

    pub fn load_url(&self, url: &str) {
        *self.current_url.borrow_mut() = Some(url.to_string());
        self.handle.load_url(url);
    }

    /// Serialize `payload` to JSON and deliver it to this window's page.
    pub fn send_to_renderer<T: Serialize + ?Sized>(
        &self,
        channel: &str,
        payload: &T,
    ) -> Result<(), LotusError> {
        let json =
            serde_json::to_string(payload).map_err(|e| LotusError::Serialize(e.to_string()))?;
        self.handle.send_to_renderer(channel, &json);
        Ok(())
    }

    pub(crate) fn send_serialized(&self, channel: &str, json: &str) {
        self.handle.send_to_renderer(channel, json);
    }

    pub fn execute_script(&self, script: &str) {
        self.handle.execute_script(script);
    }

    /// Ask the engine to close this window. The window stays registered
    /// until the engine confirms with `window-closed`.
    pub fn close(&self) {
        self.handle.close();
    }

    pub fn set_title(&self, title: &str) {
        self.handle.set_title(title);
    }

    pub fn set_size(&self, width: u32, height: u32) {
        self.handle.resize(width, height);
    }

    pub fn set_position(&self, x: i32, y: i32) {
        self.handle.set_position(x, y);
    }

    pub fn show(&self) {
        self.handle.show();
    }

    pub fn hide(&self) {
        self.handle.hide();
    }

    pub fn minimize(&self) {
        self.handle.minimize();
    }

    pub fn unminimize(&self) {
        self.handle.unminimize();
    }

    pub fn maximize(&self) {
        self.handle.maximize();
    }

    pub fn unmaximize(&self) {
        self.handle.unmaximize();
    }

    pub fn focus(&self) {
        self.handle.focus();
    }

    pub fn set_always_on_top(&self, always_on_top: bool) {
        self.handle.set_always_on_top(always_on_top);
    }

    pub fn request_attention(&self) {
        self.handle.request_attention();
    }

    pub fn set_decorations(&self, decorations: bool) {
        self.handle.set_decorations(decorations);
    }

    /// Execute a queued command against this window.
    pub(crate) fn run(&self, command: &WindowCommand) {
        match command {
            WindowCommand::LoadUrl(url) => self.load_url(url),
            WindowCommand::SendToRenderer { channel, json } => self.send_serialized(channel, json),
            WindowCommand::ExecuteScript(script) => self.execute_script(script),
            WindowCommand::Close => self.close(),
            WindowCommand::SetTitle(title) => self.set_title(title),
            WindowCommand::Resize { width, height } => self.set_size(*width, *height),
            WindowCommand::SetPosition { x, y } => self.set_position(*x, *y),
            WindowCommand::Show => self.show(),
            WindowCommand::Hide => self.hide(),
            WindowCommand::Minimize => self.minimize(),
            WindowCommand::Unminimize => self.unminimize(),
            WindowCommand::Maximize => self.maximize(),
            WindowCommand::Unmaximize => self.unmaximize(),
            WindowCommand::Focus => self.focus(),
            WindowCommand::SetAlwaysOnTop(on) => self.set_always_on_top(*on),
            WindowCommand::RequestAttention => self.request_attention(),
            WindowCommand::SetDecorations(on) => self.set_decorations(*on),
        }
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("first_frame", &self.first_frame)
            .field("current_url", &self.current_url)
            .finish_non_exhaustive()
    }
}
