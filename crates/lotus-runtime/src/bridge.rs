//! Contract between the host runtime and the engine binding.
//!
//! The engine binding owns the native event loop and its windows. The host
//! only ever sees it through these traits: it asks for windows, forwards
//! commands to them, and receives raw buffers through an [`EventSink`].
//!
//! Every command is fire-and-forget. Effects are observed later, if at all,
//! as events coming back through the sink.

use std::sync::{Arc, Mutex, MutexGuard};

use lotus_common::{BridgeError, WindowId};
use lotus_config::{RuntimeConfig, WindowOptions};
use tracing::debug;

/// Settings the engine binding is constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub profiling: bool,
    pub app_identifier: String,
    /// Codec script to inject into rendered pages.
    pub renderer_codec_source: Option<String>,
}

impl From<&RuntimeConfig> for BridgeConfig {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            profiling: config.profiling,
            app_identifier: config.app_identifier.clone(),
            renderer_codec_source: config.renderer_codec_source.clone(),
        }
    }
}

/// Queue the engine's event callback writes raw buffers into.
///
/// Cloneable and `Send`, so the engine may call it from its own thread.
/// The host drains it from its single dispatch thread; nothing behind the
/// sink is touched off that thread.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    queue: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue one engine buffer.
    pub fn push(&self, bytes: Vec<u8>) {
        self.lock().push(bytes);
    }

    /// Take every queued buffer, oldest first.
    pub fn drain(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The sink as a plain callback, for bindings that want a closure.
    pub fn callback(&self) -> impl Fn(Vec<u8>) + Send + Sync + 'static {
        let sink = self.clone();
        move |bytes| sink.push(bytes)
    }

    // A producer that panicked mid-push leaves whole buffers behind, so
    // the queue is still usable after poisoning.
    fn lock(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A native window owned by the engine.
pub trait WindowHandle {
    /// Identifier the engine allocated for this window.
    fn id(&self) -> WindowId;

    fn load_url(&self, url: &str);

    /// Deliver a JSON-serialized payload to the page on `channel`.
    fn send_to_renderer(&self, channel: &str, payload_json: &str);

    fn execute_script(&self, script: &str);

    /// Ask the engine to close the window. Completion arrives later as a
    /// `window-closed` event.
    fn close(&self);

    fn set_title(&self, title: &str);

    fn resize(&self, width: u32, height: u32);

    fn set_position(&self, x: i32, y: i32);

    fn show(&self);

    fn hide(&self);

    fn minimize(&self) {
        debug!(window_id = %self.id(), "minimize not supported by this bridge");
    }

    fn unminimize(&self) {
        debug!(window_id = %self.id(), "unminimize not supported by this bridge");
    }

    fn maximize(&self) {
        debug!(window_id = %self.id(), "maximize not supported by this bridge");
    }

    fn unmaximize(&self) {
        debug!(window_id = %self.id(), "unmaximize not supported by this bridge");
    }

    fn focus(&self) {
        debug!(window_id = %self.id(), "focus not supported by this bridge");
    }

    fn set_always_on_top(&self, always_on_top: bool) {
        debug!(window_id = %self.id(), always_on_top, "always-on-top not supported by this bridge");
    }

    fn request_attention(&self) {
        debug!(window_id = %self.id(), "request-attention not supported by this bridge");
    }

    fn set_decorations(&self, decorations: bool) {
        debug!(window_id = %self.id(), decorations, "decorations not supported by this bridge");
    }
}

/// Builds the engine binding from its settings and the sink its event
/// callback should write into. Invoked at most once per runtime.
pub trait BridgeFactory:
    FnOnce(BridgeConfig, EventSink) -> Result<Box<dyn BackendBridge>, BridgeError>
{
}

impl<F> BridgeFactory for F where
    F: FnOnce(BridgeConfig, EventSink) -> Result<Box<dyn BackendBridge>, BridgeError>
{
}

/// The engine binding itself.
pub trait BackendBridge {
    /// Create a window and return once the engine has allocated its id.
    /// Does not wait for the window to become ready.
    fn create_window(&mut self, options: &WindowOptions)
        -> Result<Box<dyn WindowHandle>, BridgeError>;

    /// Shut the engine down.
    fn quit(&mut self);
}
