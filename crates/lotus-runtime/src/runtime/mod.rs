//! The host runtime: one engine bridge plus everything routed from it.

mod lazy;

pub use lazy::LazyRuntime;

use lotus_common::{EventEmitter, LotusError, SubscriptionId, WindowId};
use lotus_config::{RuntimeConfig, WindowOptions};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::bridge::{BackendBridge, BridgeConfig, BridgeFactory, EventSink};
use crate::codec::MessageCodec;
use crate::events::{AppEvent, AppReadyInfo};
use crate::ipc::IpcChannel;
use crate::outbox::{Outbound, Outbox};
use crate::router::{RouteTargets, Router};
use crate::window::{Window, WindowRegistry};

/// Owns the engine bridge, the live windows, app listeners and IPC
/// subscriptions.
///
/// Single-threaded: the engine pushes buffers into the [`EventSink`] from
/// any thread, and the host delivers them with [`Runtime::pump`].
pub struct Runtime {
    config: RuntimeConfig,
    bridge: Box<dyn BackendBridge>,
    sink: EventSink,
    registry: WindowRegistry,
    app: EventEmitter<AppEvent, AppReadyInfo, Outbox>,
    ipc: IpcChannel,
    outbox: Outbox,
    router: Router,
}

impl Runtime {
    /// Construct the engine bridge. Fails if the factory does; nothing is
    /// retried.
    pub fn new(config: RuntimeConfig, factory: impl BridgeFactory) -> Result<Self, LotusError> {
        let sink = EventSink::new();
        let bridge = factory(BridgeConfig::from(&config), sink.clone())?;
        let router = Router::new(MessageCodec::new(), config.profiling);

        info!(
            app_identifier = %config.app_identifier,
            profiling = config.profiling,
            "runtime started"
        );

        Ok(Self {
            config,
            bridge,
            sink,
            registry: WindowRegistry::new(),
            app: EventEmitter::new(),
            ipc: IpcChannel::new(),
            outbox: Outbox::new(),
            router,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Whether engine buffers can be decoded at all.
    pub fn codec_available(&self) -> bool {
        self.router.codec().is_available()
    }

    // -- Windows --

    /// Create a window. Returns as soon as the engine has allocated its
    /// id; the window is not ready yet.
    pub fn create_window(&mut self, options: WindowOptions) -> Result<WindowId, LotusError> {
        let window = self.registry.create(&mut *self.bridge, options)?;
        Ok(window.id())
    }

    /// [`Runtime::create_window`] from a loosely-typed options value: a URL
    /// string, `null`, or a partial options object.
    pub fn create_window_from_json(
        &mut self,
        options: serde_json::Value,
    ) -> Result<WindowId, LotusError> {
        let options = WindowOptions::from_json(options)?;
        self.create_window(options)
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.registry.get(id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.registry.get_mut(id)
    }

    /// Ask the engine to close a window. Returns `false` for unknown ids.
    /// The window stays registered until `window-closed` arrives.
    pub fn close_window(&self, id: WindowId) -> bool {
        match self.registry.get(id) {
            Some(window) => {
                window.close();
                true
            }
            None => {
                debug!(window_id = %id, "close requested for unknown window");
                false
            }
        }
    }

    pub fn windows(&self) -> &WindowRegistry {
        &self.registry
    }

    // -- App events --

    /// Listen for `app-ready`.
    pub fn on_ready(
        &mut self,
        listener: impl FnMut(&Outbox, &AppReadyInfo) + 'static,
    ) -> SubscriptionId {
        self.app.subscribe(AppEvent::Ready, listener)
    }

    pub fn once_ready(
        &mut self,
        listener: impl FnMut(&Outbox, &AppReadyInfo) + 'static,
    ) -> SubscriptionId {
        self.app.once(AppEvent::Ready, listener)
    }

    pub fn off_ready(&mut self, subscription: SubscriptionId) -> bool {
        self.app.unsubscribe(subscription)
    }

    // -- IPC --

    pub fn ipc(&self) -> &IpcChannel {
        &self.ipc
    }

    pub fn ipc_mut(&mut self) -> &mut IpcChannel {
        &mut self.ipc
    }

    /// Broadcast `payload` on `channel` to every live window.
    pub fn send<T: Serialize + ?Sized>(
        &self,
        channel: &str,
        payload: &T,
    ) -> Result<usize, LotusError> {
        self.ipc.send(&self.registry, channel, payload)
    }

    // -- Engine events --

    /// Handle for the engine's event callback.
    pub fn event_sink(&self) -> EventSink {
        self.sink.clone()
    }

    /// Route every buffer queued in the sink, oldest first. Returns how
    /// many buffers were taken off the queue.
    pub fn pump(&mut self) -> usize {
        let buffers = self.sink.drain();
        for bytes in &buffers {
            self.dispatch(bytes);
        }
        self.flush_commands();
        buffers.len()
    }

    /// Route one engine buffer immediately, then run whatever the
    /// listeners queued. Returns `false` if it could not be decoded.
    pub fn dispatch(&mut self, bytes: &[u8]) -> bool {
        let mut targets = RouteTargets {
            registry: &mut self.registry,
            app: &mut self.app,
            ipc: &mut self.ipc,
            outbox: &self.outbox,
        };
        let routed = self.router.dispatch(&mut targets, bytes);
        self.flush_commands();
        routed
    }

    /// Queue shared with listeners. Commands pushed from outside a
    /// listener run on the next [`Runtime::flush_commands`] or dispatch.
    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// Run queued commands in order until the queue is empty, including
    /// ones queued while flushing. Returns how many ran.
    pub fn flush_commands(&mut self) -> usize {
        let mut ran = 0;
        while let Some(command) = self.outbox.pop() {
            self.run(command);
            ran += 1;
        }
        ran
    }

    fn run(&mut self, command: Outbound) {
        match command {
            Outbound::Broadcast { channel, json } => {
                let sent = self.registry.broadcast(&channel, &json);
                trace!(channel = %channel, windows = sent, "queued broadcast sent");
            }
            Outbound::ToWindow { id, command } => match self.registry.get(id) {
                Some(window) => window.run(&command),
                None => debug!(window_id = %id, ?command, "command for unknown window dropped"),
            },
            Outbound::CreateWindow(options) => {
                if let Err(e) = self.create_window(options) {
                    warn!(error = %e, "queued window creation failed");
                }
            }
            Outbound::Quit => self.quit(),
        }
    }

    /// Shut the engine down.
    pub fn quit(&mut self) {
        info!(windows = self.registry.len(), "runtime quitting");
        self.bridge.quit();
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("windows", &self.registry.ids())
            .field("pending", &self.sink.len())
            .field("queued_commands", &self.outbox.len())
            .finish_non_exhaustive()
    }
}
