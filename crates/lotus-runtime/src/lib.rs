//! Host-side runtime for the Lotus rendering engine.
//!
//! The engine runs out of process and talks to the host through a
//! byte-oriented callback. This crate provides:
//! - Decoding of engine buffers into typed messages
//! - A registry of live windows with a per-window lifecycle
//! - Routing of engine events to windows, app listeners and IPC channels
//! - A broadcast/subscribe IPC bus between host and renderers
//! - A command queue listeners use to act on the runtime mid-dispatch
//! - The `BackendBridge` contract the engine binding implements

pub mod bridge;
pub mod codec;
pub mod events;
pub mod ipc;
pub mod logging;
pub mod outbox;
pub mod router;
pub mod runtime;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{BackendBridge, BridgeConfig, BridgeFactory, EventSink, WindowHandle};
pub use codec::MessageCodec;
pub use events::{
    AppEvent, AppReadyInfo, DecodedMessage, IpcPair, LoadStatus, WindowEventKind, WindowEventName,
};
pub use ipc::IpcChannel;
pub use outbox::{Outbound, Outbox, WindowCommand};
pub use router::{RouteTargets, Router};
pub use runtime::{LazyRuntime, Runtime};
pub use window::{Window, WindowRegistry, WindowState};

pub use lotus_common::{LotusError, Result, SubscriptionId, WindowId};
pub use lotus_config::{RuntimeConfig, WindowOptions};
