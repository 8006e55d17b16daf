//! Delivery of decoded engine messages.
//!
//! App events go to app listeners, window events to the addressed window,
//! IPC pairs to channel subscribers. Nothing here ever fails outward: bad
//! buffers and unknown windows are logged and dropped so the engine's
//! stream keeps flowing.

use std::time::Instant;

use lotus_common::{DecodeError, EventEmitter, WindowId};
use tracing::{debug, info, trace, warn};

use crate::codec::MessageCodec;
use crate::events::{AppEvent, AppReadyInfo, DecodedMessage, IpcPair, WindowEventKind};
use crate::ipc::IpcChannel;
use crate::outbox::Outbox;
use crate::window::{WindowRegistry, WindowState};

/// Everything a message can be delivered to, borrowed for one dispatch.
pub struct RouteTargets<'a> {
    pub registry: &'a mut WindowRegistry,
    pub app: &'a mut EventEmitter<AppEvent, AppReadyInfo, Outbox>,
    pub ipc: &'a mut IpcChannel,
    /// Handed to app and IPC listeners for commands they issue.
    pub outbox: &'a Outbox,
}

#[derive(Debug)]
pub struct Router {
    codec: MessageCodec,
    profiler: Profiler,
}

impl Router {
    /// A codec without binary support is reported here, at startup,
    /// instead of on the first engine buffer.
    pub fn new(codec: MessageCodec, profiling: bool) -> Self {
        codec.warn_if_unavailable();
        Self {
            codec,
            profiler: Profiler::new(profiling),
        }
    }

    pub fn codec(&self) -> &MessageCodec {
        &self.codec
    }

    /// Decode one engine buffer and route it. Returns `false` if the
    /// buffer was dropped as undecodable.
    pub fn dispatch(&mut self, targets: &mut RouteTargets<'_>, bytes: &[u8]) -> bool {
        match self.codec.decode(bytes) {
            Ok(message) => {
                self.route(targets, message);
                true
            }
            // The codec already warned once.
            Err(DecodeError::CodecUnavailable) => false,
            Err(e) => {
                warn!(error = %e, len = bytes.len(), "dropping undecodable engine message");
                false
            }
        }
    }

    pub fn route(&mut self, targets: &mut RouteTargets<'_>, message: DecodedMessage) {
        match message {
            DecodedMessage::AppReady(info) => {
                self.profiler.mark("app ready");
                let notified = targets.app.emit(&AppEvent::Ready, targets.outbox, &info);
                debug!(listeners = notified, ipc_port = ?info.ipc_port, "app ready");
            }
            DecodedMessage::WindowEvent { window_id, kind } => {
                self.profiler.window_event(window_id, &kind);
                let Some(id) = window_id else {
                    trace!(?kind, "window event without a window id dropped");
                    return;
                };
                self.route_window_event(targets.registry, id, kind);
            }
            DecodedMessage::IpcPair(pair) => publish(targets, pair),
            DecodedMessage::IpcBatch(pairs) => {
                trace!(count = pairs.len(), "ipc batch");
                for pair in pairs {
                    publish(targets, pair);
                }
            }
        }
    }

    fn route_window_event(
        &mut self,
        registry: &mut WindowRegistry,
        id: WindowId,
        kind: WindowEventKind,
    ) {
        let Some(window) = registry.get_mut(id) else {
            trace!(window_id = %id, ?kind, "event for unknown window dropped");
            return;
        };

        window.apply(&kind);
        if window.state() == WindowState::Closed {
            registry.remove(id);
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(MessageCodec::new(), false)
    }
}

fn publish(targets: &mut RouteTargets<'_>, pair: IpcPair) {
    targets.ipc.publish(&pair.channel, targets.outbox, &pair.payload);
}

const PROFILE_TARGET: &str = "lotus::profile";

/// Startup timing, logged under the `lotus::profile` target.
#[derive(Debug)]
struct Profiler {
    enabled: bool,
    started: Instant,
}

impl Profiler {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            started: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn mark(&self, what: &str) {
        if self.enabled {
            info!(target: PROFILE_TARGET, elapsed_ms = self.elapsed_ms(), "{what}");
        }
    }

    /// Timing for `ready` and `load-status`, logged whether or not the
    /// window is registered. Returns the logged line.
    fn window_event(&self, id: Option<WindowId>, kind: &WindowEventKind) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let what = match kind {
            WindowEventKind::Ready => "window ready".to_string(),
            WindowEventKind::LoadStatus(status) => format!("load-status {status}"),
            _ => return None,
        };
        let window = id.map_or_else(|| "unknown".to_string(), |id| id.to_string());
        let elapsed_ms = self.elapsed_ms();

        info!(target: PROFILE_TARGET, window_id = %window, elapsed_ms, "{what}");
        if matches!(kind, WindowEventKind::LoadStatus(status) if status.is_complete()) {
            info!(target: PROFILE_TARGET, window_id = %window, total_ms = elapsed_ms, "total load time");
        }
        Some(format!("{window} {what}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{LoadStatus, WindowEventName};
    use crate::window::Window;
    use crate::testing::{pack, recorder, Spy};
    use lotus_config::WindowOptions;
    use serde_json::{json, Value};

    struct Fixture {
        spy: Spy,
        registry: WindowRegistry,
        app: EventEmitter<AppEvent, AppReadyInfo, Outbox>,
        ipc: IpcChannel,
        outbox: Outbox,
        router: Router,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                spy: Spy::default(),
                registry: WindowRegistry::new(),
                app: EventEmitter::new(),
                ipc: IpcChannel::new(),
                outbox: Outbox::new(),
                router: Router::default(),
            }
        }

        fn open(&mut self) -> WindowId {
            let mut bridge = self.spy.bridge();
            self.registry
                .create(&mut bridge, WindowOptions::default())
                .unwrap()
                .id()
        }

        fn route(&mut self, message: DecodedMessage) {
            let mut targets = RouteTargets {
                registry: &mut self.registry,
                app: &mut self.app,
                ipc: &mut self.ipc,
                outbox: &self.outbox,
            };
            self.router.route(&mut targets, message);
        }

        fn dispatch(&mut self, value: &Value) -> bool {
            let bytes = pack(value);
            let mut targets = RouteTargets {
                registry: &mut self.registry,
                app: &mut self.app,
                ipc: &mut self.ipc,
                outbox: &self.outbox,
            };
            self.router.dispatch(&mut targets, &bytes)
        }
    }

    fn window_event(id: WindowId, kind: WindowEventKind) -> DecodedMessage {
        DecodedMessage::WindowEvent {
            window_id: Some(id),
            kind,
        }
    }

    #[test]
    fn app_ready_reaches_listeners_without_windows() {
        let mut fx = Fixture::new();
        let (seen, listener) = recorder::<AppReadyInfo, Outbox>();
        fx.app.subscribe(AppEvent::Ready, listener);

        fx.route(DecodedMessage::AppReady(AppReadyInfo {
            ipc_port: Some(4123),
            ipc_token: Some("t0k".into()),
        }));

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].ipc_port, Some(4123));
        assert_eq!(seen.borrow()[0].ipc_token.as_deref(), Some("t0k"));
    }

    #[test]
    fn window_events_reach_only_the_addressed_window() {
        let mut fx = Fixture::new();
        let a = fx.open();
        let b = fx.open();
        let (seen_a, la) = recorder::<WindowEventKind, Window>();
        let (seen_b, lb) = recorder::<WindowEventKind, Window>();
        fx.registry.get_mut(a).unwrap().on(WindowEventName::FrameReady, la);
        fx.registry.get_mut(b).unwrap().on(WindowEventName::FrameReady, lb);

        fx.route(window_event(a, WindowEventKind::FrameReady));

        assert_eq!(seen_a.borrow().len(), 1);
        assert!(seen_b.borrow().is_empty());
        assert!(fx.registry.get(a).unwrap().has_painted());
        assert!(!fx.registry.get(b).unwrap().has_painted());
    }

    #[test]
    fn notifications_do_not_change_state() {
        let mut fx = Fixture::new();
        let a = fx.open();
        let (seen, listener) = recorder::<WindowEventKind, Window>();
        fx.registry.get_mut(a).unwrap().on(WindowEventName::Resized, listener);

        fx.route(window_event(a, WindowEventKind::Resized { width: 800, height: 600 }));
        fx.route(window_event(a, WindowEventKind::Focused));

        assert_eq!(
            *seen.borrow(),
            vec![WindowEventKind::Resized { width: 800, height: 600 }]
        );
        assert_eq!(fx.registry.get(a).unwrap().state(), WindowState::Created);
    }

    #[test]
    fn load_status_drives_state() {
        let mut fx = Fixture::new();
        let a = fx.open();

        fx.route(window_event(a, WindowEventKind::LoadStatus(LoadStatus::Started)));
        assert_eq!(fx.registry.get(a).unwrap().state(), WindowState::Loading);
        fx.route(window_event(a, WindowEventKind::LoadStatus(LoadStatus::Complete)));
        assert_eq!(fx.registry.get(a).unwrap().state(), WindowState::Ready);
    }

    #[test]
    fn closed_notifies_then_unregisters() {
        let mut fx = Fixture::new();
        let a = fx.open();
        let (seen, listener) = recorder::<WindowEventKind, Window>();
        fx.registry.get_mut(a).unwrap().on(WindowEventName::Closed, listener);

        fx.route(window_event(a, WindowEventKind::Closed));
        assert_eq!(*seen.borrow(), vec![WindowEventKind::Closed]);
        assert!(fx.registry.get(a).is_none());

        // later events for the same id are dropped
        fx.route(window_event(a, WindowEventKind::Closed));
        fx.route(window_event(a, WindowEventKind::Ready));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn unknown_or_missing_window_is_dropped() {
        let mut fx = Fixture::new();
        let a = fx.open();
        let (seen, listener) = recorder::<WindowEventKind, Window>();
        fx.registry.get_mut(a).unwrap().on(WindowEventName::Ready, listener);

        fx.route(window_event(WindowId(99), WindowEventKind::Ready));
        fx.route(DecodedMessage::WindowEvent {
            window_id: None,
            kind: WindowEventKind::Ready,
        });

        assert!(seen.borrow().is_empty());
        assert_eq!(fx.registry.len(), 1);
    }

    #[test]
    fn ipc_batch_publishes_each_pair_in_order() {
        let mut fx = Fixture::new();
        let (seen, listener) = recorder::<Value, Outbox>();
        fx.ipc.on("tick", listener);

        fx.route(DecodedMessage::IpcBatch(vec![
            IpcPair::new("tick", json!(1)),
            IpcPair::new("other", json!("x")),
            IpcPair::new("tick", json!(2)),
            IpcPair::new("tick", json!(3)),
        ]));

        assert_eq!(*seen.borrow(), vec![json!(1), json!(2), json!(3)]);
    }

    #[cfg(feature = "msgpack")]
    #[test]
    fn dispatch_decodes_and_routes() {
        let mut fx = Fixture::new();
        let (seen, listener) = recorder::<Value, Outbox>();
        fx.ipc.on("ping", listener);

        assert!(fx.dispatch(&json!(["ping", {"n": 1}])));
        assert_eq!(*seen.borrow(), vec![json!({"n": 1})]);
    }

    #[cfg(feature = "msgpack")]
    #[test]
    fn dispatch_drops_malformed_buffers() {
        let mut fx = Fixture::new();
        assert!(!fx.dispatch(&json!({"event": "no-such-event"})));
        assert!(!fx.dispatch(&json!({"window_id": 1})));
        assert!(!fx.dispatch(&json!(42)));

        let mut targets = RouteTargets {
            registry: &mut fx.registry,
            app: &mut fx.app,
            ipc: &mut fx.ipc,
            outbox: &fx.outbox,
        };
        assert!(!fx.router.dispatch(&mut targets, &[0xc1]));
    }

    #[test]
    fn ipc_listeners_get_the_outbox() {
        let mut fx = Fixture::new();
        fx.ipc.on("ping", |out, _| out.quit());
        fx.app.subscribe(AppEvent::Ready, |out, _| {
            out.create_window(WindowOptions::default())
        });

        fx.route(DecodedMessage::IpcPair(IpcPair::new("ping", Value::Null)));
        fx.route(DecodedMessage::AppReady(AppReadyInfo::default()));

        assert_eq!(fx.outbox.len(), 2);
    }

    #[test]
    fn profiling_covers_unregistered_and_anonymous_windows() {
        let profiler = Profiler::new(true);
        let complete = WindowEventKind::LoadStatus(LoadStatus::Complete);

        assert_eq!(
            profiler.window_event(Some(WindowId(9)), &WindowEventKind::Ready).as_deref(),
            Some("window-9 window ready")
        );
        assert_eq!(
            profiler.window_event(None, &complete).as_deref(),
            Some("unknown load-status complete")
        );
        assert_eq!(profiler.window_event(None, &WindowEventKind::Focused), None);
        assert_eq!(Profiler::new(false).window_event(None, &complete), None);
    }

    #[test]
    fn unavailable_codec_is_reported_at_startup() {
        let router = Router::new(MessageCodec::unavailable(), false);
        // already warned by the constructor
        assert!(!router.codec().warn_if_unavailable());
    }

    #[test]
    fn unavailable_codec_drops_everything() {
        let mut fx = Fixture::new();
        fx.router = Router::new(MessageCodec::unavailable(), false);
        let (seen, listener) = recorder::<Value, Outbox>();
        fx.ipc.on("ping", listener);

        assert!(!fx.dispatch(&json!(["ping", 1])));
        assert!(!fx.dispatch(&json!(["ping", 2])));
        assert!(seen.borrow().is_empty());
    }
}
