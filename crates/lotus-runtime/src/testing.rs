//! Recording bridge and helpers shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lotus_common::{BridgeError, WindowId};
use lotus_config::WindowOptions;
use serde_json::Value;

use crate::bridge::{BackendBridge, BridgeConfig, EventSink, WindowHandle};

/// A command a window handle received.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LoadUrl(WindowId, String),
    SendToRenderer(WindowId, String, String),
    ExecuteScript(WindowId, String),
    Close(WindowId),
    SetTitle(WindowId, String),
    Resize(WindowId, u32, u32),
    SetPosition(WindowId, i32, i32),
    Show(WindowId),
    Hide(WindowId),
    Minimize(WindowId),
    Unminimize(WindowId),
    Maximize(WindowId),
    Unmaximize(WindowId),
    Focus(WindowId),
    SetAlwaysOnTop(WindowId, bool),
    RequestAttention(WindowId),
    SetDecorations(WindowId, bool),
}

/// Shared view of everything the recording bridge saw.
#[derive(Clone, Default)]
pub struct Spy {
    commands: Rc<RefCell<Vec<Command>>>,
    created: Rc<RefCell<Vec<WindowOptions>>>,
    config: Rc<RefCell<Option<BridgeConfig>>>,
    sink: Rc<RefCell<Option<EventSink>>>,
    next_id: Rc<Cell<u64>>,
    quits: Rc<Cell<usize>>,
    constructions: Rc<Cell<usize>>,
}

impl Spy {
    pub fn bridge(&self) -> RecordingBridge {
        RecordingBridge {
            spy: self.clone(),
        }
    }

    pub fn handle(&self, id: u64) -> Box<dyn WindowHandle> {
        Box::new(RecordingHandle {
            id: WindowId(id),
            commands: Rc::clone(&self.commands),
        })
    }

    /// A factory producing this spy's bridge.
    pub fn factory(
        &self,
    ) -> impl FnOnce(BridgeConfig, EventSink) -> Result<Box<dyn BackendBridge>, BridgeError> {
        let spy = self.clone();
        move |config, sink| {
            spy.constructions.set(spy.constructions.get() + 1);
            *spy.config.borrow_mut() = Some(config);
            *spy.sink.borrow_mut() = Some(sink);
            Ok(Box::new(spy.bridge()) as Box<dyn BackendBridge>)
        }
    }

    /// A factory that counts its invocation and fails.
    pub fn failing_factory(
        &self,
    ) -> impl FnOnce(BridgeConfig, EventSink) -> Result<Box<dyn BackendBridge>, BridgeError> {
        let spy = self.clone();
        move |_, _| {
            spy.constructions.set(spy.constructions.get() + 1);
            Err(BridgeError::Construction("engine library not found".into()))
        }
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.borrow().clone()
    }

    pub fn created_options(&self) -> Vec<WindowOptions> {
        self.created.borrow().clone()
    }

    pub fn config(&self) -> Option<BridgeConfig> {
        self.config.borrow().clone()
    }

    /// The sink handed to the factory, i.e. the engine's side of it.
    pub fn sink(&self) -> Option<EventSink> {
        self.sink.borrow().clone()
    }

    pub fn quits(&self) -> usize {
        self.quits.get()
    }

    pub fn constructions(&self) -> usize {
        self.constructions.get()
    }
}

/// Bridge that allocates ids from 1 and records what it is asked to do.
pub struct RecordingBridge {
    spy: Spy,
}

impl BackendBridge for RecordingBridge {
    fn create_window(
        &mut self,
        options: &WindowOptions,
    ) -> Result<Box<dyn WindowHandle>, BridgeError> {
        let id = self.spy.next_id.get() + 1;
        self.spy.next_id.set(id);
        self.spy.created.borrow_mut().push(options.clone());
        Ok(self.spy.handle(id))
    }

    fn quit(&mut self) {
        self.spy.quits.set(self.spy.quits.get() + 1);
    }
}

struct RecordingHandle {
    id: WindowId,
    commands: Rc<RefCell<Vec<Command>>>,
}

impl RecordingHandle {
    fn record(&self, command: Command) {
        self.commands.borrow_mut().push(command);
    }
}

impl WindowHandle for RecordingHandle {
    fn id(&self) -> WindowId {
        self.id
    }

    fn load_url(&self, url: &str) {
        self.record(Command::LoadUrl(self.id, url.into()));
    }

    fn send_to_renderer(&self, channel: &str, payload_json: &str) {
        self.record(Command::SendToRenderer(self.id, channel.into(), payload_json.into()));
    }

    fn execute_script(&self, script: &str) {
        self.record(Command::ExecuteScript(self.id, script.into()));
    }

    fn close(&self) {
        self.record(Command::Close(self.id));
    }

    fn set_title(&self, title: &str) {
        self.record(Command::SetTitle(self.id, title.into()));
    }

    fn resize(&self, width: u32, height: u32) {
        self.record(Command::Resize(self.id, width, height));
    }

    fn set_position(&self, x: i32, y: i32) {
        self.record(Command::SetPosition(self.id, x, y));
    }

    fn show(&self) {
        self.record(Command::Show(self.id));
    }

    fn hide(&self) {
        self.record(Command::Hide(self.id));
    }

    fn minimize(&self) {
        self.record(Command::Minimize(self.id));
    }

    fn unminimize(&self) {
        self.record(Command::Unminimize(self.id));
    }

    fn maximize(&self) {
        self.record(Command::Maximize(self.id));
    }

    fn unmaximize(&self) {
        self.record(Command::Unmaximize(self.id));
    }

    fn focus(&self) {
        self.record(Command::Focus(self.id));
    }

    fn set_always_on_top(&self, always_on_top: bool) {
        self.record(Command::SetAlwaysOnTop(self.id, always_on_top));
    }

    fn request_attention(&self) {
        self.record(Command::RequestAttention(self.id));
    }

    fn set_decorations(&self, decorations: bool) {
        self.record(Command::SetDecorations(self.id, decorations));
    }
}

/// Bridge whose window creation always fails.
pub struct FailingBridge;

impl BackendBridge for FailingBridge {
    fn create_window(&mut self, _: &WindowOptions) -> Result<Box<dyn WindowHandle>, BridgeError> {
        Err(BridgeError::WindowCreation("no display".into()))
    }

    fn quit(&mut self) {}
}

pub fn failing_bridge() -> FailingBridge {
    FailingBridge
}

/// Encode a value the way the engine does.
pub fn pack(value: &Value) -> Vec<u8> {
    rmp_serde::to_vec(value).unwrap()
}

/// A listener that clones every argument into a shared log and ignores
/// its context.
pub fn recorder<A, C>() -> (Rc<RefCell<Vec<A>>>, impl FnMut(&C, &A) + 'static)
where
    A: Clone + 'static,
    C: ?Sized + 'static,
{
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    (log, move |_: &C, arg: &A| sink.borrow_mut().push(arg.clone()))
}
