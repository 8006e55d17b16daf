//! Typed messages decoded from engine buffers.

use std::fmt;

use lotus_common::WindowId;
use serde::{Deserialize, Serialize};

/// Page load progress reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadStatus {
    /// Navigation has started.
    Started,
    /// The document head has been parsed.
    HeadParsed,
    /// Document and subresources have loaded.
    Complete,
    /// A status string this host does not know.
    Other(String),
}

impl LoadStatus {
    pub fn from_wire(status: &str) -> Self {
        match status {
            "started" => Self::Started,
            "head-parsed" => Self::HeadParsed,
            "complete" => Self::Complete,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Started => "started",
            Self::HeadParsed => "head-parsed",
            Self::Complete => "complete",
            Self::Other(s) => s,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event addressed to one window.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEventKind {
    /// The engine finished creating the window.
    Ready,
    LoadStatus(LoadStatus),
    /// A frame was painted. The first one marks first paint.
    FrameReady,
    /// The window is gone. Terminal.
    Closed,
    Resized { width: u32, height: u32 },
    Moved { x: i32, y: i32 },
    Focused,
    Unfocused,
}

impl WindowEventKind {
    pub fn name(&self) -> WindowEventName {
        match self {
            Self::Ready => WindowEventName::Ready,
            Self::LoadStatus(_) => WindowEventName::LoadStatus,
            Self::FrameReady => WindowEventName::FrameReady,
            Self::Closed => WindowEventName::Closed,
            Self::Resized { .. } => WindowEventName::Resized,
            Self::Moved { .. } => WindowEventName::Moved,
            Self::Focused => WindowEventName::Focused,
            Self::Unfocused => WindowEventName::Unfocused,
        }
    }
}

/// Key window listeners subscribe under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowEventName {
    Ready,
    LoadStatus,
    FrameReady,
    Closed,
    Resized,
    Moved,
    Focused,
    Unfocused,
}

impl WindowEventName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::LoadStatus => "load-status",
            Self::FrameReady => "frame-ready",
            Self::Closed => "closed",
            Self::Resized => "resized",
            Self::Moved => "moved",
            Self::Focused => "focused",
            Self::Unfocused => "unfocused",
        }
    }
}

/// App-level events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppEvent {
    /// The engine is up and its IPC endpoint is listening.
    Ready,
}

/// Details the engine attaches to `app-ready`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppReadyInfo {
    /// Port of the engine's renderer IPC endpoint.
    pub ipc_port: Option<u16>,
    /// Token renderers present to that endpoint.
    pub ipc_token: Option<String>,
}

/// One user message on a named channel.
#[derive(Debug, Clone, PartialEq)]
pub struct IpcPair {
    pub channel: String,
    pub payload: serde_json::Value,
}

impl IpcPair {
    pub fn new(channel: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            channel: channel.into(),
            payload,
        }
    }
}

/// Result of decoding a single engine buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedMessage {
    AppReady(AppReadyInfo),
    /// `window_id` is `None` when the engine omitted it or sent something
    /// that is not a window id; the router drops those.
    WindowEvent {
        window_id: Option<WindowId>,
        kind: WindowEventKind,
    },
    IpcPair(IpcPair),
    IpcBatch(Vec<IpcPair>),
}
