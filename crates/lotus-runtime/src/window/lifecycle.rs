//! Per-window lifecycle.
//!
//! ```text
//! Created --load-status--> Loading <--> Ready
//!    \__________ window-closed __________/--> Closed
//! ```
//!
//! `load-status(complete)` enters `Ready`, any other status enters
//! `Loading`. `ready`, `frame-ready` and the geometry/focus notifications
//! never move the state. `Closed` is terminal and swallows every later
//! event.

use crate::events::WindowEventKind;

/// Lifecycle state of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowState {
    Created,
    Loading,
    Ready,
    Closed,
}

/// Outcome of feeding one event to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: WindowState,
    /// Whether listeners hear about the event.
    pub emit: bool,
}

pub fn transition(state: WindowState, event: &WindowEventKind) -> Transition {
    if state == WindowState::Closed {
        return Transition {
            next: WindowState::Closed,
            emit: false,
        };
    }

    let next = match event {
        WindowEventKind::LoadStatus(status) if status.is_complete() => WindowState::Ready,
        WindowEventKind::LoadStatus(_) => WindowState::Loading,
        WindowEventKind::Closed => WindowState::Closed,
        WindowEventKind::Ready
        | WindowEventKind::FrameReady
        | WindowEventKind::Resized { .. }
        | WindowEventKind::Moved { .. }
        | WindowEventKind::Focused
        | WindowEventKind::Unfocused => state,
    };

    Transition { next, emit: true }
}
