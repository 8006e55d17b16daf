use std::collections::btree_map::{self, BTreeMap, Entry};

use lotus_common::{LotusError, WindowId};
use lotus_config::WindowOptions;
use tracing::{debug, info, warn};

use crate::bridge::BackendBridge;

use super::Window;

/// Live windows keyed by their engine-assigned id.
///
/// A window is registered once the bridge hands back its id and removed
/// when the engine reports `window-closed`. Iteration is in id order.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: BTreeMap<WindowId, Window>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the bridge for a window and register it.
    pub fn create(
        &mut self,
        bridge: &mut dyn BackendBridge,
        options: WindowOptions,
    ) -> Result<&mut Window, LotusError> {
        let options = options.resolve();
        let handle = bridge.create_window(&options)?;
        let window = Window::new(options, handle);
        let id = window.id();
        info!(window_id = %id, url = ?window.current_url(), "window created");

        match self.windows.entry(id) {
            Entry::Occupied(mut slot) => {
                warn!(window_id = %id, "engine reused a live window id, replacing");
                slot.insert(window);
                Ok(slot.into_mut())
            }
            Entry::Vacant(slot) => Ok(slot.insert(window)),
        }
    }

    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(&id)
    }

    /// Forget a window. Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: WindowId) -> Option<Window> {
        let removed = self.windows.remove(&id);
        if removed.is_some() {
            debug!(window_id = %id, "window unregistered");
        }
        removed
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.windows.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn iter(&self) -> btree_map::Values<'_, WindowId, Window> {
        self.windows.values()
    }

    /// Deliver pre-serialized JSON to every window, in id order.
    pub(crate) fn broadcast(&self, channel: &str, json: &str) -> usize {
        for window in self.windows.values() {
            window.send_serialized(channel, json);
        }
        self.windows.len()
    }
}
