//! Keyed listener registry shared by windows, the app object and the IPC bus.
//!
//! Listeners for one key run in subscription order. One-shot listeners are
//! removed after their first invocation. Everything here is single-threaded:
//! emission happens on the host's dispatch path only.
//!
//! Each emission hands listeners a context `C` next to the event argument,
//! so a listener can act on whatever raised the event (a window passes
//! itself, the runtime passes its command queue).

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Callback invoked with the emitter's context and a borrowed event argument.
pub type Listener<A, C = ()> = Box<dyn FnMut(&C, &A)>;

/// Handle returned by `subscribe`/`once`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Entry<A: ?Sized, C: ?Sized> {
    id: SubscriptionId,
    once: bool,
    listener: Listener<A, C>,
}

pub struct EventEmitter<K, A: ?Sized, C: ?Sized = ()> {
    next_id: u64,
    listeners: HashMap<K, Vec<Entry<A, C>>>,
}

impl<K, A, C> EventEmitter<K, A, C>
where
    K: Eq + Hash,
    A: ?Sized,
    C: ?Sized,
{
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: HashMap::new(),
        }
    }

    /// Register a persistent listener for `key`.
    pub fn subscribe(
        &mut self,
        key: K,
        listener: impl FnMut(&C, &A) + 'static,
    ) -> SubscriptionId {
        self.insert(key, Box::new(listener), false)
    }

    /// Register a listener that fires for exactly one emission of `key`.
    pub fn once(&mut self, key: K, listener: impl FnMut(&C, &A) + 'static) -> SubscriptionId {
        self.insert(key, Box::new(listener), true)
    }

    /// Remove a listener. Returns `false` if it was already gone
    /// (including one-shot listeners that have fired).
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.listeners.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|e| e.id != id);
            removed |= entries.len() != before;
            !entries.is_empty()
        });
        removed
    }

    /// Invoke every listener registered for `key`, in subscription order.
    /// Returns how many listeners ran.
    pub fn emit<Q>(&mut self, key: &Q, context: &C, arg: &A) -> usize
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let Some(entries) = self.listeners.get_mut(key) else {
            return 0;
        };

        for entry in entries.iter_mut() {
            (entry.listener)(context, arg);
        }
        let invoked = entries.len();

        entries.retain(|e| !e.once);
        if entries.is_empty() {
            self.listeners.remove(key);
        }
        invoked
    }

    pub fn listener_count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.listeners.get(key).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    fn insert(&mut self, key: K, listener: Listener<A, C>, once: bool) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.entry(key).or_default().push(Entry { id, once, listener });
        id
    }
}

impl<K: Eq + Hash, A: ?Sized, C: ?Sized> Default for EventEmitter<K, A, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, A: ?Sized, C: ?Sized> fmt::Debug for EventEmitter<K, A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, entries) in &self.listeners {
            map.entry(key, &entries.len());
        }
        map.finish()
    }
}
