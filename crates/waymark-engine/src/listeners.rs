//! Listener lists and unsubscribe handles
//!
//! Plain composition: an owner keeps a `ListenerList` and calls each
//! listener itself. Registration hands back a `Subscription` that removes
//! the listener when dropped.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

struct Slots<T> {
    next_id: u64,
    listeners: Vec<(u64, T)>,
}

/// Shared, ordered list of listeners
pub struct ListenerList<T> {
    slots: Arc<RwLock<Slots<T>>>,
}

impl<T> ListenerList<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: Arc::new(RwLock::new(Slots {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Append a listener; it stays registered until the handle is dropped
    pub fn add(&self, listener: T) -> Subscription {
        let id = {
            let mut slots = self.slots.write();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.listeners.push((id, listener));
            id
        };

        let slots = Arc::downgrade(&self.slots);
        Subscription::new(move || {
            if let Some(slots) = slots.upgrade() {
                slots.write().listeners.retain(|(slot, _)| *slot != id);
            }
        })
    }

    /// Copy of the current listeners, so they can be called without the lock
    pub fn snapshot(&self) -> Vec<T> {
        self.slots
            .read()
            .listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.read().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().listeners.is_empty()
    }
}

impl<T> Default for ListenerList<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ListenerList<T> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

/// Handle for a registered listener
///
/// Dropping the handle unsubscribes. Use [`Subscription::detach`] to keep
/// the listener for the lifetime of its list.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new<F>(unsubscribe: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A handle with nothing to undo
    pub fn empty() -> Self {
        Self { unsubscribe: None }
    }

    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }

    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
