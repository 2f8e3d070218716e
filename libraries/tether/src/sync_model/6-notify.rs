//! # Notifications
//! Listener registry for the reducer. This is used to tell the presentation layer when to re-read the view state.
//! Mutations don't call listeners directly — they mark the registry dirty, and the owner drains the due notifications once its borrows are released. That matters because listeners typically call straight back into code that wants the same `RefCell`.
//! A mutation can name the listener that caused it; that listener is then excluded from the round of notifications (it already knows).

use std::rc::Rc;

/// Opaque handle to a registered listener.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ListenerKey(pub(crate) slotmap::DefaultKey);

#[derive(Clone, Debug)]
pub enum DirtyState {
    /// Not dirty, no pending notifications
    Clean,
    /// Dirty, notify all listeners except the specified one
    DirtyExcept(ListenerKey),
    /// Dirty, notify all listeners
    DirtyAll,
}

pub struct Listeners {
    callbacks: slotmap::SlotMap<slotmap::DefaultKey, Rc<dyn Fn()>>,
    dirty_state: DirtyState,
}

impl Default for Listeners {
    fn default() -> Self {
        Self {
            callbacks: Default::default(),
            dirty_state: DirtyState::Clean,
        }
    }
}

impl Listeners {
    /// The listener is invoked on every state transition from now on.
    pub fn register(&mut self, listener: impl Fn() + 'static) -> ListenerKey {
        ListenerKey(self.callbacks.insert(Rc::new(listener)))
    }

    pub fn unregister(&mut self, key: ListenerKey) {
        self.callbacks.remove(key.0);
    }

    pub fn mark_dirty(&mut self, modifier: Option<ListenerKey>) {
        use DirtyState::*;
        self.dirty_state = match (&self.dirty_state, modifier) {
            (Clean, Some(key)) => DirtyExcept(key),
            (DirtyExcept(key1), Some(key2)) if key1 == &key2 => DirtyExcept(*key1),
            (Clean, None) => DirtyAll,
            (DirtyExcept(_), _) | (DirtyAll, _) => DirtyAll,
        };
    }

    /// Collect the callbacks owed for the current dirty state and reset to
    /// clean. The caller invokes them after releasing its borrows.
    pub fn drain_due_notifications(&mut self) -> Vec<Box<dyn FnOnce()>> {
        let exclude_key = match &self.dirty_state {
            DirtyState::Clean => return Vec::new(),
            DirtyState::DirtyExcept(key) => Some(*key),
            DirtyState::DirtyAll => None,
        };

        // Reset to clean after draining
        self.dirty_state = DirtyState::Clean;

        let mut notifications: Vec<Box<dyn FnOnce()>> = Vec::new();
        for (key, listener) in self.callbacks.iter() {
            if exclude_key == Some(ListenerKey(key)) {
                continue;
            }
            let listener = listener.clone();
            notifications.push(Box::new(move || listener()));
        }
        notifications
    }

    pub fn is_dirty(&self) -> bool {
        !matches!(self.dirty_state, DirtyState::Clean)
    }
}
