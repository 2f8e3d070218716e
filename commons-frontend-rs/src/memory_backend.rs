//! An in-memory document backend, for tests and local development.
//!
//! Nothing moves on its own: tests push snapshots, kill feeds, and resolve
//! writes by hand, so any interleaving the sync layer has to survive can be
//! produced deterministically. In particular, subscribing does NOT deliver
//! an initial snapshot — call [`MemoryBackend::emit_current`] when the test
//! wants one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tether::RecordId;
use tether::source::{
    CollectionPath, Document, RecordSource, RemoteWriter, SourceEvent, SubscriptionError,
    Subscription, WriteError,
};

type Observer = Rc<dyn Fn(SourceEvent)>;

struct QueuedCreate {
    collection: String,
    fields: serde_json::Value,
    on_done: Box<dyn FnOnce(Result<RecordId, WriteError>)>,
}

#[derive(Default)]
struct Inner {
    documents: HashMap<String, Vec<Document>>,
    observers: HashMap<String, slotmap::SlotMap<slotmap::DefaultKey, Observer>>,
    queued_creates: Vec<QueuedCreate>,
    next_id: u64,
}

#[derive(Default)]
pub struct MemoryBackend {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a collection's contents and notify its observers.
    pub fn push_snapshot(&self, collection: &CollectionPath, documents: Vec<Document>) {
        self.inner
            .borrow_mut()
            .documents
            .insert(collection.as_str().to_string(), documents.clone());
        self.broadcast(collection, SourceEvent::Snapshot(documents));
    }

    /// Deliver the collection's current contents, the way a real feed fires
    /// right after subscribing.
    pub fn emit_current(&self, collection: &CollectionPath) {
        let documents = self
            .inner
            .borrow()
            .documents
            .get(collection.as_str())
            .cloned()
            .unwrap_or_default();
        self.broadcast(collection, SourceEvent::Snapshot(documents));
    }

    /// Kill the live feed for a collection.
    pub fn fail_subscription(&self, collection: &CollectionPath, message: &str) {
        self.broadcast(
            collection,
            SourceEvent::Failed(SubscriptionError::new(message)),
        );
    }

    /// Resolve the oldest unresolved create: assign an id, add the
    /// document, broadcast the grown snapshot, then complete the caller's
    /// continuation with the id.
    pub fn resolve_next_create(&self) -> Option<RecordId> {
        let (create, id) = self.take_next_create()?;
        let collection = CollectionPath::new(create.collection.clone());
        self.emit_current(&collection);
        (create.on_done)(Ok(id.clone()));
        Some(id)
    }

    /// Like [`resolve_next_create`](Self::resolve_next_create), but without
    /// the snapshot broadcast — the caller learns the id while the feed
    /// lags, which is the interesting case for id-based matching.
    pub fn resolve_next_create_quietly(&self) -> Option<RecordId> {
        let (create, id) = self.take_next_create()?;
        (create.on_done)(Ok(id.clone()));
        Some(id)
    }

    /// Reject the oldest unresolved create.
    pub fn fail_next_create(&self, message: &str) -> bool {
        let create = {
            let mut inner = self.inner.borrow_mut();
            if inner.queued_creates.is_empty() {
                return false;
            }
            inner.queued_creates.remove(0)
        };
        (create.on_done)(Err(WriteError::new(message)));
        true
    }

    pub fn queued_create_count(&self) -> usize {
        self.inner.borrow().queued_creates.len()
    }

    /// Live observers on a collection — for asserting that unmount really
    /// released the feed.
    pub fn observer_count(&self, collection: &CollectionPath) -> usize {
        self.inner
            .borrow()
            .observers
            .get(collection.as_str())
            .map(|observers| observers.len())
            .unwrap_or(0)
    }

    fn take_next_create(&self) -> Option<(QueuedCreate, RecordId)> {
        let mut inner = self.inner.borrow_mut();
        if inner.queued_creates.is_empty() {
            return None;
        }
        let create = inner.queued_creates.remove(0);
        inner.next_id += 1;
        let id = RecordId(format!("r-{}", inner.next_id));
        inner
            .documents
            .entry(create.collection.clone())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields: create.fields.clone(),
            });
        Some((create, id))
    }

    fn broadcast(&self, collection: &CollectionPath, event: SourceEvent) {
        // clone the observers out first; they routinely call back into code
        // that borrows this backend
        let observers: Vec<Observer> = self
            .inner
            .borrow()
            .observers
            .get(collection.as_str())
            .map(|observers| observers.values().cloned().collect())
            .unwrap_or_default();

        for observer in observers {
            observer(event.clone());
        }
    }
}

impl RecordSource for MemoryBackend {
    fn subscribe(
        &self,
        collection: &CollectionPath,
        observer: Box<dyn Fn(SourceEvent)>,
    ) -> Subscription {
        let observer: Observer = Rc::from(observer);
        let key = self
            .inner
            .borrow_mut()
            .observers
            .entry(collection.as_str().to_string())
            .or_default()
            .insert(observer);

        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        let collection = collection.as_str().to_string();
        Subscription::new(move || {
            let Some(inner) = weak.upgrade() else { return };
            if let Some(observers) = inner.borrow_mut().observers.get_mut(&collection) {
                observers.remove(key);
            }
        })
    }
}

impl RemoteWriter for MemoryBackend {
    fn create(
        &self,
        collection: &CollectionPath,
        fields: serde_json::Value,
        on_done: Box<dyn FnOnce(Result<RecordId, WriteError>)>,
    ) {
        self.inner.borrow_mut().queued_creates.push(QueuedCreate {
            collection: collection.as_str().to_string(),
            fields,
            on_done,
        });
    }
}
