//! # Source
//! The seam between the sync layer and the backend-as-a-service client.
//! The backend deals in opaque JSON documents keyed by field name; decoding
//! into record types happens on the sync side, so one client instance can
//! serve every collection in the app.

use crate::sync_model::RecordId;

/// Path of a collection inside the backing document store, e.g. `"events"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CollectionPath(pub String);

impl CollectionPath {
    pub fn new(path: impl Into<String>) -> Self {
        CollectionPath(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One record as the remote store holds it: a server-assigned id plus the
/// field payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    pub id: RecordId,
    pub fields: serde_json::Value,
}

/// What the live feed delivers: a complete snapshot of the collection, or a
/// failure of the feed itself.
#[derive(Clone, Debug)]
pub enum SourceEvent {
    Snapshot(Vec<Document>),
    Failed(SubscriptionError),
}

/// The live feed died — transport or permission failure. Surfaced as a
/// persistent banner; previously displayed records are retained.
#[derive(Clone, Debug, thiserror::Error)]
#[error("live feed failed: {message}")]
pub struct SubscriptionError {
    pub message: String,
}

impl SubscriptionError {
    pub fn new(message: impl Into<String>) -> Self {
        SubscriptionError {
            message: message.into(),
        }
    }
}

/// A create was rejected by the backend. Surfaced inline on the originating
/// form; the draft is preserved for resubmission.
#[derive(Clone, Debug, thiserror::Error)]
#[error("write rejected: {message}")]
pub struct WriteError {
    pub message: String,
}

impl WriteError {
    pub fn new(message: impl Into<String>) -> Self {
        WriteError {
            message: message.into(),
        }
    }
}

/// Live feed of a collection. Every emission is a full snapshot.
pub trait RecordSource {
    /// Start the feed. The returned [`Subscription`] is the only handle to
    /// it: dropping the subscription releases the feed.
    fn subscribe(
        &self,
        collection: &CollectionPath,
        observer: Box<dyn Fn(SourceEvent)>,
    ) -> Subscription;
}

/// Asynchronous writes to a collection. Completion is continuation-based:
/// `on_done` resolves with the server-assigned id, or with the rejection.
pub trait RemoteWriter {
    fn create(
        &self,
        collection: &CollectionPath,
        fields: serde_json::Value,
        on_done: Box<dyn FnOnce(Result<RecordId, WriteError>)>,
    );
}

/// A full backend client: live reads plus writes. This is the type the
/// application root constructs once and injects into the facade — there is
/// no global client singleton.
pub trait BackendClient: RecordSource + RemoteWriter {}

impl<T: RecordSource + RemoteWriter> BackendClient for T {}

/// Guard for a live feed. Releases the underlying subscription exactly once,
/// when dropped — so unmounting a screen (or any early exit path) cannot
/// leak the feed.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Subscription {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription with nothing to release. Useful for sources that are
    /// already closed, and in tests.
    pub fn noop() -> Self {
        Subscription { release: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.release.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn subscription_releases_exactly_once_on_drop() {
        let released = Rc::new(Cell::new(0));
        let counter = released.clone();
        let subscription = Subscription::new(move || counter.set(counter.get() + 1));

        assert_eq!(released.get(), 0);
        drop(subscription);
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn noop_subscription_is_fine_to_drop() {
        drop(Subscription::noop());
    }
}
