//! # CollectionSync
//! One of these per mounted screen. It owns the projection, the pending
//! queue, and the reducer phase, and it is the single place snapshot
//! arrivals, form submits, and write completions meet.
//!
//! Everything here runs on the UI event loop — callbacks are serialized, so
//! there is no locking, only the borrow discipline described in `6-notify.rs`.

use crate::source::{Document, SourceEvent, SubscriptionError, WriteError};
use crate::sync_model::{
    Entry, ListenerKey, Listeners, PendingQueue, Projection, Record, RecordId, TempId, ViewState,
    merge,
};

enum Phase {
    Loading,
    Ready,
    Error(String),
}

pub struct CollectionSync<R: Record> {
    projection: Projection<R>,
    pending: PendingQueue<R>,
    phase: Phase,
    /// Rejected writes, parked here so the form can take the drafts back
    /// and preserve them for resubmission. Several creates can be in flight
    /// at once, so several can be rejected before the form reclaims any.
    rejected: Vec<(R::Draft, WriteError)>,
    listeners: Listeners,
}

impl<R: Record> Default for CollectionSync<R> {
    fn default() -> Self {
        Self {
            projection: Projection::default(),
            pending: PendingQueue::default(),
            phase: Phase::Loading,
            rejected: Vec::new(),
            listeners: Listeners::default(),
        }
    }
}

impl<R: Record> CollectionSync<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_source_event(&mut self, event: SourceEvent, modifier: Option<ListenerKey>) {
        match event {
            SourceEvent::Snapshot(documents) => self.apply_snapshot(documents, modifier),
            SourceEvent::Failed(error) => self.apply_subscription_error(error, modifier),
        }
    }

    /// Apply an authoritative snapshot as delivered by the backend: opaque
    /// JSON documents. Documents that fail to decode are logged and skipped
    /// rather than poisoning the whole snapshot.
    pub fn apply_snapshot(&mut self, documents: Vec<Document>, modifier: Option<ListenerKey>) {
        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            match R::from_fields(document.id.clone(), &document.fields) {
                Ok(record) => records.push(record),
                Err(e) => {
                    log::error!("Error deserializing document {} into record type: {e:?}", document.id);
                }
            }
        }
        self.apply_records(records, modifier);
    }

    /// Typed variant of [`apply_snapshot`](Self::apply_snapshot).
    pub fn apply_records(&mut self, records: Vec<R>, modifier: Option<ListenerKey>) {
        self.projection.replace(records);

        let confirmed = self.pending.absorb_snapshot(&self.projection.current());
        for temp_id in &confirmed {
            log::debug!("Pending write {temp_id} confirmed by snapshot");
        }

        // Whatever arrived last is the truth, even if the server state it
        // captures is older than the previous snapshot's.
        self.phase = Phase::Ready;
        self.listeners.mark_dirty(modifier);
    }

    /// The live feed failed. Records shown so far stay on screen; the error
    /// is carried in the view state. No automatic retry happens here —
    /// recovery is the user's explicit refresh, which re-subscribes from
    /// scratch.
    pub fn apply_subscription_error(
        &mut self,
        error: SubscriptionError,
        modifier: Option<ListenerKey>,
    ) {
        log::error!("Live feed for collection failed: {error}");
        self.phase = Phase::Error(error.message);
        self.listeners.mark_dirty(modifier);
    }

    /// Optimistically add a draft. It shows up in the merged view
    /// immediately, marked pending, before any network confirmation.
    pub fn enqueue(&mut self, draft: R::Draft, modifier: Option<ListenerKey>) -> TempId {
        let temp_id = self.pending.enqueue(draft);
        self.listeners.mark_dirty(modifier);
        temp_id
    }

    /// The create call resolved: the backend told us the assigned id.
    /// Matching switches to that id. If the record already arrived in an
    /// earlier snapshot (under content the draft doesn't match), the entry
    /// is confirmed right here.
    pub fn note_assigned_id(
        &mut self,
        temp_id: &TempId,
        id: RecordId,
        modifier: Option<ListenerKey>,
    ) {
        if !self.pending.note_assigned_id(temp_id, id.clone()) {
            // already confirmed by content match, nothing to do
            return;
        }
        if self.projection.contains_id(&id) {
            let confirmed = self.pending.absorb_snapshot(&self.projection.current());
            for temp_id in &confirmed {
                log::debug!("Pending write {temp_id} confirmed by assigned id");
            }
            self.listeners.mark_dirty(modifier);
        }
    }

    /// The create call was rejected. Removes the pending entry (exactly
    /// once) and parks the draft for the form to take back.
    pub fn fail_write(
        &mut self,
        temp_id: &TempId,
        error: WriteError,
        modifier: Option<ListenerKey>,
    ) {
        let Some(write) = self.pending.fail(temp_id) else {
            log::error!("Write {temp_id} failed but was no longer pending: {error}");
            return;
        };
        log::error!("Write {temp_id} rejected: {error}");
        self.rejected.push((write.draft, error));
        self.listeners.mark_dirty(modifier);
    }

    /// Drain the rejected writes the form hasn't reclaimed yet, oldest
    /// first.
    pub fn take_rejected(&mut self) -> Vec<(R::Draft, WriteError)> {
        std::mem::take(&mut self.rejected)
    }

    /// User-initiated refresh: back to the initial `Loading` state. The
    /// projection is cleared (the fresh subscription will replace it);
    /// pending writes survive — they are still in flight and must never be
    /// silently dropped.
    pub fn reset(&mut self, modifier: Option<ListenerKey>) {
        self.projection.replace(Vec::new());
        self.phase = Phase::Loading;
        self.listeners.mark_dirty(modifier);
    }

    pub fn view_state(&self) -> ViewState<R> {
        match &self.phase {
            Phase::Loading => ViewState::Loading,
            Phase::Ready => ViewState::Ready(self.merged()),
            Phase::Error(message) => ViewState::Error {
                message: message.clone(),
                retained: self.merged(),
            },
        }
    }

    fn merged(&self) -> im::Vector<Entry<R>> {
        merge(&self.projection.current(), self.pending.entries())
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn register_listener(&mut self, listener: impl Fn() + 'static) -> ListenerKey {
        self.listeners.register(listener)
    }

    pub fn unregister_listener(&mut self, key: ListenerKey) {
        self.listeners.unregister(key);
    }

    pub fn drain_due_notifications(&mut self) -> Vec<Box<dyn FnOnce()>> {
        self.listeners.drain_due_notifications()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct NoteDraft {
        body: String,
        at: chrono::DateTime<Utc>,
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Note {
        id: RecordId,
        details: NoteDraft,
    }

    impl crate::sync_model::Draft for NoteDraft {
        fn timestamp(&self) -> chrono::DateTime<Utc> {
            self.at
        }

        fn to_fields(&self) -> Result<serde_json::Value, serde_json::Error> {
            serde_json::to_value(self)
        }
    }

    impl Record for Note {
        type Draft = NoteDraft;

        fn id(&self) -> &RecordId {
            &self.id
        }

        fn timestamp(&self) -> chrono::DateTime<Utc> {
            self.details.at
        }

        fn matches_draft(&self, draft: &NoteDraft) -> bool {
            &self.details == draft
        }

        fn to_fields(&self) -> Result<serde_json::Value, serde_json::Error> {
            serde_json::to_value(&self.details)
        }

        fn from_fields(
            id: RecordId,
            fields: &serde_json::Value,
        ) -> Result<Self, serde_json::Error> {
            Ok(Note {
                id,
                details: serde_json::from_value(fields.clone())?,
            })
        }
    }

    fn at(minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap()
    }

    fn note(id: &str, body: &str, minute: u32) -> Note {
        Note {
            id: RecordId::from(id),
            details: NoteDraft {
                body: body.to_string(),
                at: at(minute),
            },
        }
    }

    #[test]
    fn first_snapshot_moves_loading_to_ready() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        assert!(sync.view_state().is_loading());

        sync.apply_records(vec![note("a", "hello", 1)], None);
        assert!(sync.view_state().is_ready());
        assert_eq!(sync.view_state().entries().len(), 1);
    }

    #[test]
    fn empty_snapshot_is_ready_not_loading() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        sync.apply_records(Vec::new(), None);

        let state = sync.view_state();
        assert!(state.is_ready());
        assert!(state.entries().is_empty());
    }

    #[test]
    fn failure_before_any_snapshot_is_error_with_nothing_retained() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        sync.apply_subscription_error(SubscriptionError::new("permission denied"), None);

        let state = sync.view_state();
        assert_eq!(state.error_message(), Some("permission denied"));
        assert!(state.entries().is_empty());
    }

    #[test]
    fn failure_after_snapshot_retains_last_good_records() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        sync.apply_records(vec![note("a", "hello", 1), note("b", "world", 2)], None);
        sync.apply_subscription_error(SubscriptionError::new("socket closed"), None);

        let state = sync.view_state();
        assert!(state.error_message().is_some());
        assert_eq!(state.entries().len(), 2);
    }

    #[test]
    fn latest_arriving_snapshot_wins_even_if_server_older() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        // "newer" server state arrives first
        sync.apply_records(vec![note("a", "v2", 1), note("b", "extra", 2)], None);
        // then a retry delivers the older state; it still replaces everything
        sync.apply_records(vec![note("a", "v1", 1)], None);

        let entries = sync.view_state().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].as_confirmed().unwrap().details.body, "v1");
    }

    #[test]
    fn enqueue_is_visible_exactly_once_before_confirmation() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        sync.apply_records(vec![note("a", "hello", 1)], None);

        let draft = NoteDraft {
            body: "mine".to_string(),
            at: at(3),
        };
        sync.enqueue(draft.clone(), None);

        let entries = sync.view_state().entries();
        let pending: Vec<_> = entries.iter().filter(|e| e.is_pending()).collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn snapshot_without_the_draft_keeps_it_pending() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        sync.enqueue(
            NoteDraft {
                body: "mine".to_string(),
                at: at(3),
            },
            None,
        );

        // server write still in flight; snapshot doesn't contain it yet
        sync.apply_records(vec![note("a", "hello", 1)], None);

        assert!(sync.has_pending());
        assert_eq!(sync.view_state().entries().len(), 2);
    }

    #[test]
    fn snapshot_containing_a_match_confirms_without_duplicate_rendering() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        let draft = NoteDraft {
            body: "mine".to_string(),
            at: at(3),
        };
        sync.enqueue(draft.clone(), None);

        sync.apply_records(
            vec![note("a", "hello", 1), Note {
                id: RecordId::from("srv-1"),
                details: draft,
            }],
            None,
        );

        assert!(!sync.has_pending());
        let entries = sync.view_state().entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| !e.is_pending()));
    }

    #[test]
    fn one_snapshot_record_confirms_at_most_one_of_two_identical_drafts() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        let draft = NoteDraft {
            body: "same".to_string(),
            at: at(3),
        };
        sync.enqueue(draft.clone(), None);
        sync.enqueue(draft.clone(), None);

        sync.apply_records(
            vec![Note {
                id: RecordId::from("srv-1"),
                details: draft,
            }],
            None,
        );

        // one confirmed, the other still pending — never both claimed
        assert_eq!(sync.pending_len(), 1);
        assert_eq!(sync.view_state().entries().len(), 2);
    }

    #[test]
    fn assigned_id_takes_over_matching_from_content() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        let draft = NoteDraft {
            body: "mine".to_string(),
            at: at(3),
        };
        let temp_id = sync.enqueue(draft, None);
        sync.note_assigned_id(&temp_id, RecordId::from("srv-9"), None);

        // the server normalized the body, so content matching would miss it
        sync.apply_records(
            vec![Note {
                id: RecordId::from("srv-9"),
                details: NoteDraft {
                    body: "MINE".to_string(),
                    at: at(3),
                },
            }],
            None,
        );

        assert!(!sync.has_pending());
        assert_eq!(sync.view_state().entries().len(), 1);
    }

    #[test]
    fn assigned_id_confirms_immediately_when_record_already_landed() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        let temp_id = sync.enqueue(
            NoteDraft {
                body: "mine".to_string(),
                at: at(3),
            },
            None,
        );

        // snapshot with a server-transformed copy arrives before create resolves
        sync.apply_records(
            vec![Note {
                id: RecordId::from("srv-9"),
                details: NoteDraft {
                    body: "Mine.".to_string(),
                    at: at(3),
                },
            }],
            None,
        );
        assert!(sync.has_pending());

        sync.note_assigned_id(&temp_id, RecordId::from("srv-9"), None);
        assert!(!sync.has_pending());
    }

    #[test]
    fn failing_a_write_removes_it_once_and_parks_the_draft() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        let keep = sync.enqueue(
            NoteDraft {
                body: "keep".to_string(),
                at: at(1),
            },
            None,
        );
        let doomed = sync.enqueue(
            NoteDraft {
                body: "doomed".to_string(),
                at: at(2),
            },
            None,
        );

        sync.fail_write(&doomed, WriteError::new("quota exceeded"), None);

        // unrelated pending entry untouched
        assert_eq!(sync.pending_len(), 1);
        let rejected = sync.take_rejected();
        assert_eq!(rejected.len(), 1);
        let (draft, error) = &rejected[0];
        assert_eq!(draft.body, "doomed");
        assert!(error.to_string().contains("quota exceeded"));
        assert!(sync.take_rejected().is_empty());

        // failing it again is a no-op, not a second removal
        sync.fail_write(&doomed, WriteError::new("again"), None);
        assert_eq!(sync.pending_len(), 1);
        assert!(sync.take_rejected().is_empty());
        let _ = keep;
    }

    #[test]
    fn every_rejected_draft_is_recoverable_not_just_the_last() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        let first = sync.enqueue(
            NoteDraft {
                body: "first".to_string(),
                at: at(1),
            },
            None,
        );
        let second = sync.enqueue(
            NoteDraft {
                body: "second".to_string(),
                at: at(2),
            },
            None,
        );

        sync.fail_write(&first, WriteError::new("quota exceeded"), None);
        // a new submission while a rejection is unreclaimed must not evict it
        sync.enqueue(
            NoteDraft {
                body: "third".to_string(),
                at: at(3),
            },
            None,
        );
        sync.fail_write(&second, WriteError::new("quota exceeded"), None);

        let bodies: Vec<String> = sync
            .take_rejected()
            .into_iter()
            .map(|(draft, _)| draft.body)
            .collect();
        assert_eq!(bodies, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn merged_view_puts_confirmed_before_pending_on_timestamp_tie() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        sync.enqueue(
            NoteDraft {
                body: "pending".to_string(),
                at: at(5),
            },
            None,
        );
        sync.apply_records(vec![note("a", "confirmed", 5)], None);

        // identical timestamps: confirmed first
        let entries = sync.view_state().entries();
        assert!(!entries[0].is_pending());
        assert!(entries[1].is_pending());
    }

    #[test]
    fn reset_goes_back_to_loading_but_keeps_pending_writes() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        sync.apply_records(vec![note("a", "hello", 1)], None);
        sync.enqueue(
            NoteDraft {
                body: "mine".to_string(),
                at: at(3),
            },
            None,
        );

        sync.reset(None);
        assert!(sync.view_state().is_loading());
        assert!(sync.has_pending());
    }

    #[test]
    fn listeners_fire_on_transitions_and_respect_the_modifier() {
        let sync = Rc::new(std::cell::RefCell::new(CollectionSync::<Note>::new()));
        let fired = Rc::new(Cell::new(0));

        let counter = fired.clone();
        let key = sync
            .borrow_mut()
            .register_listener(move || counter.set(counter.get() + 1));

        let flush = |sync: &Rc<std::cell::RefCell<CollectionSync<Note>>>| {
            let notifications = sync.borrow_mut().drain_due_notifications();
            for notification in notifications {
                notification();
            }
        };

        sync.borrow_mut().apply_records(vec![note("a", "x", 1)], None);
        flush(&sync);
        assert_eq!(fired.get(), 1);

        // the modifier is excluded from its own notification round
        sync.borrow_mut().apply_records(vec![], Some(key));
        flush(&sync);
        assert_eq!(fired.get(), 1);

        // draining twice doesn't double-notify
        flush(&sync);
        assert_eq!(fired.get(), 1);

        sync.borrow_mut().unregister_listener(key);
        sync.borrow_mut().apply_records(vec![], None);
        flush(&sync);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn decode_failures_skip_the_document_not_the_snapshot() {
        let mut sync: CollectionSync<Note> = CollectionSync::new();
        let good = note("a", "fine", 1);
        sync.apply_snapshot(
            vec![
                Document {
                    id: good.id.clone(),
                    fields: good.to_fields().unwrap(),
                },
                Document {
                    id: RecordId::from("b"),
                    fields: serde_json::json!({ "nope": true }),
                },
            ],
            None,
        );

        let state = sync.view_state();
        assert!(state.is_ready());
        assert_eq!(state.entries().len(), 1);
    }
}
