//! Commons: a neighbourhood app — community events, donation drives, job
//! listings, profiles — running as a thin client over a hosted document
//! store. Each tab is a [`Screen`]: a live feed of one backend collection
//! with optimistic submits layered on top. The sync machinery itself lives
//! in the `tether` library; this crate supplies the record types, the
//! validation, and the facade the UI talks to.
//!
//! Note: we never hold a `RefCell` borrow while invoking listeners. By
//! avoiding this, we guarantee the absence of "already borrowed" panics
//! when a listener calls straight back into us.

mod community;
mod config;
mod donations;
pub mod memory_backend;
mod profile;
mod services;
mod validation;

pub use community::{CommunityEvent, CommunityEventDraft};
pub use config::{BackendConfig, backend_config};
pub use donations::{DonationDrive, DonationDriveDraft, DonationKind, filter_by_kind};
pub use profile::{ProfileCard, ProfileCardDraft};
pub use services::{JobPost, JobPostDraft};
pub use validation::{FormDraft, ValidationError};

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::LazyLock;

use tether::source::{BackendClient, CollectionPath, SourceEvent, Subscription, WriteError};
use tether::sync_model::{CollectionSync, ListenerKey, ViewState};
use tether::{Record, TempId};

// putting this inside LOGGER prevents us from accidentally initializing the logger more than once
static LOGGER: LazyLock<()> = LazyLock::new(|| {
    let _ = env_logger::Builder::from_default_env().try_init();
    log::info!("Logging initialized");
});

/// Why a submission never left the device.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("draft could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// The application facade. The application root constructs the backend
/// client once and injects it here — the client's lifecycle belongs to the
/// root, not to this crate, and there is no module-level singleton.
pub struct Commons {
    events: Screen<CommunityEvent>,
    donations: Screen<DonationDrive>,
    jobs: Screen<JobPost>,
    profiles: Screen<ProfileCard>,
}

impl Commons {
    pub fn new(backend: Rc<dyn BackendClient>, config: BackendConfig) -> Self {
        LazyLock::force(&LOGGER);

        Self {
            events: Screen::new(backend.clone(), config.events_collection),
            donations: Screen::new(backend.clone(), config.donations_collection),
            jobs: Screen::new(backend.clone(), config.jobs_collection),
            profiles: Screen::new(backend, config.profiles_collection),
        }
    }

    pub fn events(&self) -> &Screen<CommunityEvent> {
        &self.events
    }

    pub fn donations(&self) -> &Screen<DonationDrive> {
        &self.donations
    }

    pub fn jobs(&self) -> &Screen<JobPost> {
        &self.jobs
    }

    pub fn profiles(&self) -> &Screen<ProfileCard> {
        &self.profiles
    }
}

/// One tab's worth of synced state: a reducer over the collection's live
/// feed, plus the feed subscription itself while the screen is mounted.
pub struct Screen<R: Record> {
    sync: Rc<RefCell<CollectionSync<R>>>,
    subscription: RefCell<Option<Subscription>>,
    backend: Rc<dyn BackendClient>,
    collection: CollectionPath,
}

impl<R: Record> Screen<R> {
    fn new(backend: Rc<dyn BackendClient>, collection: CollectionPath) -> Self {
        Self {
            sync: Rc::new(RefCell::new(CollectionSync::new())),
            subscription: RefCell::new(None),
            backend,
            collection,
        }
    }

    /// Acquire the live feed. Snapshots and feed failures flow into the
    /// reducer until [`unmount`](Self::unmount) — or dropping the screen —
    /// releases it.
    pub fn mount(&self) {
        let weak = Rc::downgrade(&self.sync);
        let subscription = self.backend.subscribe(
            &self.collection,
            Box::new(move |event| Self::on_source_event(&weak, event)),
        );
        *self.subscription.borrow_mut() = Some(subscription);
        log::info!("Mounted screen for collection {}", self.collection);
    }

    /// Release the feed. No state update is applied after this, even if a
    /// stale callback is already in flight.
    pub fn unmount(&self) {
        self.subscription.borrow_mut().take();
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.borrow().is_some()
    }

    /// User-initiated retry: tear the feed down and re-subscribe from
    /// scratch. This is the only retry there is — feed failures are never
    /// retried automatically.
    pub fn refresh(&self, modifier: Option<ListenerKey>) {
        let _flusher = FlushLater::new(self);
        self.unmount();
        self.sync.borrow_mut().reset(modifier);
        self.mount();
    }

    /// Validate, optimistically enqueue, then hand the draft to the
    /// backend. Returns the temporary id the UI can use to track the
    /// "submitting" entry.
    pub fn submit(&self, draft: R::Draft, modifier: Option<ListenerKey>) -> Result<TempId, SubmitError>
    where
        R::Draft: FormDraft,
    {
        draft.validate()?;
        let fields = tether::Draft::to_fields(&draft)?;

        let _flusher = FlushLater::new(self);
        let temp_id = self.sync.borrow_mut().enqueue(draft, modifier);

        let weak = Rc::downgrade(&self.sync);
        let pending_id = temp_id.clone();
        self.backend.create(
            &self.collection,
            fields,
            Box::new(move |result| {
                let Some(sync) = weak.upgrade() else { return };
                let notifications = {
                    let mut sync = sync.borrow_mut();
                    match result {
                        Ok(id) => sync.note_assigned_id(&pending_id, id, None),
                        Err(error) => sync.fail_write(&pending_id, error, None),
                    }
                    sync.drain_due_notifications()
                };
                for notification in notifications {
                    notification();
                }
            }),
        );

        Ok(temp_id)
    }

    pub fn view_state(&self) -> ViewState<R> {
        self.sync.borrow().view_state()
    }

    /// Drain the failed writes' drafts and rejections, oldest first, so the
    /// form can restore the user's text instead of discarding it.
    pub fn take_rejected(&self) -> Vec<(R::Draft, WriteError)> {
        self.sync.borrow_mut().take_rejected()
    }

    pub fn register_listener(&self, listener: impl Fn() + 'static) -> ListenerKey {
        self.sync.borrow_mut().register_listener(listener)
    }

    pub fn unregister_listener(&self, key: ListenerKey) {
        self.sync.borrow_mut().unregister_listener(key);
    }

    fn on_source_event(weak: &Weak<RefCell<CollectionSync<R>>>, event: SourceEvent) {
        // a callback that raced teardown: interest is gone, apply nothing
        let Some(sync) = weak.upgrade() else { return };
        let notifications = {
            let mut sync = sync.borrow_mut();
            sync.apply_source_event(event, None);
            sync.drain_due_notifications()
        };
        for notification in notifications {
            notification();
        }
    }

    fn flush_notifications(&self) {
        // do it like this to avoid holding the borrow while we call the callbacks
        let notifications = self.sync.borrow_mut().drain_due_notifications();
        for notification in notifications {
            notification();
        }
    }
}

/// A simple struct that flushes listeners when dropped. This is useful to
/// ensure we don't forget to flush, regardless of the code path a function
/// takes.
struct FlushLater<'a, R: Record> {
    screen: &'a Screen<R>,
}

impl<'a, R: Record> FlushLater<'a, R> {
    fn new(screen: &'a Screen<R>) -> Self {
        Self { screen }
    }
}

impl<'a, R: Record> Drop for FlushLater<'a, R> {
    fn drop(&mut self) {
        self.screen.flush_notifications();
    }
}
