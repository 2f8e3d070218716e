//! # ViewState
//! The three observable states of a synced collection. `Error` keeps the last good entries so the screen shows them under the banner instead of going blank.

use crate::sync_model::{Entry, Record};

#[derive(Clone, Debug)]
pub enum ViewState<R: Record> {
    /// Initial; no snapshot received yet.
    Loading,
    /// The live feed failed. `retained` is whatever was on screen before —
    /// empty if the feed died before the first snapshot.
    Error {
        message: String,
        retained: im::Vector<Entry<R>>,
    },
    /// At least one snapshot has been received. An empty collection is
    /// `Ready` with no entries, not `Loading`.
    Ready(im::Vector<Entry<R>>),
}

impl<R: Record> ViewState<R> {
    /// The entries to render regardless of state.
    pub fn entries(&self) -> im::Vector<Entry<R>> {
        match self {
            ViewState::Loading => im::Vector::new(),
            ViewState::Error { retained, .. } => retained.clone(),
            ViewState::Ready(entries) => entries.clone(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ViewState::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}
