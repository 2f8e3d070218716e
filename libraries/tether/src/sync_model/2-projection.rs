//! # Projection
//! The locally materialized, sorted view of a remote collection. `replace` swaps the whole thing for whatever the backend pushed — snapshots are authoritative, so there is nothing to merge, only to sort and de-duplicate.
//! Published sequences are persistent `im::Vector`s: a reader that grabbed `current()` before a swap keeps a valid, unchanged sequence. There is no mutation-after-publish.

use std::collections::HashMap;

use crate::sync_model::{Record, RecordId};

pub struct Projection<R: Record> {
    current: im::Vector<R>,
}

impl<R: Record> Default for Projection<R> {
    fn default() -> Self {
        Self {
            current: im::Vector::new(),
        }
    }
}

impl<R: Record> Projection<R> {
    /// Atomically swap the visible projection for a sorted, de-duplicated
    /// copy of `records`.
    ///
    /// Sort key is (timestamp, id) — the id makes tie order deterministic.
    /// When a snapshot repeats an id, the last occurrence wins.
    pub fn replace(&mut self, records: impl IntoIterator<Item = R>) {
        let mut by_id: HashMap<RecordId, R> = HashMap::new();
        for record in records {
            by_id.insert(record.id().clone(), record);
        }

        let mut sorted: Vec<R> = by_id.into_values().collect();
        sorted.sort_by(|a, b| {
            a.timestamp()
                .cmp(&b.timestamp())
                .then_with(|| a.id().cmp(b.id()))
        });

        self.current = sorted.into_iter().collect();
    }

    /// The latest published sequence. Cheap (structural sharing); never blocks.
    pub fn current(&self) -> im::Vector<R> {
        self.current.clone()
    }

    pub fn contains_id(&self, id: &RecordId) -> bool {
        self.current.iter().any(|record| record.id() == id)
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}
