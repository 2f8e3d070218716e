//! # PendingQueue
//! Drafts the user has submitted that the backend has not confirmed yet. Each gets a temporary local id so the UI can track it.
//! A pending entry leaves the queue exactly once: promoted when an authoritative snapshot is observed to contain it, or discarded when the create call is rejected. Never silently dropped.
//!
//! Matching a snapshot record back to a pending draft is done by server-assigned id when the create call has already resolved, and by content equality as a fallback while the call is still in flight. Content matching is inherently ambiguous for two identical concurrent drafts — one snapshot record is therefore allowed to claim at most one pending entry.

use std::collections::HashSet;

use crate::sync_model::{Record, RecordId, TempId};

#[derive(Clone, Debug)]
pub struct PendingWrite<R: Record> {
    pub temp_id: TempId,
    pub draft: R::Draft,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    /// Known once the create call resolves. From then on snapshot matching
    /// uses this instead of content equality.
    pub assigned_id: Option<RecordId>,
}

pub struct PendingQueue<R: Record> {
    entries: Vec<PendingWrite<R>>,
}

impl<R: Record> Default for PendingQueue<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<R: Record> PendingQueue<R> {
    /// Assign a temporary id and append. The entry is visible in the merged
    /// view from this moment on.
    pub fn enqueue(&mut self, draft: R::Draft) -> TempId {
        let temp_id = TempId::fresh();
        self.entries.push(PendingWrite {
            temp_id: temp_id.clone(),
            draft,
            submitted_at: chrono::Utc::now(),
            assigned_id: None,
        });
        temp_id
    }

    /// Record the id the backend assigned to a pending write. Returns false
    /// if the entry already left the queue (e.g. confirmed by content match
    /// before the create call resolved).
    pub fn note_assigned_id(&mut self, temp_id: &TempId, id: RecordId) -> bool {
        match self.entries.iter_mut().find(|e| &e.temp_id == temp_id) {
            Some(entry) => {
                entry.assigned_id = Some(id);
                true
            }
            None => false,
        }
    }

    /// Remove a rejected entry, handing it back so the form can keep the
    /// draft for resubmission.
    pub fn fail(&mut self, temp_id: &TempId) -> Option<PendingWrite<R>> {
        let index = self.entries.iter().position(|e| &e.temp_id == temp_id)?;
        Some(self.entries.remove(index))
    }

    /// Remove every entry that `snapshot` now covers; returns the confirmed
    /// temp ids. Entries are considered oldest first, and each snapshot
    /// record confirms at most one entry.
    pub fn absorb_snapshot(&mut self, snapshot: &im::Vector<R>) -> Vec<TempId> {
        let mut claimed: HashSet<RecordId> = HashSet::new();
        let mut confirmed = Vec::new();

        self.entries.retain(|entry| {
            let covering = snapshot.iter().find(|record| {
                if claimed.contains(record.id()) {
                    return false;
                }
                match &entry.assigned_id {
                    Some(id) => record.id() == id,
                    None => record.matches_draft(&entry.draft),
                }
            });

            match covering {
                Some(record) => {
                    claimed.insert(record.id().clone());
                    confirmed.push(entry.temp_id.clone());
                    false
                }
                None => true,
            }
        });

        confirmed
    }

    pub fn entries(&self) -> &[PendingWrite<R>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
