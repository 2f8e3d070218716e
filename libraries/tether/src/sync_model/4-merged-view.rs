//! # Merged view
//! What the presentation layer actually renders: the confirmed projection with still-pending drafts woven in, in one timestamp order.
//! On a timestamp tie a confirmed entry sorts before a pending one. A record never appears as both — the queue drops a pending entry the moment a snapshot covers it.

use crate::sync_model::{Draft, PendingWrite, Record, TempId};

#[derive(Clone, Debug)]
pub enum Entry<R: Record> {
    Confirmed(R),
    /// Still waiting on the backend; rendered with a "submitting" indicator.
    Pending { temp_id: TempId, draft: R::Draft },
}

impl<R: Record> Entry<R> {
    pub fn timestamp(&self) -> chrono::DateTime<chrono::Utc> {
        match self {
            Entry::Confirmed(record) => record.timestamp(),
            Entry::Pending { draft, .. } => draft.timestamp(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Entry::Pending { .. })
    }

    pub fn as_confirmed(&self) -> Option<&R> {
        match self {
            Entry::Confirmed(record) => Some(record),
            Entry::Pending { .. } => None,
        }
    }
}

/// Merge the sorted projection with the pending queue into one sequence.
pub fn merge<R: Record>(
    confirmed: &im::Vector<R>,
    pending: &[PendingWrite<R>],
) -> im::Vector<Entry<R>> {
    let mut pending: Vec<&PendingWrite<R>> = pending.iter().collect();
    pending.sort_by(|a, b| {
        a.draft
            .timestamp()
            .cmp(&b.draft.timestamp())
            .then_with(|| a.submitted_at.cmp(&b.submitted_at))
    });

    let mut merged = im::Vector::new();
    let mut pending = pending.into_iter().peekable();

    for record in confirmed.iter() {
        // strictly-before here is what puts confirmed first on a tie
        while let Some(next) = pending.peek() {
            if next.draft.timestamp() < record.timestamp() {
                let write = pending.next().expect("peek said there was one");
                merged.push_back(Entry::Pending {
                    temp_id: write.temp_id.clone(),
                    draft: write.draft.clone(),
                });
            } else {
                break;
            }
        }
        merged.push_back(Entry::Confirmed(record.clone()));
    }

    for write in pending {
        merged.push_back(Entry::Pending {
            temp_id: write.temp_id.clone(),
            draft: write.draft.clone(),
        });
    }

    merged
}
