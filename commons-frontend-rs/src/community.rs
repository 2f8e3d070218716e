//! Community tab: discover events, host your own.

use chrono::{DateTime, Utc};
use tether::{Draft, Record, RecordId};

use crate::validation::{FormDraft, ValidationError, required};

/// What the host-event form produces, and what an event card renders.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityEventDraft {
    pub name: String,
    pub description: String,
    pub venue: String,
    /// The card's badge, e.g. "Networking" or "Workshop".
    pub category: String,
    pub starts_at: DateTime<Utc>,
    /// Poster image, already uploaded elsewhere; we only carry the URL.
    pub poster_url: Option<String>,
}

/// Backend document form. Versioned so the data model can evolve without
/// breaking existing documents.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "version")]
enum VersionedCommunityEvent {
    V1(CommunityEventDraft),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommunityEvent {
    pub id: RecordId,
    pub details: CommunityEventDraft,
}

impl Draft for CommunityEventDraft {
    fn timestamp(&self) -> DateTime<Utc> {
        self.starts_at
    }

    fn to_fields(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(VersionedCommunityEvent::V1(self.clone()))
    }
}

impl Record for CommunityEvent {
    type Draft = CommunityEventDraft;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.details.starts_at
    }

    fn matches_draft(&self, draft: &CommunityEventDraft) -> bool {
        &self.details == draft
    }

    fn to_fields(&self) -> Result<serde_json::Value, serde_json::Error> {
        self.details.to_fields()
    }

    fn from_fields(id: RecordId, fields: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let VersionedCommunityEvent::V1(details) = serde_json::from_value(fields.clone())?;
        Ok(CommunityEvent { id, details })
    }
}

impl FormDraft for CommunityEventDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        required("description", &self.description)?;
        required("venue", &self.venue)?;
        required("category", &self.category)?;
        Ok(())
    }
}
