//! Donations tab: drives asking for money, goods, or time.

use chrono::{DateTime, Utc};
use tether::sync_model::Entry;
use tether::{Draft, Record, RecordId};

use crate::validation::{FormDraft, ValidationError, required};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DonationKind {
    Money,
    Food,
    Books,
    Furniture,
    Volunteer,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationDriveDraft {
    pub name: String,
    pub description: String,
    pub kind: DonationKind,
    pub amount_needed: u64,
    pub amount_received: u64,
    pub image_url: Option<String>,
    pub opened_at: DateTime<Utc>,
}

impl DonationDriveDraft {
    /// Fill ratio for the progress bar, clamped to 1.0.
    pub fn progress(&self) -> f64 {
        if self.amount_needed == 0 {
            return 0.0;
        }
        (self.amount_received as f64 / self.amount_needed as f64).min(1.0)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "version")]
enum VersionedDonationDrive {
    V1(DonationDriveDraft),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DonationDrive {
    pub id: RecordId,
    pub details: DonationDriveDraft,
}

impl Draft for DonationDriveDraft {
    fn timestamp(&self) -> DateTime<Utc> {
        self.opened_at
    }

    fn to_fields(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(VersionedDonationDrive::V1(self.clone()))
    }
}

impl Record for DonationDrive {
    type Draft = DonationDriveDraft;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.details.opened_at
    }

    fn matches_draft(&self, draft: &DonationDriveDraft) -> bool {
        &self.details == draft
    }

    fn to_fields(&self) -> Result<serde_json::Value, serde_json::Error> {
        self.details.to_fields()
    }

    fn from_fields(id: RecordId, fields: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let VersionedDonationDrive::V1(details) = serde_json::from_value(fields.clone())?;
        Ok(DonationDrive { id, details })
    }
}

impl FormDraft for DonationDriveDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        required("description", &self.description)?;
        if self.amount_needed == 0 {
            return Err(ValidationError::Invalid {
                field: "amountNeeded",
                hint: "must be more than zero",
            });
        }
        Ok(())
    }
}

/// The "All / Money / Food / …" chip row: a filtered read of the merged
/// view. `None` means All.
pub fn filter_by_kind(
    entries: &im::Vector<Entry<DonationDrive>>,
    kind: Option<DonationKind>,
) -> im::Vector<Entry<DonationDrive>> {
    let Some(kind) = kind else {
        return entries.clone();
    };
    entries
        .iter()
        .filter(|entry| match entry {
            Entry::Confirmed(drive) => drive.details.kind == kind,
            Entry::Pending { draft, .. } => draft.kind == kind,
        })
        .cloned()
        .collect()
}
