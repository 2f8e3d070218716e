//! Profile tab: the user's public card.

use chrono::{DateTime, Utc};
use tether::{Draft, Record, RecordId};

use crate::validation::{FormDraft, ValidationError, looks_like_email, required};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCardDraft {
    pub display_name: String,
    pub email: String,
    pub bio: String,
    pub picture_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "version")]
enum VersionedProfileCard {
    V1(ProfileCardDraft),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProfileCard {
    pub id: RecordId,
    pub details: ProfileCardDraft,
}

impl Draft for ProfileCardDraft {
    fn timestamp(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn to_fields(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(VersionedProfileCard::V1(self.clone()))
    }
}

impl Record for ProfileCard {
    type Draft = ProfileCardDraft;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.details.updated_at
    }

    fn matches_draft(&self, draft: &ProfileCardDraft) -> bool {
        &self.details == draft
    }

    fn to_fields(&self) -> Result<serde_json::Value, serde_json::Error> {
        self.details.to_fields()
    }

    fn from_fields(id: RecordId, fields: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let VersionedProfileCard::V1(details) = serde_json::from_value(fields.clone())?;
        Ok(ProfileCard { id, details })
    }
}

impl FormDraft for ProfileCardDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        required("displayName", &self.display_name)?;
        required("email", &self.email)?;
        looks_like_email("email", &self.email)?;
        Ok(())
    }
}
