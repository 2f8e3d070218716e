//! Services tab: neighbourhood job and help-wanted listings.

use chrono::{DateTime, Utc};
use tether::{Draft, Record, RecordId};

use crate::validation::{FormDraft, ValidationError, looks_like_phone, required};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPostDraft {
    /// Who is offering the work, e.g. "Mrs. Sharma".
    pub posted_by: String,
    pub job_title: String,
    pub description: String,
    /// Free text, e.g. "₹18,000/month".
    pub pay: String,
    pub location: String,
    pub contact: String,
    pub urgent: bool,
    pub posted_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "version")]
enum VersionedJobPost {
    V1(JobPostDraft),
}

#[derive(Clone, Debug, PartialEq)]
pub struct JobPost {
    pub id: RecordId,
    pub details: JobPostDraft,
}

impl Draft for JobPostDraft {
    fn timestamp(&self) -> DateTime<Utc> {
        self.posted_at
    }

    fn to_fields(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(VersionedJobPost::V1(self.clone()))
    }
}

impl Record for JobPost {
    type Draft = JobPostDraft;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.details.posted_at
    }

    fn matches_draft(&self, draft: &JobPostDraft) -> bool {
        &self.details == draft
    }

    fn to_fields(&self) -> Result<serde_json::Value, serde_json::Error> {
        self.details.to_fields()
    }

    fn from_fields(id: RecordId, fields: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let VersionedJobPost::V1(details) = serde_json::from_value(fields.clone())?;
        Ok(JobPost { id, details })
    }
}

impl FormDraft for JobPostDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        required("postedBy", &self.posted_by)?;
        required("jobTitle", &self.job_title)?;
        required("description", &self.description)?;
        required("location", &self.location)?;
        required("contact", &self.contact)?;
        looks_like_phone("contact", &self.contact)?;
        Ok(())
    }
}
