//! # Record
//! Records are the basic unit in Tether's data model. The remote collection owns them: the id is assigned by the backend when the record is created and is immutable afterwards.
//! Records travel as opaque JSON documents keyed by field name, so every record type must round-trip through JSON. For robustness the JSON form should be versioned — there is another type that is the "versioned" rendition, which is the one the document store actually holds. This ensures the data model can evolve without breaking existing documents (see the app crate for examples).

/// Identifier assigned by the remote store on creation. Immutable thereafter.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

/// Local-only identifier for a write the backend has not acknowledged yet.
/// Never leaves the client.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TempId(String);

impl TempId {
    pub(crate) fn fresh() -> Self {
        TempId(format!("tmp-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TempId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A confirmed domain entity owned by the remote collection.
pub trait Record: Clone + std::fmt::Debug + 'static {
    /// The record minus its server-assigned id — what a form produces.
    type Draft: Draft;

    fn id(&self) -> &RecordId;

    /// The ordering key of the projection.
    fn timestamp(&self) -> chrono::DateTime<chrono::Utc>;

    /// Fallback matching for a pending write whose assigned id the client
    /// never learned: does this confirmed record carry the draft's content?
    fn matches_draft(&self, draft: &Self::Draft) -> bool;

    fn to_fields(&self) -> Result<serde_json::Value, serde_json::Error>;
    fn from_fields(
        id: RecordId,
        fields: &serde_json::Value,
    ) -> Result<Self, serde_json::Error>;
}

/// A user's submission before the backend has assigned it an id.
pub trait Draft: Clone + PartialEq + std::fmt::Debug + 'static {
    /// Where the entry sorts in the merged view while it is still pending.
    fn timestamp(&self) -> chrono::DateTime<chrono::Utc>;

    fn to_fields(&self) -> Result<serde_json::Value, serde_json::Error>;
}
