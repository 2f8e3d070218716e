use tether::source::CollectionPath;

/// Where each screen's records live in the backing document store. The
/// application root builds one of these alongside the backend client and
/// hands both to [`Commons::new`](crate::Commons::new).
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub events_collection: CollectionPath,
    pub donations_collection: CollectionPath,
    pub jobs_collection: CollectionPath,
    pub profiles_collection: CollectionPath,
}

pub fn backend_config() -> BackendConfig {
    BackendConfig {
        events_collection: CollectionPath::new("events"),
        donations_collection: CollectionPath::new("donations"),
        jobs_collection: CollectionPath::new("jobs"),
        profiles_collection: CollectionPath::new("profiles"),
    }
}
