//! This is a library for keeping a UI's view of a remote document collection in sync.
//! It was created for Commons, so it doesn't include much that was not needed for that project.
//!
//! Sync strategy:
//! 1. The backend pushes a complete snapshot of a collection every time anything in it changes. Snapshots are never diffs, and they can arrive out of order after network retries, so each one is treated as authoritative and idempotent — never as a delta to apply on top of the last.
//! 2. The library keeps a sorted, de-duplicated projection of the latest snapshot. Published projections are persistent vectors, so a reader holding an old one keeps a valid sequence while a new snapshot is being swapped in.
//! 3. Form submissions become "pending writes": visible in the merged view immediately, tracked under a temporary local id until the backend confirms or rejects them. A pending entry leaves the set exactly once.
//! 4. The presentation layer reads a single reducer state — Loading, Error, or Ready — and registers listeners that fire on every transition.
//!
//! Sounds simple, but there are a few tricky parts that this library handles.

pub mod source;
pub mod sync_model;

pub use sync_model::{Draft, Record, RecordId, TempId};
