#[path = "1-record.rs"]
mod record;

#[path = "2-projection.rs"]
mod projection;

#[path = "3-pending-queue.rs"]
mod pending_queue;

#[path = "4-merged-view.rs"]
mod merged_view;

#[path = "5-view-state.rs"]
mod view_state;

#[path = "6-notify.rs"]
mod notify;

#[path = "7-collection-sync.rs"]
mod collection_sync;

pub use collection_sync::*;
pub use merged_view::*;
pub use notify::*;
pub use pending_queue::*;
pub use projection::*;
pub use record::*;
pub use view_state::*;
