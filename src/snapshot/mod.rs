//! Snapshot store: versioned aggregate state with optimistic concurrency.
//!
//! ## Example
//!
//! ```ignore
//! use sourced_state::snapshot::{EtagVersion, InMemorySnapshotStore, SnapshotStore};
//!
//! let store = InMemorySnapshotStore::<AppState>::new();
//! store.write(&app.id, &app, EtagVersion::NOT_FOUND, 0).await?;
//! let current = store.read(&app.id).await?;
//! assert_eq!(current.version, 0);
//! ```

mod in_memory;
mod store;
mod version;

pub use in_memory::InMemorySnapshotStore;
pub use store::{for_each_snapshot, SnapshotKey, SnapshotStore, Versioned};
pub use version::EtagVersion;
