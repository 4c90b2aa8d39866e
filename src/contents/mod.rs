//! Content snapshots and the id queries over them.

mod repository;

pub use repository::{ContentIdentity, ContentRepository};
