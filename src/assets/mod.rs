//! Asset snapshots.

mod repository;

pub use repository::AssetRepository;
