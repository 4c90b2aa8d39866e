use std::future::Future;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::version::EtagVersion;
use crate::error::StoreError;
use crate::id::DomainId;

/// A value with the version it was stored at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub data: T,
    pub version: i64,
}

impl<T> Versioned<Option<T>> {
    /// The result of reading a key that was never written.
    pub fn not_found() -> Self {
        Versioned {
            data: None,
            version: EtagVersion::NOT_FOUND,
        }
    }

    pub fn exists(&self) -> bool {
        self.version != EtagVersion::NOT_FOUND && self.data.is_some()
    }
}

/// Keys accepted by a snapshot store.
pub trait SnapshotKey: Send + Sync {
    fn storage_key(&self) -> String;
}

impl SnapshotKey for DomainId {
    fn storage_key(&self) -> String {
        self.as_str().to_string()
    }
}

impl SnapshotKey for String {
    fn storage_key(&self) -> String {
        self.clone()
    }
}

/// Keyed store of `(value, version)` pairs with optimistic concurrency.
///
/// One snapshot per key; every write is a full replace. The store is an
/// accelerant: it can always be rebuilt by replaying history and writing again.
#[async_trait]
pub trait SnapshotStore<T, K = DomainId>: Send + Sync
where
    T: Send + 'static,
    K: SnapshotKey,
{
    /// Current snapshot, or `(None, NOT_FOUND)` when there is none.
    async fn read(&self, key: &K) -> Result<Versioned<Option<T>>, StoreError>;

    /// Conditional upsert.
    ///
    /// Succeeds only when the stored version equals `expected_version`
    /// (`NOT_FOUND` for a new key, `ANY` to skip the check); the stored version
    /// then becomes `new_version`. Otherwise fails with
    /// `StoreError::ConcurrencyConflict` and leaves storage untouched.
    ///
    /// `new_version` must be committed and, unless `expected_version` is
    /// `ANY`, greater than `expected_version`; anything else is
    /// `StoreError::InvalidVersion`.
    async fn write(
        &self,
        key: &K,
        value: &T,
        expected_version: i64,
        new_version: i64,
    ) -> Result<(), StoreError>;

    /// Stream every snapshot in storage order.
    ///
    /// Rows are read one at a time; once `ct` is cancelled the stream ends
    /// before the next row.
    fn read_all(&self, ct: CancellationToken) -> BoxStream<'_, Result<Versioned<T>, StoreError>>;

    /// Delete the snapshot. Removing a missing key is not an error.
    async fn remove(&self, key: &K) -> Result<(), StoreError>;
}

/// Drive [`SnapshotStore::read_all`], invoking `callback` once per snapshot.
///
/// Returns the number of delivered snapshots. Stops at the first error.
pub async fn for_each_snapshot<T, K, S, F, Fut>(
    store: &S,
    ct: CancellationToken,
    mut callback: F,
) -> Result<usize, StoreError>
where
    T: Send + 'static,
    K: SnapshotKey,
    S: SnapshotStore<T, K> + ?Sized,
    F: FnMut(T, i64) -> Fut,
    Fut: Future<Output = Result<(), StoreError>>,
{
    let mut snapshots = store.read_all(ct);
    let mut delivered = 0;

    while let Some(snapshot) = snapshots.next().await {
        let snapshot = snapshot?;
        callback(snapshot.data, snapshot.version).await?;
        delivered += 1;
    }

    Ok(delivered)
}
