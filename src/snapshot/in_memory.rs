use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::store::{SnapshotKey, SnapshotStore, Versioned};
use super::version::EtagVersion;
use crate::config::SnapshotOptions;
use crate::error::StoreError;
use crate::id::DomainId;
use crate::query::{FindOptions, StorageFilter, APP_FIELD, DELETED_FIELD, SCHEMA_FIELD};
use crate::state::AggregateState;

const KEY_FIELD: &str = "_id";
const VERSION_FIELD: &str = "vs";

/// Internal stored representation of a snapshot.
#[derive(Clone)]
struct StoredSnapshot {
    version: i64,
    document: Map<String, Value>,
}

/// Rows plus secondary indexes on `_ai` and `_si`.
#[derive(Default)]
struct Collection {
    rows: BTreeMap<String, StoredSnapshot>,
    by_app: HashMap<String, BTreeSet<String>>,
    by_schema: HashMap<String, BTreeSet<String>>,
}

impl Collection {
    fn insert(&mut self, key: String, row: StoredSnapshot) {
        self.unindex(&key);
        if let Some(app) = row.document.get(APP_FIELD).and_then(Value::as_str) {
            self.by_app.entry(app.to_string()).or_default().insert(key.clone());
        }
        if let Some(schema) = row.document.get(SCHEMA_FIELD).and_then(Value::as_str) {
            self.by_schema
                .entry(schema.to_string())
                .or_default()
                .insert(key.clone());
        }
        self.rows.insert(key, row);
    }

    fn remove(&mut self, key: &str) -> bool {
        self.unindex(key);
        self.rows.remove(key).is_some()
    }

    fn unindex(&mut self, key: &str) {
        let Some(old) = self.rows.get(key) else {
            return;
        };
        for (field, index) in [(APP_FIELD, &mut self.by_app), (SCHEMA_FIELD, &mut self.by_schema)] {
            if let Some(value) = old.document.get(field).and_then(Value::as_str) {
                if let Some(keys) = index.get_mut(value) {
                    keys.remove(key);
                    if keys.is_empty() {
                        index.remove(value);
                    }
                }
            }
        }
    }

    /// Rows that can match `filter`, narrowed by an index when the filter
    /// pins `_si` or `_ai` at the top level.
    fn candidates(&self, filter: &StorageFilter) -> Vec<&StoredSnapshot> {
        for (field, index) in [(SCHEMA_FIELD, &self.by_schema), (APP_FIELD, &self.by_app)] {
            if let Some(Value::String(value)) = filter.equality_on(field) {
                return index
                    .get(value)
                    .map(|keys| keys.iter().filter_map(|k| self.rows.get(k)).collect())
                    .unwrap_or_default();
            }
        }
        self.rows.values().collect()
    }
}

/// In-memory snapshot store backed by `Arc<RwLock<BTreeMap>>`.
///
/// Each row is a document: the serialized state plus `_id` (the key), `_ai`,
/// `_si`, `vs` and, for soft-deleted aggregates, `dl`. Clone-friendly (clones
/// share the same underlying storage). Locks are only held for the duration
/// of a single row operation.
pub struct InMemorySnapshotStore<T> {
    collection: Arc<RwLock<Collection>>,
    options: SnapshotOptions,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for InMemorySnapshotStore<T> {
    fn clone(&self) -> Self {
        Self {
            collection: Arc::clone(&self.collection),
            options: self.options.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: AggregateState> Default for InMemorySnapshotStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: AggregateState> InMemorySnapshotStore<T> {
    pub fn new() -> Self {
        Self::with_options(SnapshotOptions::default())
    }

    pub fn with_options(options: SnapshotOptions) -> Self {
        Self {
            collection: Arc::new(RwLock::new(Collection::default())),
            options,
            _marker: PhantomData,
        }
    }

    /// Documents matching `filter`, ordered, limited and projected per `options`.
    pub async fn find(
        &self,
        filter: &StorageFilter,
        options: &FindOptions,
    ) -> Result<Vec<Map<String, Value>>, StoreError> {
        let docs = self.matching(filter)?;
        Ok(options.apply(docs))
    }

    /// States matching `filter`. Projection is ignored.
    pub async fn find_states(
        &self,
        filter: &StorageFilter,
        options: &FindOptions,
    ) -> Result<Vec<Versioned<T>>, StoreError> {
        let options = FindOptions {
            projection: None,
            ..options.clone()
        };
        options
            .apply(self.matching(filter)?)
            .into_iter()
            .map(|doc| {
                let version = doc
                    .get(VERSION_FIELD)
                    .and_then(Value::as_i64)
                    .unwrap_or(EtagVersion::NOT_FOUND);
                Ok(Versioned {
                    data: from_document(doc)?,
                    version,
                })
            })
            .collect()
    }

    pub async fn count(&self, filter: &StorageFilter) -> Result<usize, StoreError> {
        Ok(self.matching(filter)?.len())
    }

    fn matching(&self, filter: &StorageFilter) -> Result<Vec<Map<String, Value>>, StoreError> {
        let collection = self
            .collection
            .read()
            .map_err(|_| StoreError::LockPoisoned("snapshot query"))?;
        Ok(collection
            .candidates(filter)
            .into_iter()
            .filter(|row| filter.matches(&row.document))
            .map(|row| row.document.clone())
            .collect())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let collection = self
            .collection
            .read()
            .map_err(|_| StoreError::LockPoisoned("snapshot scan"))?;
        Ok(collection.rows.keys().cloned().collect())
    }

    fn row(&self, key: &str) -> Result<Option<StoredSnapshot>, StoreError> {
        let collection = self
            .collection
            .read()
            .map_err(|_| StoreError::LockPoisoned("snapshot read"))?;
        Ok(collection.rows.get(key).cloned())
    }
}

#[async_trait]
impl<T: AggregateState> SnapshotStore<T> for InMemorySnapshotStore<T> {
    async fn read(&self, key: &DomainId) -> Result<Versioned<Option<T>>, StoreError> {
        match self.row(&key.storage_key())? {
            Some(row) => Ok(Versioned {
                data: Some(from_document(row.document)?),
                version: row.version,
            }),
            None => Ok(Versioned::not_found()),
        }
    }

    async fn write(
        &self,
        key: &DomainId,
        value: &T,
        expected_version: i64,
        new_version: i64,
    ) -> Result<(), StoreError> {
        let key = key.storage_key();
        // Versions only move forward, except for unconditional rebuild writes.
        let regresses = expected_version != EtagVersion::ANY && new_version <= expected_version;
        if !EtagVersion::is_committed(new_version) || regresses {
            return Err(StoreError::InvalidVersion {
                key,
                version: new_version,
            });
        }

        let document = to_document(&key, value, new_version)?;

        let mut collection = self
            .collection
            .write()
            .map_err(|_| StoreError::LockPoisoned("snapshot write"))?;

        let actual = collection
            .rows
            .get(&key)
            .map(|row| row.version)
            .unwrap_or(EtagVersion::NOT_FOUND);

        if expected_version != EtagVersion::ANY && actual != expected_version {
            warn!(
                kind = T::KIND,
                key = %key,
                expected = expected_version,
                actual,
                "snapshot write conflict"
            );
            return Err(StoreError::ConcurrencyConflict {
                key,
                expected: expected_version,
                actual,
            });
        }

        debug!(kind = T::KIND, key = %key, version = new_version, "snapshot written");
        collection.insert(
            key,
            StoredSnapshot {
                version: new_version,
                document,
            },
        );
        Ok(())
    }

    fn read_all(&self, ct: CancellationToken) -> BoxStream<'_, Result<Versioned<T>, StoreError>> {
        let keys = match self.keys() {
            Ok(keys) => keys,
            Err(err) => return stream::once(async move { Err(err) }).boxed(),
        };
        let yield_every = self.options.scan_yield_every.max(1);

        stream::unfold((keys.into_iter(), 0usize), move |(mut keys, mut delivered)| {
            let ct = ct.clone();
            async move {
                loop {
                    if ct.is_cancelled() {
                        info!(kind = T::KIND, delivered, "snapshot scan cancelled");
                        return None;
                    }

                    let key = keys.next()?;

                    // Removed since the scan started.
                    let row = match self.row(&key) {
                        Ok(Some(row)) => row,
                        Ok(None) => continue,
                        Err(err) => return Some((Err(err), (keys, delivered))),
                    };

                    delivered += 1;
                    if delivered % yield_every == 0 {
                        tokio::task::yield_now().await;
                    }

                    let item = from_document(row.document).map(|data| Versioned {
                        data,
                        version: row.version,
                    });
                    return Some((item, (keys, delivered)));
                }
            }
        })
        .boxed()
    }

    async fn remove(&self, key: &DomainId) -> Result<(), StoreError> {
        let key = key.storage_key();
        let mut collection = self
            .collection
            .write()
            .map_err(|_| StoreError::LockPoisoned("snapshot remove"))?;
        if collection.remove(&key) {
            debug!(kind = T::KIND, key = %key, "snapshot removed");
        }
        Ok(())
    }
}

fn to_document<T: AggregateState>(
    key: &str,
    value: &T,
    version: i64,
) -> Result<Map<String, Value>, StoreError> {
    let Value::Object(mut document) = serde_json::to_value(value)? else {
        return Err(StoreError::Serde(format!(
            "{} snapshot does not serialize to an object",
            T::KIND
        )));
    };

    document.insert(KEY_FIELD.into(), Value::String(key.to_string()));
    document.insert(APP_FIELD.into(), Value::String(value.app_id().to_string()));
    if let Some(schema_id) = value.schema_id() {
        document.insert(SCHEMA_FIELD.into(), Value::String(schema_id.to_string()));
    }
    document.insert(VERSION_FIELD.into(), Value::from(version));
    if value.is_deleted() {
        document.insert(DELETED_FIELD.into(), Value::Bool(true));
    }
    Ok(document)
}

fn from_document<T: AggregateState>(document: Map<String, Value>) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}
