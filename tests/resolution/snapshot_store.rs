use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use sourced_state::config::SnapshotOptions;
use sourced_state::snapshot::for_each_snapshot;
use sourced_state::state::AppState;
use sourced_state::{DomainId, EtagVersion, InMemorySnapshotStore, SnapshotStore, StoreError};
use tokio_util::sync::CancellationToken;

fn app(id: &str, name: &str) -> AppState {
    AppState::new(DomainId::new(id), name)
}

#[tokio::test]
async fn never_written_key_reads_not_found() {
    let store = InMemorySnapshotStore::<AppState>::new();

    for key in ["a", "b", "a--b"] {
        let loaded = store.read(&DomainId::new(key)).await.unwrap();
        assert_eq!(loaded.version, EtagVersion::NOT_FOUND);
        assert!(loaded.data.is_none());
    }
}

#[tokio::test]
async fn first_write_then_read() {
    let store = InMemorySnapshotStore::new();
    let v1 = app("a1", "blog");

    store.write(&v1.id, &v1, EtagVersion::NOT_FOUND, 0).await.unwrap();

    let loaded = store.read(&v1.id).await.unwrap();
    assert_eq!(loaded.version, 0);
    assert_eq!(loaded.data, Some(v1));
}

#[tokio::test]
async fn stale_write_conflicts_and_leaves_storage_alone() {
    let store = InMemorySnapshotStore::new();
    let key = DomainId::new("a1");
    let v1 = app("a1", "blog");
    let v2 = app("a1", "blog-renamed");
    let v3 = app("a1", "blog-stale");

    store.write(&key, &v1, EtagVersion::NOT_FOUND, 0).await.unwrap();
    store.write(&key, &v2, 0, 1).await.unwrap();

    let err = store.write(&key, &v3, 0, 1).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::ConcurrencyConflict {
            key: "a1".into(),
            expected: 0,
            actual: 1,
        }
    );

    let loaded = store.read(&key).await.unwrap();
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.data.map(|a| a.name), Some("blog-renamed".to_string()));
}

#[tokio::test]
async fn creating_an_existing_key_conflicts() {
    let store = InMemorySnapshotStore::new();
    let v1 = app("a1", "blog");
    store.write(&v1.id, &v1, EtagVersion::NOT_FOUND, 0).await.unwrap();

    let err = store
        .write(&v1.id, &v1, EtagVersion::NOT_FOUND, 0)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn repeating_a_version_is_rejected() {
    let store = InMemorySnapshotStore::new();
    let key = DomainId::new("a1");
    store.write(&key, &app("a1", "blog"), EtagVersion::NOT_FOUND, 0).await.unwrap();
    store.write(&key, &app("a1", "v1"), 0, 1).await.unwrap();

    let first = store.write(&key, &app("a1", "writer-a"), 1, 1).await.unwrap_err();
    let second = store.write(&key, &app("a1", "writer-b"), 1, 1).await.unwrap_err();

    for err in [first, second] {
        assert_eq!(
            err,
            StoreError::InvalidVersion {
                key: "a1".into(),
                version: 1,
            }
        );
    }

    let loaded = store.read(&key).await.unwrap();
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.data.map(|a| a.name), Some("v1".to_string()));
}

#[tokio::test]
async fn version_never_moves_backwards() {
    let store = InMemorySnapshotStore::new();
    let key = DomainId::new("a1");
    store.write(&key, &app("a1", "blog"), EtagVersion::NOT_FOUND, 0).await.unwrap();
    store.write(&key, &app("a1", "v1"), 0, 1).await.unwrap();

    let err = store.write(&key, &app("a1", "rollback"), 1, 0).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidVersion { version: 0, .. }));
    assert!(!err.is_conflict());

    let loaded = store.read(&key).await.unwrap();
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.data.map(|a| a.name), Some("v1".to_string()));

    // Skipping ahead is a valid transition.
    store.write(&key, &app("a1", "v5"), 1, 5).await.unwrap();
    assert_eq!(store.read(&key).await.unwrap().version, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_exactly_one_wins() {
    let store = InMemorySnapshotStore::new();
    let key = DomainId::new("a1");
    store
        .write(&key, &app("a1", "blog"), EtagVersion::NOT_FOUND, 0)
        .await
        .unwrap();

    let writers = (0..16).map(|i| {
        let store = store.clone();
        let key = key.clone();
        tokio::spawn(async move {
            store
                .write(&key, &app("a1", &format!("writer-{i}")), 0, 1)
                .await
        })
    });

    let results = futures::future::join_all(writers).await;
    let (won, lost): (Vec<_>, Vec<_>) = results
        .into_iter()
        .map(|joined| joined.unwrap())
        .partition(|result| result.is_ok());

    assert_eq!(won.len(), 1);
    assert_eq!(lost.len(), 15);
    assert!(lost.iter().all(|r| r.as_ref().unwrap_err().is_conflict()));
    assert_eq!(store.read(&key).await.unwrap().version, 1);
}

#[tokio::test]
async fn read_all_visits_every_snapshot_once() {
    let store = InMemorySnapshotStore::with_options(SnapshotOptions {
        scan_yield_every: 2,
    });
    for i in 0..5 {
        let a = app(&format!("a{i}"), "app");
        store.write(&a.id, &a, EtagVersion::NOT_FOUND, i).await.unwrap();
    }

    let mut seen = Vec::new();
    let delivered = for_each_snapshot(&store, CancellationToken::new(), |state: AppState, version| {
        seen.push((state.id.to_string(), version));
        async { Ok(()) }
    })
    .await
    .unwrap();

    assert_eq!(delivered, 5);
    seen.sort();
    let expected: Vec<_> = (0..5).map(|i| (format!("a{i}"), i)).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn cancelling_stops_the_scan_without_error() {
    let store = InMemorySnapshotStore::new();
    for i in 0..10 {
        let a = app(&format!("a{i}"), "app");
        store.write(&a.id, &a, EtagVersion::NOT_FOUND, 0).await.unwrap();
    }

    let ct = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let delivered = for_each_snapshot(&store, ct.clone(), |_: AppState, _| {
        if calls.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
            ct.cancel();
        }
        async { Ok(()) }
    })
    .await
    .unwrap();

    assert_eq!(delivered, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(store.count(&sourced_state::query::not_deleted()).await.unwrap(), 10);
}

#[tokio::test]
async fn callback_error_stops_the_scan() {
    let store = InMemorySnapshotStore::new();
    for i in 0..3 {
        let a = app(&format!("a{i}"), "app");
        store.write(&a.id, &a, EtagVersion::NOT_FOUND, 0).await.unwrap();
    }

    let result = for_each_snapshot(&store, CancellationToken::new(), |_: AppState, _| async {
        Err(StoreError::Storage("target unavailable".into()))
    })
    .await;

    assert_eq!(result, Err(StoreError::Storage("target unavailable".into())));
}

#[tokio::test]
async fn rebuild_into_a_fresh_store() {
    let source = InMemorySnapshotStore::new();
    for i in 0..4 {
        let a = app(&format!("a{i}"), "app");
        source.write(&a.id, &a, EtagVersion::NOT_FOUND, 7).await.unwrap();
    }

    let target = InMemorySnapshotStore::<AppState>::new();
    let mut scan = source.read_all(CancellationToken::new());
    while let Some(snapshot) = scan.next().await {
        let snapshot = snapshot.unwrap();
        target
            .write(&snapshot.data.id, &snapshot.data, EtagVersion::ANY, snapshot.version)
            .await
            .unwrap();
    }

    for i in 0..4 {
        let loaded = target.read(&DomainId::new(format!("a{i}"))).await.unwrap();
        assert_eq!(loaded.version, 7);
    }
}

#[tokio::test]
async fn remove_is_idempotent() {
    let store = InMemorySnapshotStore::new();
    let a = app("a1", "blog");

    store.remove(&a.id).await.unwrap();

    store.write(&a.id, &a, EtagVersion::NOT_FOUND, 0).await.unwrap();
    store.remove(&a.id).await.unwrap();
    store.remove(&a.id).await.unwrap();

    assert_eq!(store.read(&a.id).await.unwrap().version, EtagVersion::NOT_FOUND);

    // The key starts over after a hard delete.
    store.write(&a.id, &a, EtagVersion::NOT_FOUND, 0).await.unwrap();
}

#[tokio::test]
async fn shared_through_a_trait_object() {
    let store: Arc<dyn SnapshotStore<AppState>> = Arc::new(InMemorySnapshotStore::new());
    let a = app("a1", "blog");

    store.write(&a.id, &a, EtagVersion::NOT_FOUND, 0).await.unwrap();
    let delivered =
        for_each_snapshot(store.as_ref(), CancellationToken::new(), |_: AppState, _| async {
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(delivered, 1);
}
