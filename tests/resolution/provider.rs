use std::sync::Arc;

use sourced_state::config::ProviderOptions;
use sourced_state::provider::AppProvider;
use sourced_state::{DomainId, StoreError};

use crate::support::{FailingLoader, TrackingLoader, World};

#[tokio::test]
async fn name_resolution_prefers_the_newest_schema() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    world.add_schema(&app, "s-old", "orders", 120).await;
    world.add_schema(&app, "s-new", "orders", 10).await;

    let schema = world
        .provider
        .get_schema_by_name(&app.id, "orders", false)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(schema.id, DomainId::new("s-new"));
}

#[tokio::test]
async fn deleted_newest_schema_falls_back_to_the_older_one() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    world.add_schema(&app, "s-old", "orders", 120).await;
    let mut newest = world.add_schema(&app, "s-new", "orders", 10).await;
    newest.is_deleted = true;
    world.put_schema(&newest).await;

    let visible = world
        .provider
        .get_schema_by_name(&app.id, "orders", false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(visible.id, DomainId::new("s-old"));

    let with_deleted = world
        .provider
        .get_schema_by_name(&app.id, "orders", true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(with_deleted.id, DomainId::new("s-new"));
}

#[tokio::test]
async fn unknown_schema_name_is_none() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    world.add_schema(&app, "s1", "orders", 0).await;

    let missing = world
        .provider
        .get_schema_by_name(&app.id, "invoices", false)
        .await
        .unwrap();
    assert!(missing.is_none());

    let other_tenant = world
        .provider
        .get_schema_by_name(&DomainId::new("a2"), "orders", false)
        .await
        .unwrap();
    assert!(other_tenant.is_none());
}

#[tokio::test]
async fn get_schema_by_id_honours_include_deleted() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    let mut schema = world.add_schema(&app, "s1", "orders", 0).await;
    schema.is_deleted = true;
    world.put_schema(&schema).await;

    let hidden = world.provider.get_schema(&app.id, &schema.id, false).await.unwrap();
    assert!(hidden.is_none());

    let shown = world.provider.get_schema(&app.id, &schema.id, true).await.unwrap();
    assert_eq!(shown.map(|s| s.id), Some(schema.id));
}

#[tokio::test]
async fn app_with_schema_is_all_or_nothing() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    let schema = world.add_schema(&app, "s1", "orders", 0).await;

    let both = world
        .provider
        .get_app_with_schema(&app.id, &schema.id)
        .await
        .unwrap();
    assert_eq!(both.map(|(a, s)| (a.id, s.id)), Some((app.id.clone(), schema.id.clone())));

    let no_schema = world
        .provider
        .get_app_with_schema(&app.id, &DomainId::new("missing"))
        .await
        .unwrap();
    assert!(no_schema.is_none());

    let no_app = world
        .provider
        .get_app_with_schema(&DomainId::new("missing"), &schema.id)
        .await
        .unwrap();
    assert!(no_app.is_none());

    let mut deleted = schema.clone();
    deleted.is_deleted = true;
    world.put_schema(&deleted).await;

    let deleted_schema = world
        .provider
        .get_app_with_schema(&app.id, &schema.id)
        .await
        .unwrap();
    assert!(deleted_schema.is_none());
}

#[tokio::test]
async fn app_by_name() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;

    let found = world.provider.get_app_by_name("blog").await.unwrap();
    assert_eq!(found.map(|a| a.id), Some(app.id.clone()));

    assert!(world.provider.get_app_by_name("shop").await.unwrap().is_none());

    let mut archived = app.clone();
    archived.is_archived = true;
    world.put_app(&archived).await;

    assert!(world.provider.get_app_by_name("blog").await.unwrap().is_none());
    assert!(world.provider.get_app(&app.id).await.unwrap().is_none());
}

#[tokio::test]
async fn get_schemas_returns_only_visible_schemas() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    world.add_schema(&app, "s1", "orders", 0).await;
    world.add_schema(&app, "s2", "posts", 0).await;
    let mut gone = world.add_schema(&app, "s3", "pages", 0).await;
    gone.is_deleted = true;
    world.put_schema(&gone).await;

    let other = world.add_app("a2", "shop").await;
    world.add_schema(&other, "s4", "products", 0).await;

    let mut ids: Vec<_> = world
        .provider
        .get_schemas(&app.id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id.to_string())
        .collect();
    ids.sort();

    assert_eq!(ids, vec!["s1", "s2"]);
}

#[tokio::test]
async fn rules_and_user_apps() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    world.add_rule(&app, "r1").await;
    world.add_rule(&app, "r2").await;

    let rules = world.provider.get_rules(&app.id).await.unwrap();
    assert_eq!(rules.len(), 2);

    let owned = app.clone().with_contributor("alice", "Owner");
    world.put_app(&owned).await;
    world.add_app("a2", "shop").await;

    let apps = world.provider.get_user_apps("alice").await.unwrap();
    assert_eq!(apps.into_iter().map(|a| a.id).collect::<Vec<_>>(), vec![app.id.clone()]);
    assert!(world.provider.get_user_apps("bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn one_failed_load_fails_the_batch() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    world.add_schema(&app, "s1", "orders", 0).await;
    world.add_schema(&app, "s2", "posts", 0).await;
    world.add_schema(&app, "s3", "orders", 30).await;

    let provider = world.provider_with(FailingLoader {
        inner: world.loader(),
        broken_schema: DomainId::new("s2"),
    });

    let err = provider.get_schemas(&app.id).await.unwrap_err();
    assert_eq!(err, StoreError::Storage("connection reset".into()));

    // Name lookups that never touch the broken schema still work.
    let orders = provider.get_schema_by_name(&app.id, "orders", false).await.unwrap();
    assert_eq!(orders.map(|s| s.id), Some(DomainId::new("s1")));
}

#[tokio::test]
async fn loads_fan_out_unbounded_by_default() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    for i in 0..6 {
        world.add_schema(&app, &format!("s{i}"), "orders", i).await;
    }

    let loader = Arc::new(TrackingLoader::new(world.loader()));
    let provider = world.provider_with(loader.clone());

    let schemas = provider.get_schemas(&app.id).await.unwrap();
    assert_eq!(schemas.len(), 6);
    assert_eq!(loader.peak(), 6);
}

#[tokio::test]
async fn max_concurrent_loads_bounds_the_fan_out() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    for i in 0..6 {
        world.add_schema(&app, &format!("s{i}"), "orders", i).await;
    }

    let loader = Arc::new(TrackingLoader::new(world.loader()));
    let provider = world.provider_with(loader.clone()).with_options(ProviderOptions {
        max_concurrent_loads: Some(2),
    });

    let newest = provider
        .get_schema_by_name(&app.id, "orders", false)
        .await
        .unwrap();

    assert_eq!(newest.map(|s| s.id), Some(DomainId::new("s0")));
    assert!(loader.peak() <= 2);
}

#[tokio::test]
async fn bounded_provider_keeps_id_order() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    for name in ["a", "b", "c", "d"] {
        world.add_schema(&app, name, name, 0).await;
    }

    let unbounded = world.provider.get_schemas(&app.id).await.unwrap();
    let bounded = world
        .provider_with_options(ProviderOptions {
            max_concurrent_loads: Some(1),
        })
        .get_schemas(&app.id)
        .await
        .unwrap();

    let ids = |schemas: Vec<sourced_state::state::SchemaState>| {
        schemas.into_iter().map(|s| s.id).collect::<Vec<_>>()
    };
    assert_eq!(ids(unbounded), ids(bounded));
}
