use std::collections::HashSet;

use serde_json::json;
use sourced_state::contents::ContentIdentity;
use sourced_state::query::{CompareOperator, FilterNode};
use sourced_state::{DomainId, QueryError, StoreError};

use crate::support::{content, World};

fn identity(schema: &str, id: &str) -> ContentIdentity {
    ContentIdentity {
        schema_id: DomainId::new(schema),
        id: DomainId::new(id),
    }
}

fn sorted(mut ids: Vec<ContentIdentity>) -> Vec<ContentIdentity> {
    ids.sort_by(|a, b| a.id.cmp(&b.id));
    ids
}

#[tokio::test]
async fn batch_lookup_skips_missing_ids() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    let orders = world.add_schema(&app, "s1", "orders", 0).await;
    let posts = world.add_schema(&app, "s2", "posts", 0).await;
    world.put_content(&content(&app, &orders, "A")).await;
    world.put_content(&content(&app, &posts, "B")).await;

    let ids: HashSet<_> = ["A", "B", "C"].into_iter().map(DomainId::new).collect();
    let found = world.contents.query_ids_by_ids(&app.id, &ids).await.unwrap();

    assert_eq!(sorted(found), vec![identity("s1", "A"), identity("s2", "B")]);
}

#[tokio::test]
async fn batch_lookup_hides_deleted_and_foreign_contents() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    let other = world.add_app("a2", "shop").await;
    let orders = world.add_schema(&app, "s1", "orders", 0).await;
    let products = world.add_schema(&other, "s9", "products", 0).await;

    let mut deleted = content(&app, &orders, "A");
    deleted.is_deleted = true;
    world.put_content(&deleted).await;
    world.put_content(&content(&other, &products, "B")).await;

    let ids: HashSet<_> = ["A", "B"].into_iter().map(DomainId::new).collect();
    let found = world.contents.query_ids_by_ids(&app.id, &ids).await.unwrap();

    assert!(found.is_empty());
}

#[tokio::test]
async fn schema_query_applies_the_filter() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    let orders = world.add_schema(&app, "s1", "orders", 0).await;

    world
        .put_content(&content(&app, &orders, "cheap").with_value("amount", json!(5)))
        .await;
    world
        .put_content(&content(&app, &orders, "pricey").with_value("amount", json!(50)))
        .await;

    let filter = FilterNode::compare("data.amount", CompareOperator::GreaterThan, 10i64);
    let found = world
        .contents
        .query_ids(&app.id, &orders.id, Some(&filter))
        .await
        .unwrap();

    assert_eq!(found, vec![identity("s1", "pricey")]);
}

#[tokio::test]
async fn unknown_or_deleted_schema_yields_no_ids() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    let orders = world.add_schema(&app, "s1", "orders", 0).await;
    world.put_content(&content(&app, &orders, "A")).await;

    let unknown = world
        .contents
        .query_ids(&app.id, &DomainId::new("nope"), None)
        .await
        .unwrap();
    assert!(unknown.is_empty());

    let mut deleted = orders.clone();
    deleted.is_deleted = true;
    world.put_schema(&deleted).await;

    let from_deleted = world.contents.query_ids(&app.id, &orders.id, None).await.unwrap();
    assert!(from_deleted.is_empty());
}

#[tokio::test]
async fn unknown_field_is_a_query_error() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    let orders = world.add_schema(&app, "s1", "orders", 0).await;

    let filter = FilterNode::eq("data.missing", "x");
    let err = world
        .contents
        .query_ids(&app.id, &orders.id, Some(&filter))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        StoreError::InvalidQuery(QueryError::UnknownField("data.missing".into()))
    );
}

#[tokio::test]
async fn no_predicate_escapes_tenant_or_deleted_scope() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    let other = world.add_app("a2", "shop").await;
    let orders = world.add_schema(&app, "s1", "orders", 0).await;
    let posts = world.add_schema(&app, "s2", "posts", 0).await;
    let foreign = world.add_schema(&other, "s9", "orders", 0).await;

    world
        .put_content(&content(&app, &orders, "live").with_value("title", json!("hello")))
        .await;
    let mut gone = content(&app, &orders, "gone").with_value("title", json!("hello"));
    gone.is_deleted = true;
    world.put_content(&gone).await;
    world
        .put_content(&content(&app, &posts, "post").with_value("title", json!("hello")))
        .await;
    world
        .put_content(&content(&other, &foreign, "alien").with_value("title", json!("hello")))
        .await;

    let predicates = vec![
        None,
        Some(FilterNode::eq("data.title", "hello")),
        Some(FilterNode::negate(FilterNode::eq("data.title", "nothing"))),
        Some(FilterNode::or(vec![
            FilterNode::eq("data.title", "hello"),
            FilterNode::compare("data.title", CompareOperator::Exists, false),
        ])),
        Some(FilterNode::compare("data.title", CompareOperator::StartsWith, "he")),
        Some(FilterNode::compare("id", CompareOperator::In, vec!["live", "gone", "post", "alien"])),
    ];

    for predicate in &predicates {
        let found = world
            .contents
            .query_ids(&app.id, &orders.id, predicate.as_ref())
            .await
            .unwrap();
        assert_eq!(found, vec![identity("s1", "live")], "predicate {predicate:?}");
    }
}

#[tokio::test]
async fn non_numeric_number_literal_is_rejected() {
    let world = World::new();
    let app = world.add_app("a1", "blog").await;
    let orders = world.add_schema(&app, "s1", "orders", 0).await;
    world.put_content(&content(&app, &orders, "no-amount")).await;
    world
        .put_content(&content(&app, &orders, "with-amount").with_value("amount", json!(5)))
        .await;

    for raw in ["NaN", "inf"] {
        let filter = FilterNode::eq("data.amount", raw);
        let err = world
            .contents
            .query_ids(&app.id, &orders.id, Some(&filter))
            .await
            .unwrap_err();

        assert!(
            matches!(err, StoreError::InvalidQuery(QueryError::InvalidValue { .. })),
            "{raw}: {err:?}"
        );
    }
}
