use chrono::{Duration, Utc};

use parseboard::store::{StoreConfig, SweepPolicy, TouchPolicy};

mod common;
use common::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn roundtrip_root_layout() {
    let store = memory_store(StoreConfig::default()).await;
    let layout = string_layout("tokens", &[&["a", "b"], &["c"]]);

    let id = store.create_root(&layout).await.expect("create root");
    assert_eq!(id.len(), 32);

    let record = store.get(&id).await.expect("get").expect("record");
    assert_eq!(record.id, id);
    assert!(record.based_on.is_none());
    assert!(record.search_filters_json.is_none());
    assert_eq!(record.layout().expect("deserialize layout"), layout);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_id_is_none_not_an_error() {
    let store = memory_store(StoreConfig::default()).await;
    let record = store.get("does-not-exist").await.expect("get");
    assert!(record.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn derivations_flatten_to_the_original_root() {
    let store = memory_store(StoreConfig::default()).await;
    let layout = string_layout("tokens", &[&["a"]]);
    let filters = vec![filter_for("tokens")];

    let root_id = store.create_root(&layout).await.unwrap();
    let root = store.get(&root_id).await.unwrap().unwrap();

    // Chain of five searches, each derived from the previous result.
    let mut current = root;
    for _ in 0..5 {
        let derived_id = store
            .derive(Some(&current), &layout, &filters)
            .await
            .unwrap();
        current = store.get(&derived_id).await.unwrap().unwrap();
        assert_eq!(current.based_on.as_deref(), Some(root_id.as_str()));
    }

    let children = store.children_of(&root_id).await.unwrap();
    assert_eq!(children.len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn derive_without_a_current_record_creates_a_root() {
    let store = memory_store(StoreConfig::default()).await;
    let layout = string_layout("tokens", &[&["a"]]);
    let id = store
        .derive(None, &layout, &[filter_for("tokens")])
        .await
        .unwrap();
    let record = store.get(&id).await.unwrap().unwrap();
    assert!(record.based_on.is_none());
    let filters = record.search_filters().unwrap().unwrap();
    assert_eq!(filters[0].slice_name, "tokens");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cascading_touch_refreshes_the_whole_family() {
    let store = memory_store(StoreConfig::default()).await;
    let layout = string_layout("tokens", &[&["a"]]);

    let root_id = store.create_root(&layout).await.unwrap();
    let root = store.get(&root_id).await.unwrap().unwrap();
    let child_id = store.derive(Some(&root), &layout, &[]).await.unwrap();
    let sibling_id = store.derive(Some(&root), &layout, &[]).await.unwrap();

    let old = Utc::now() - Duration::days(30);
    for id in [&root_id, &child_id, &sibling_id] {
        store.set_timestamp_for_test(id, old).await.unwrap();
    }

    store.touch(&child_id).await.unwrap();

    for id in [&root_id, &child_id, &sibling_id] {
        let record = store.get(id).await.unwrap().unwrap();
        assert!(
            record.timestamp > old + Duration::days(1),
            "{id} should have been refreshed"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn local_touch_refreshes_only_the_record() {
    let config = StoreConfig::default().with_touch_policy(TouchPolicy::Local);
    let store = memory_store(config).await;
    let layout = string_layout("tokens", &[&["a"]]);

    let root_id = store.create_root(&layout).await.unwrap();
    let root = store.get(&root_id).await.unwrap().unwrap();
    let child_id = store.derive(Some(&root), &layout, &[]).await.unwrap();

    let old = Utc::now() - Duration::days(30);
    store.set_timestamp_for_test(&root_id, old).await.unwrap();
    store.set_timestamp_for_test(&child_id, old).await.unwrap();

    store.touch(&child_id).await.unwrap();

    let root_after = store.get(&root_id).await.unwrap().unwrap();
    let child_after = store.get(&child_id).await.unwrap().unwrap();
    assert!(child_after.timestamp > old + Duration::days(1));
    assert!(root_after.timestamp < old + Duration::days(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sweep_keeps_records_exactly_at_the_ttl_boundary() {
    let config = StoreConfig::default().with_ttl(Duration::days(90));
    let store = memory_store(config).await;
    let layout = string_layout("tokens", &[&["a"]]);

    let boundary_id = store.create_root(&layout).await.unwrap();
    let expired_id = store.create_root(&layout).await.unwrap();

    let now = Utc::now();
    store
        .set_timestamp_for_test(&boundary_id, now - Duration::days(90))
        .await
        .unwrap();
    store
        .set_timestamp_for_test(&expired_id, now - Duration::days(90) - Duration::seconds(1))
        .await
        .unwrap();

    let stats = store.sweep_at(now).await.unwrap();
    assert_eq!(stats.expired, 1);

    assert!(store.get(&boundary_id).await.unwrap().is_some());
    assert!(store.get(&expired_id).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cascading_sweep_takes_fresh_dependents_with_a_dead_root() {
    let store = memory_store(StoreConfig::default()).await;
    let layout = string_layout("tokens", &[&["a"]]);

    let root_id = store.create_root(&layout).await.unwrap();
    let root = store.get(&root_id).await.unwrap().unwrap();
    let child_id = store.derive(Some(&root), &layout, &[]).await.unwrap();

    // Root is long expired, child was accessed yesterday.
    store
        .set_timestamp_for_test(&root_id, Utc::now() - Duration::days(120))
        .await
        .unwrap();
    store
        .set_timestamp_for_test(&child_id, Utc::now() - Duration::days(1))
        .await
        .unwrap();

    let stats = store.sweep().await.unwrap();
    assert_eq!(stats.expired, 1);
    assert_eq!(stats.cascaded, 1);
    assert!(store.get(&root_id).await.unwrap().is_none());
    assert!(store.get(&child_id).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn independent_sweep_judges_every_record_on_its_own_age() {
    let config = StoreConfig::default().with_sweep_policy(SweepPolicy::Local);
    let store = memory_store(config).await;
    let layout = string_layout("tokens", &[&["a"]]);

    let root_id = store.create_root(&layout).await.unwrap();
    let root = store.get(&root_id).await.unwrap().unwrap();
    let child_id = store.derive(Some(&root), &layout, &[]).await.unwrap();

    store
        .set_timestamp_for_test(&root_id, Utc::now() - Duration::days(120))
        .await
        .unwrap();
    store
        .set_timestamp_for_test(&child_id, Utc::now() - Duration::days(1))
        .await
        .unwrap();

    let stats = store.sweep().await.unwrap();
    assert_eq!(stats.expired, 1);
    assert_eq!(stats.cascaded, 0);
    assert!(store.get(&root_id).await.unwrap().is_none());
    assert!(store.get(&child_id).await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fetch_refreshes_the_timestamp() {
    let store = memory_store(StoreConfig::default()).await;
    let layout = string_layout("tokens", &[&["a"]]);
    let id = store.create_root(&layout).await.unwrap();

    let old = Utc::now() - Duration::days(30);
    store.set_timestamp_for_test(&id, old).await.unwrap();

    let record = store.fetch(&id).await.unwrap().unwrap();
    // fetch returns the record as read, but the stored timestamp moved.
    assert!(record.timestamp < old + Duration::days(1));
    let after = store.get(&id).await.unwrap().unwrap();
    assert!(after.timestamp > old + Duration::days(1));
}
