use adminbit::*;
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    controller: CollectionController,
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
}

fn fixture(collection: &str, seeded: bool) -> Fixture {
    let store = if seeded {
        Arc::new(MemoryStore::seeded(Duration::ZERO))
    } else {
        Arc::new(MemoryStore::new(Duration::ZERO))
    };
    let notifier = Arc::new(RecordingNotifier::new());
    let controller = CollectionController::new(
        collection,
        Arc::new(SchemaRegistry::builtin()),
        Arc::clone(&store) as Arc<dyn DataStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );
    Fixture { controller, store, notifier }
}

async fn loaded(collection: &str, seeded: bool) -> Fixture {
    let mut f = fixture(collection, seeded);
    assert!(f.controller.load().await, "fixture load should succeed");
    f
}

#[tokio::test]
async fn it_should_return_the_full_collection_for_an_empty_search_term() {
    let f = loaded("users", true).await;
    let all = f.controller.search("");
    assert_eq!(all, f.controller.rows().to_vec());
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn it_should_search_case_insensitively_across_all_fields() {
    let mut f = fixture("users", false);
    f.store.insert("users", Record::new(1).with("name", "A")).await.expect("seed");
    f.store.insert("users", Record::new(2).with("name", "B")).await.expect("seed");
    assert!(f.controller.load().await);

    let hits = f.controller.search("a");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 1);
    assert_eq!(hits[0].get("name"), Some(&FieldValue::Text("A".to_string())));
}

#[tokio::test]
async fn it_should_match_on_stringified_numeric_fields() {
    let f = loaded("products", true).await;
    let hits = f.controller.search("29.99");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].get("name"), Some(&FieldValue::Text("Product A".to_string())));
}

#[tokio::test]
async fn it_should_not_mutate_rows_while_searching() {
    let f = loaded("users", true).await;
    let before = f.controller.rows().to_vec();
    let _ = f.controller.search("john");
    assert_eq!(f.controller.rows(), before.as_slice());
}

#[tokio::test]
async fn it_should_assign_id_one_on_an_empty_collection() {
    let mut f = loaded("categories", false).await;
    f.controller.begin_create();
    f.controller.form_mut().expect("open session").apply_json(
        SchemaRegistry::builtin().fields("categories"),
        &serde_json::json!({"name": "X"}),
    ).expect("payload");
    let saved = f.controller.save().await.expect("save");
    assert_eq!(saved.id, 1);
    assert_eq!(f.controller.rows().len(), 1);
}

#[tokio::test]
async fn it_should_assign_max_id_plus_one_on_create() {
    let mut f = fixture("categories", false);
    f.store.insert("categories", Record::new(3).with("name", "X")).await.expect("seed");
    assert!(f.controller.load().await);

    f.controller.begin_create();
    f.controller.form_mut().expect("open session").apply_json(
        SchemaRegistry::builtin().fields("categories"),
        &serde_json::json!({"name": "Y"}),
    ).expect("payload");
    let saved = f.controller.save().await.expect("save");
    assert_eq!(saved.id, 4);
}

#[tokio::test]
async fn it_should_never_take_the_id_from_form_input_on_update() {
    let mut f = loaded("users", true).await;
    let target = f.controller.rows()[1].clone();
    f.controller.begin_edit(&target);
    f.controller.form_mut().expect("open session").apply_json(
        SchemaRegistry::builtin().fields("users"),
        &serde_json::json!({"id": 999, "name": "Renamed", "email": "renamed@example.com"}),
    ).expect("payload");
    let saved = f.controller.save().await.expect("save");
    assert_eq!(saved.id, target.id);
    assert!(f.controller.rows().iter().all(|r| r.id != 999));
}

#[tokio::test]
async fn it_should_round_trip_an_unchanged_edit() {
    let mut f = loaded("users", true).await;
    let before = f.controller.rows().to_vec();
    let target = before[0].clone();
    f.controller.begin_edit(&target);
    let saved = f.controller.save().await.expect("save");
    assert_eq!(saved, target);
    assert_eq!(f.controller.rows(), before.as_slice());
}

#[tokio::test]
async fn it_should_delete_exactly_the_matching_record() {
    let mut f = loaded("users", true).await;
    let order_before: Vec<u64> = f.controller.rows().iter().map(|r| r.id).collect();
    assert_eq!(order_before, vec![1, 2, 3]);

    assert!(f.controller.delete(2).await);
    let order_after: Vec<u64> = f.controller.rows().iter().map(|r| r.id).collect();
    assert_eq!(order_after, vec![1, 3]);

    let stored: Vec<u64> = f.store.fetch_all("users").await.expect("fetch").iter().map(|r| r.id).collect();
    assert_eq!(stored, vec![1, 3]);
}

#[tokio::test]
async fn it_should_treat_deleting_an_absent_id_as_a_no_op() {
    let mut f = loaded("users", true).await;
    let before = f.controller.rows().to_vec();
    assert!(f.controller.delete(42).await);
    assert_eq!(f.controller.rows(), before.as_slice());
    assert_eq!(f.notifier.last_kind(), Some(NotificationKind::Success));
}

#[tokio::test]
async fn it_should_keep_rows_and_session_open_when_save_fails() {
    let mut f = loaded("categories", true).await;
    let before = f.controller.rows().to_vec();
    f.controller.begin_create();
    f.controller.form_mut().expect("open session").apply_json(
        SchemaRegistry::builtin().fields("categories"),
        &serde_json::json!({"name": "Doomed"}),
    ).expect("payload");

    f.store.fail_next();
    assert!(f.controller.save().await.is_none());
    assert_eq!(f.controller.rows(), before.as_slice());
    assert!(f.controller.editing().is_open());
    assert_eq!(f.notifier.last_kind(), Some(NotificationKind::Error));

    // Retry within the same session succeeds.
    let saved = f.controller.save().await.expect("retry");
    assert_eq!(saved.id, 4);
    assert!(!f.controller.editing().is_open());
    assert_eq!(f.notifier.last_kind(), Some(NotificationKind::Success));
}

#[tokio::test]
async fn it_should_keep_prior_rows_and_notify_when_load_fails() {
    let mut f = loaded("users", true).await;
    let before = f.controller.rows().to_vec();
    f.store.fail_next();
    assert!(!f.controller.load().await);
    assert_eq!(f.controller.rows(), before.as_slice());
    assert!(!f.controller.is_loading());
    assert_eq!(f.notifier.last_kind(), Some(NotificationKind::Error));
}

#[tokio::test]
async fn it_should_discard_a_stale_load_for_a_superseded_activation() {
    let mut f = loaded("users", true).await;

    // A fetch for "users" is in flight while the operator switches to "products".
    let stale_generation = f.controller.begin_load();
    let stale_fetch = f.store.fetch_all("users").await;
    f.controller.activate("products");
    assert!(!f.controller.finish_load(stale_generation, stale_fetch));
    assert!(f.controller.rows().is_empty());

    assert!(f.controller.load().await);
    assert_eq!(f.controller.rows().len(), 3);
    assert_eq!(f.controller.collection(), "products");
}

#[tokio::test]
async fn it_should_derive_columns_from_the_schema_not_the_first_record() {
    let mut f = fixture("products", false);
    // A heterogeneous first record must not clip the column set.
    f.store.insert("products", Record::new(1).with("name", "Bare")).await.expect("seed");
    assert!(f.controller.load().await);
    assert_eq!(f.controller.columns(), vec!["id", "name", "price", "category", "stock"]);
}

#[tokio::test]
async fn it_should_have_no_columns_for_an_unknown_collection() {
    let f = loaded("unknown", false).await;
    assert!(f.controller.columns().is_empty());
    assert!(f.controller.rows().is_empty());
}

#[tokio::test]
async fn it_should_default_create_forms_from_the_schema() {
    let mut f = loaded("products", true).await;
    let form = f.controller.begin_create();
    assert_eq!(form.get("price"), Some(&FieldValue::Number(0.0)));
    assert_eq!(form.get("stock"), Some(&FieldValue::Number(0.0)));
    assert_eq!(form.get("name"), Some(&FieldValue::Text(String::new())));
}

#[tokio::test]
async fn it_should_close_the_session_on_cancel() {
    let mut f = loaded("users", true).await;
    f.controller.begin_create();
    assert!(f.controller.editing().is_open());
    f.controller.cancel();
    assert!(!f.controller.editing().is_open());
}

#[tokio::test]
async fn it_should_do_nothing_on_save_without_an_open_session() {
    let mut f = loaded("users", true).await;
    let before = f.controller.rows().to_vec();
    assert!(f.controller.save().await.is_none());
    assert_eq!(f.controller.rows(), before.as_slice());
    assert!(f.notifier.take().is_empty());
}
