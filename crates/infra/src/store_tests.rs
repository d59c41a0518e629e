//! Store-level tests for the inventory state-transition and
//! audit-consistency contract, run against the in-memory backend.

use std::sync::Arc;

use stockroom_core::{DomainError, UserId};
use stockroom_inventory::{CreateItem, InventoryItem, StockMove, UpdateItem};

use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::store::{InventoryStore, ItemFilter, UserStore};

async fn store_with_user() -> (MemoryStore, UserId) {
    let store = MemoryStore::new();
    let user = store.create_user("alice", "phc-hash").await.unwrap();
    (store, user.id)
}

fn create(name: &str, category: &str, quantity: i64) -> CreateItem {
    CreateItem::validated(name, category, quantity, None).unwrap()
}

async fn actions_for(store: &MemoryStore, item: &InventoryItem) -> Vec<String> {
    let (_, entries) = store.audit_for_item(item.id).await.unwrap();
    entries.into_iter().map(|e| e.action).collect()
}

fn assert_domain(err: StoreError, expected: DomainError) {
    match err {
        StoreError::Domain(e) => assert_eq!(e, expected),
        StoreError::Storage(msg) => panic!("expected domain error, got storage: {msg}"),
    }
}

#[tokio::test]
async fn creating_an_item_lists_it_with_its_creator() {
    let (store, actor) = store_with_user().await;

    let (item, merged) = store
        .create_item(create("Laptop", "Electronics", 3), actor)
        .await
        .unwrap();
    assert!(!merged);

    let listed = store.list_items(ItemFilter::Active).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].item.id, item.id);
    assert_eq!(listed[0].added_by_username, "alice");
    assert_eq!(actions_for(&store, &item).await, vec!["Added"]);
}

#[tokio::test]
async fn creating_a_matching_item_merges_instead_of_inserting() {
    let (store, actor) = store_with_user().await;

    let (original, _) = store
        .create_item(create("Cable", "USB", 10), actor)
        .await
        .unwrap();

    // Different casing and whitespace still hit the same catalog key.
    let (merged_item, merged) = store
        .create_item(create("  cable ", "usb", 5), actor)
        .await
        .unwrap();

    assert!(merged);
    assert_eq!(merged_item.id, original.id);
    assert_eq!(merged_item.quantity, 15);
    assert_eq!(store.list_items(ItemFilter::All).await.unwrap().len(), 1);
    assert_eq!(
        actions_for(&store, &merged_item).await,
        vec!["Added (merged) +5", "Added"]
    );
}

#[tokio::test]
async fn a_different_category_is_a_new_item_not_a_merge() {
    let (store, actor) = store_with_user().await;

    store.create_item(create("Cable", "USB", 10), actor).await.unwrap();
    let (_, merged) = store
        .create_item(create("Cable", "HDMI", 5), actor)
        .await
        .unwrap();

    assert!(!merged);
    assert_eq!(store.list_items(ItemFilter::Active).await.unwrap().len(), 2);
}

#[tokio::test]
async fn every_successful_mutation_appends_exactly_one_entry() {
    let (store, actor) = store_with_user().await;

    let (item, _) = store
        .create_item(create("Cable", "USB", 10), actor)
        .await
        .unwrap();
    assert_eq!(actions_for(&store, &item).await.len(), 1);

    let update = UpdateItem::validated("Cable", "USB", 12, Some(5)).unwrap();
    store.update_item(item.id, update, actor).await.unwrap();
    assert_eq!(actions_for(&store, &item).await.len(), 2);

    let mv = StockMove::validated("In", 3, None).unwrap();
    store.move_stock(item.id, mv, actor).await.unwrap();
    assert_eq!(actions_for(&store, &item).await.len(), 3);

    let mv = StockMove::validated("Out", 4, Some("damaged")).unwrap();
    let moved = store.move_stock(item.id, mv, actor).await.unwrap();
    assert_eq!(moved.quantity, 11);

    assert_eq!(
        actions_for(&store, &moved).await,
        vec!["Out 4 (damaged)", "In 3", "Updated", "Added"]
    );
}

#[tokio::test]
async fn a_refused_move_leaves_quantity_and_audit_untouched() {
    let (store, actor) = store_with_user().await;

    let (item, _) = store
        .create_item(create("Cable", "USB", 10), actor)
        .await
        .unwrap();

    let mv = StockMove::validated("Out", 11, None).unwrap();
    let err = store.move_stock(item.id, mv, actor).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Domain(DomainError::Validation(_))
    ));

    let current = store.get_item(item.id).await.unwrap().unwrap();
    assert_eq!(current.quantity, 10);
    assert_eq!(actions_for(&store, &item).await.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_out_moves_cannot_take_quantity_below_zero() {
    let (store, actor) = store_with_user().await;
    let store = Arc::new(store);

    let (item, _) = store
        .create_item(create("Cable", "USB", 10), actor)
        .await
        .unwrap();

    // 10 callers racing to remove 2 each from a quantity of 10: exactly
    // 5 can be accepted, the rest must be refused without touching state.
    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = Arc::clone(&store);
        let id = item.id;
        handles.push(tokio::spawn(async move {
            let mv = StockMove::validated("Out", 2, None).unwrap();
            store.move_stock(id, mv, actor).await.is_ok()
        }));
    }

    let mut accepted = 0i64;
    for handle in handles {
        if handle.await.unwrap() {
            accepted += 1;
        }
    }

    let current = store.get_item(item.id).await.unwrap().unwrap();
    assert_eq!(accepted, 5);
    assert_eq!(current.quantity, 10 - 2 * accepted);

    // One audit entry per accepted move, none for the refused ones.
    let actions = actions_for(&store, &item).await;
    assert_eq!(actions.len(), 1 + accepted as usize);
    assert_eq!(actions.iter().filter(|a| *a == "Out 2").count(), 5);
}

#[tokio::test]
async fn an_out_move_of_the_full_quantity_reaches_zero() {
    let (store, actor) = store_with_user().await;

    let (item, _) = store
        .create_item(create("Cable", "USB", 10), actor)
        .await
        .unwrap();

    let mv = StockMove::validated("Out", 10, None).unwrap();
    let moved = store.move_stock(item.id, mv, actor).await.unwrap();
    assert_eq!(moved.quantity, 0);
}

#[tokio::test]
async fn soft_deleted_items_leave_active_listings_but_stay_addressable() {
    let (store, actor) = store_with_user().await;

    let (item, _) = store
        .create_item(create("Cable", "USB", 10), actor)
        .await
        .unwrap();
    store.soft_delete_item(item.id, actor).await.unwrap();

    assert!(store.list_items(ItemFilter::Active).await.unwrap().is_empty());
    let deleted = store.list_items(ItemFilter::Deleted).await.unwrap();
    assert_eq!(deleted.len(), 1);
    assert!(deleted[0].item.deleted_at.is_some());
    assert_eq!(store.list_items(ItemFilter::All).await.unwrap().len(), 1);

    // Still addressable by id for restore/purge.
    assert!(store.get_item(item.id).await.unwrap().is_some());

    // But absent for the active-item audit view and further mutations.
    let err = store.audit_for_item(item.id).await.unwrap_err();
    assert_domain(err, DomainError::NotFound);
    let update = UpdateItem::validated("Cable", "USB", 1, None).unwrap();
    assert_domain(
        store.update_item(item.id, update, actor).await.unwrap_err(),
        DomainError::NotFound,
    );
    assert_domain(
        store.soft_delete_item(item.id, actor).await.unwrap_err(),
        DomainError::NotFound,
    );
}

#[tokio::test]
async fn restore_round_trips_with_a_faithful_trail() {
    let (store, actor) = store_with_user().await;

    let (item, _) = store
        .create_item(create("Cable", "USB", 10), actor)
        .await
        .unwrap();
    store.soft_delete_item(item.id, actor).await.unwrap();
    let restored = store.restore_item(item.id, actor).await.unwrap();

    assert!(!restored.is_deleted);
    assert_eq!(restored.quantity, 10);
    assert_eq!(
        actions_for(&store, &restored).await,
        vec!["Restored", "Deleted", "Added"]
    );
}

#[tokio::test]
async fn restoring_an_active_item_is_refused() {
    let (store, actor) = store_with_user().await;

    let (item, _) = store
        .create_item(create("Cable", "USB", 10), actor)
        .await
        .unwrap();
    let err = store.restore_item(item.id, actor).await.unwrap_err();
    assert!(matches!(err, StoreError::Domain(DomainError::Conflict(_))));
    assert_eq!(actions_for(&store, &item).await.len(), 1);
}

#[tokio::test]
async fn purge_removes_the_item_together_with_its_trail() {
    let (store, actor) = store_with_user().await;

    let (item, _) = store
        .create_item(create("Cable", "USB", 10), actor)
        .await
        .unwrap();
    store.soft_delete_item(item.id, actor).await.unwrap();
    store.purge_item(item.id).await.unwrap();

    assert!(store.get_item(item.id).await.unwrap().is_none());
    assert!(store.list_items(ItemFilter::All).await.unwrap().is_empty());
    assert!(store.audit_all().await.unwrap().is_empty());

    assert_domain(
        store.purge_item(item.id).await.unwrap_err(),
        DomainError::NotFound,
    );
}

#[tokio::test]
async fn audit_all_groups_entries_per_active_item_newest_first() {
    let (store, actor) = store_with_user().await;

    let (cable, _) = store
        .create_item(create("Cable", "USB", 10), actor)
        .await
        .unwrap();
    let (laptop, _) = store
        .create_item(create("Laptop", "Electronics", 2), actor)
        .await
        .unwrap();
    let mv = StockMove::validated("Out", 1, None).unwrap();
    store.move_stock(cable.id, mv, actor).await.unwrap();
    store.soft_delete_item(laptop.id, actor).await.unwrap();

    let all = store.audit_all().await.unwrap();
    assert_eq!(all.len(), 1, "soft-deleted items are excluded");
    assert_eq!(all[0].item_id, cable.id);
    let actions: Vec<_> = all[0].entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["Out 1", "Added"]);
    assert_eq!(all[0].entries[0].performed_by_username, "alice");
}

#[tokio::test]
async fn duplicate_usernames_are_a_conflict() {
    let store = MemoryStore::new();
    store.create_user("alice", "hash-a").await.unwrap();
    let err = store.create_user("alice", "hash-b").await.unwrap_err();
    assert!(matches!(err, StoreError::Domain(DomainError::Conflict(_))));
}
