mod common;

use basket::api::{ApiClient, ITEMS, LISTS};
use basket::lists::ListSlice;
use basket::slice::SliceStatus;
use basket::ClientError;
use common::{sign_in, test_client};
use serde_json::json;
use shared::view::SortSpec;
use shared::{ItemChanges, ListMeta, NewItem, ShoppingItem, ShoppingList};

fn milk(quantity: f64) -> NewItem {
    NewItem {
        name: "Milk".to_string(),
        quantity,
        ..NewItem::default()
    }
}

#[tokio::test]
async fn groceries_round_trip_ends_with_nothing_left() {
    let mut client = test_client().await;
    let alice = sign_in(&mut client.store, "alice@example.com", "pw").await;
    let store = &mut client.store;

    let list = store
        .lists
        .create_list(&alice.id, "Groceries", ListMeta::default())
        .await
        .unwrap();
    assert_eq!(list.id.len(), 8);
    assert_eq!(list.user_id, alice.id);
    assert_eq!(list.share_code, None);

    let item = store.items.add_item(&list.id, milk(2.0)).await.unwrap();
    assert_eq!(item.quantity, 2);
    assert!(!item.purchased);
    assert_eq!(item.list_id, list.id);

    let toggled = store.items.toggle_purchased(&list.id, &item.id).await.unwrap();
    assert!(toggled.purchased);
    assert!(store.items.select_item(&list.id, &item.id).unwrap().purchased);

    store.delete_list(&list.id).await.unwrap();

    assert!(store.lists.select_by_id(&list.id).is_none());
    assert!(store.items.select_by_list(&list.id).is_empty());

    let remaining: Vec<ShoppingItem> = client
        .backend
        .api
        .list(ITEMS, &[("listId", list.id.as_str())])
        .await
        .unwrap();
    assert!(remaining.is_empty());

    let lists = client.store.lists.fetch_for_user(&alice.id).await.unwrap();
    assert!(lists.is_empty());
}

#[tokio::test]
async fn blank_title_fails_before_any_request() {
    // Nothing listens here; a network attempt would surface as a network error
    let mut lists = ListSlice::new(ApiClient::new("http://127.0.0.1:9"));

    let err = lists
        .create_list("u1", "   ", ListMeta::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(lists.state().status(), SliceStatus::Idle);
}

#[tokio::test]
async fn lists_are_scoped_to_their_owner() {
    let mut client = test_client().await;
    let alice = sign_in(&mut client.store, "alice@example.com", "pw").await;

    client
        .store
        .lists
        .create_list(&alice.id, "Groceries", ListMeta::default())
        .await
        .unwrap();
    client
        .store
        .lists
        .create_list("someone-else", "Hardware", ListMeta::default())
        .await
        .unwrap();

    let mine = client.store.lists.fetch_for_user(&alice.id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].title, "Groceries");
    assert_eq!(client.store.lists.select_by_user(&alice.id).len(), 1);
    assert!(client.store.lists.select_by_user("someone-else").is_empty());
}

#[tokio::test]
async fn rename_and_metadata_update_the_cache_and_disk() {
    let mut client = test_client().await;
    let alice = sign_in(&mut client.store, "alice@example.com", "pw").await;
    let lists = &mut client.store.lists;

    let meta = ListMeta {
        category: Some("Food".to_string()),
        ..ListMeta::default()
    };
    let list = lists.create_list(&alice.id, "Groceries", meta.clone()).await.unwrap();
    assert_eq!(lists.cached_meta(&list.id), Some(meta));

    let renamed = lists.rename_list(&list.id, "  Weekly shop ").await.unwrap();
    assert_eq!(renamed.title, "Weekly shop");
    assert_eq!(renamed.category.as_deref(), Some("Food"));

    let err = lists.rename_list(&list.id, "").await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(lists.select_by_id(&list.id).unwrap().title, "Weekly shop");

    let notes = ListMeta {
        notes: Some("Saturday".to_string()),
        ..ListMeta::default()
    };
    let updated = lists.update_list_meta(&list.id, notes).await.unwrap();
    assert_eq!(updated.notes.as_deref(), Some("Saturday"));
    assert_eq!(updated.category.as_deref(), Some("Food"));

    let cached = lists.cached_meta(&list.id).unwrap();
    assert_eq!(cached.category.as_deref(), Some("Food"));
    assert_eq!(cached.notes.as_deref(), Some("Saturday"));

    // Empty metadata returns the cached list untouched
    let unchanged = lists.update_list_meta(&list.id, ListMeta::default()).await.unwrap();
    assert_eq!(unchanged, updated);

    client.store.delete_list(&list.id).await.unwrap();
    assert_eq!(client.store.lists.cached_meta(&list.id), None);
}

#[tokio::test]
async fn patching_a_missing_list_leaves_the_cache_alone() {
    let mut client = test_client().await;
    let lists = &mut client.store.lists;

    let err = lists.rename_list("missing1", "Anything").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(lists.state().status(), SliceStatus::Failed);
    assert!(lists.select_by_id("missing1").is_none());
}

#[tokio::test]
async fn deleting_a_list_spares_other_lists_items() {
    let mut client = test_client().await;
    let alice = sign_in(&mut client.store, "alice@example.com", "pw").await;
    let store = &mut client.store;

    let groceries = store
        .lists
        .create_list(&alice.id, "Groceries", ListMeta::default())
        .await
        .unwrap();
    let hardware = store
        .lists
        .create_list(&alice.id, "Hardware", ListMeta::default())
        .await
        .unwrap();

    for name in ["Milk", "Eggs", "Bread"] {
        let item = NewItem {
            name: name.to_string(),
            quantity: 1.0,
            ..NewItem::default()
        };
        store.items.add_item(&groceries.id, item).await.unwrap();
    }
    let nails = NewItem {
        name: "Nails".to_string(),
        quantity: 100.0,
        ..NewItem::default()
    };
    store.items.add_item(&hardware.id, nails).await.unwrap();

    store.delete_list(&groceries.id).await.unwrap();

    let all: Vec<ShoppingItem> = client.backend.api.list(ITEMS, &[]).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Nails");

    let lists: Vec<ShoppingList> = client.backend.api.list(LISTS, &[]).await.unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].id, hardware.id);
}

#[tokio::test]
async fn quantities_are_clamped_to_at_least_one() {
    let mut client = test_client().await;
    let alice = sign_in(&mut client.store, "alice@example.com", "pw").await;
    let store = &mut client.store;
    let list = store
        .lists
        .create_list(&alice.id, "Groceries", ListMeta::default())
        .await
        .unwrap();

    let item = store.items.add_item(&list.id, milk(0.0)).await.unwrap();
    assert_eq!(item.quantity, 1);

    let item = store.items.decrement(&list.id, &item.id).await.unwrap();
    assert_eq!(item.quantity, 1);

    let item = store.items.increment(&list.id, &item.id).await.unwrap();
    assert_eq!(item.quantity, 2);

    let item = store.items.set_quantity(&list.id, &item.id, 3.7).await.unwrap();
    assert_eq!(item.quantity, 3);

    let item = store.items.set_quantity(&list.id, &item.id, -4.0).await.unwrap();
    assert_eq!(item.quantity, 1);

    let stored: ShoppingItem = client.backend.api.get(ITEMS, &item.id).await.unwrap();
    assert_eq!(stored.quantity, 1);
}

#[tokio::test]
async fn editing_items_validates_and_merges() {
    let mut client = test_client().await;
    let alice = sign_in(&mut client.store, "alice@example.com", "pw").await;
    let store = &mut client.store;
    let list = store
        .lists
        .create_list(&alice.id, "Groceries", ListMeta::default())
        .await
        .unwrap();
    let item = store.items.add_item(&list.id, milk(1.0)).await.unwrap();

    let changes = ItemChanges {
        category: Some("Dairy".to_string()),
        notes: Some("Semi-skimmed".to_string()),
        ..ItemChanges::default()
    };
    let edited = store.items.update_item(&list.id, &item.id, changes).await.unwrap();
    assert_eq!(edited.name, "Milk");
    assert_eq!(edited.category.as_deref(), Some("Dairy"));
    assert_eq!(edited.notes.as_deref(), Some("Semi-skimmed"));

    let blank_name = ItemChanges {
        name: Some("  ".to_string()),
        ..ItemChanges::default()
    };
    let err = store
        .items
        .update_item(&list.id, &item.id, blank_name)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(store.items.select_item(&list.id, &item.id).unwrap().name, "Milk");

    let nothing = store
        .items
        .update_item(&list.id, &item.id, ItemChanges::default())
        .await
        .unwrap();
    assert_eq!(nothing, edited);
}

#[tokio::test]
async fn toggling_twice_restores_the_flag() {
    let mut client = test_client().await;
    let alice = sign_in(&mut client.store, "alice@example.com", "pw").await;
    let store = &mut client.store;
    let list = store
        .lists
        .create_list(&alice.id, "Groceries", ListMeta::default())
        .await
        .unwrap();
    let item = store.items.add_item(&list.id, milk(1.0)).await.unwrap();

    store.items.toggle_purchased(&list.id, &item.id).await.unwrap();
    let back = store.items.toggle_purchased(&list.id, &item.id).await.unwrap();
    assert!(!back.purchased);

    let err = store
        .items
        .toggle_purchased(&list.id, "missing1")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn reloaded_items_can_be_filtered_and_sorted() {
    let mut client = test_client().await;
    let alice = sign_in(&mut client.store, "alice@example.com", "pw").await;
    let store = &mut client.store;
    let list = store
        .lists
        .create_list(&alice.id, "Groceries", ListMeta::default())
        .await
        .unwrap();

    for (name, category) in [("apple", "Fruit"), ("Banana", "Fruit"), ("Cherry", "Berries")] {
        let item = NewItem {
            name: name.to_string(),
            quantity: 1.0,
            category: Some(category.to_string()),
            ..NewItem::default()
        };
        store.items.add_item(&list.id, item).await.unwrap();
    }

    // A fresh cache, as after a restart
    store.items.forget_list(&list.id);
    assert!(store.items.select_by_list(&list.id).is_empty());
    let loaded = store.items.fetch_by_list(&list.id).await.unwrap();
    assert_eq!(loaded.len(), 3);

    let names = |items: Vec<&ShoppingItem>| -> Vec<String> {
        items.into_iter().map(|item| item.name.clone()).collect()
    };

    let by_name: SortSpec = "name.desc".parse().unwrap();
    assert_eq!(
        names(store.items.view(&list.id, "", by_name)),
        ["Cherry", "Banana", "apple"]
    );

    let by_name: SortSpec = "name.asc".parse().unwrap();
    assert_eq!(names(store.items.view(&list.id, "AN", by_name)), ["Banana"]);

    let by_category: SortSpec = "category.asc".parse().unwrap();
    assert_eq!(
        names(store.items.view(&list.id, "", by_category))[0],
        "Cherry"
    );

    assert!(store.items.view(&list.id, "kiwi", SortSpec::default()).is_empty());
}

#[tokio::test]
async fn deleting_an_item_removes_it_everywhere() {
    let mut client = test_client().await;
    let alice = sign_in(&mut client.store, "alice@example.com", "pw").await;
    let store = &mut client.store;
    let list = store
        .lists
        .create_list(&alice.id, "Groceries", ListMeta::default())
        .await
        .unwrap();
    let item = store.items.add_item(&list.id, milk(1.0)).await.unwrap();

    store.items.delete_item(&list.id, &item.id).await.unwrap();
    assert!(store.items.select_item(&list.id, &item.id).is_none());

    let err = client.backend.api.get::<ShoppingItem>(ITEMS, &item.id).await.unwrap_err();
    assert!(err.is_not_found());

    let count = client.store.items.fetch_all().await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn items_cannot_be_changed_through_another_list() {
    let mut client = test_client().await;
    let alice = sign_in(&mut client.store, "alice@example.com", "pw").await;
    let store = &mut client.store;

    let mine = store
        .lists
        .create_list(&alice.id, "Groceries", ListMeta::default())
        .await
        .unwrap();
    let theirs = store
        .lists
        .create_list("bob", "Bob's list", ListMeta::default())
        .await
        .unwrap();
    let eggs = NewItem {
        name: "Eggs".to_string(),
        quantity: 6.0,
        ..NewItem::default()
    };
    let eggs = store.items.add_item(&theirs.id, eggs).await.unwrap();
    // Only the caller's own list is cached, as when the CLI loads one list
    store.items.forget_list(&theirs.id);

    let err = store
        .items
        .toggle_purchased(&mine.id, &eggs.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));

    let rename = ItemChanges {
        name: Some("Renamed".to_string()),
        ..ItemChanges::default()
    };
    let err = store
        .items
        .update_item(&mine.id, &eggs.id, rename)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    assert_eq!(store.items.state().status(), SliceStatus::Failed);

    let err = store.items.delete_item(&mine.id, &eggs.id).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));

    let stored: ShoppingItem = client.backend.api.get(ITEMS, &eggs.id).await.unwrap();
    assert_eq!(stored, eggs);
}

#[tokio::test]
async fn failed_item_delete_keeps_the_list() {
    let mut client = test_client().await;
    let alice = sign_in(&mut client.store, "alice@example.com", "pw").await;
    let list = client
        .store
        .lists
        .create_list(&alice.id, "Groceries", ListMeta::default())
        .await
        .unwrap();
    client.store.items.add_item(&list.id, milk(1.0)).await.unwrap();

    // The store cannot route a DELETE for an id containing a slash, so this one fails
    let _: ShoppingItem = client
        .backend
        .api
        .create(
            ITEMS,
            &json!({
                "id": "stuck/item",
                "listId": list.id,
                "name": "Stuck",
                "quantity": 1,
                "purchased": false,
                "createdAt": 1
            }),
        )
        .await
        .unwrap();

    let err = client.store.delete_list(&list.id).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(client.store.lists.state().status(), SliceStatus::Failed);
    assert!(client.store.lists.select_by_id(&list.id).is_some());

    let kept: ShoppingList = client.backend.api.get(LISTS, &list.id).await.unwrap();
    assert_eq!(kept.id, list.id);

    // The other item was still removed
    let left: Vec<ShoppingItem> = client
        .backend
        .api
        .list(ITEMS, &[("listId", list.id.as_str())])
        .await
        .unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, "stuck/item");
}
