mod common;

use basket::share::load_shared;
use basket::ClientError;
use common::{sign_in, spawn_backend, test_client};
use shared::routes::{Navigation, Route};
use shared::{ListMeta, NewItem};

#[tokio::test]
async fn share_code_is_generated_once() {
    let mut client = test_client().await;
    let alice = sign_in(&mut client.store, "alice@example.com", "pw").await;
    let list = client
        .store
        .lists
        .create_list(&alice.id, "Groceries", ListMeta::default())
        .await
        .unwrap();

    let first = client.store.lists.ensure_share_code(&list.id).await.unwrap();
    assert_eq!(first.len(), 16);
    assert!(first.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));

    let second = client.store.lists.ensure_share_code(&list.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        client.store.lists.select_by_id(&list.id).unwrap().share_code.as_deref(),
        Some(first.as_str())
    );
}

#[tokio::test]
async fn shared_view_needs_a_share_code_but_no_session() {
    let mut client = test_client().await;
    let alice = sign_in(&mut client.store, "alice@example.com", "pw").await;
    let list = client
        .store
        .lists
        .create_list(&alice.id, "Groceries", ListMeta::default())
        .await
        .unwrap();
    for (name, quantity) in [("Milk", 2.0), ("Eggs", 12.0)] {
        let item = NewItem {
            name: name.to_string(),
            quantity,
            ..NewItem::default()
        };
        client.store.items.add_item(&list.id, item).await.unwrap();
    }

    let err = load_shared(&client.backend.api, &list.id).await.unwrap_err();
    assert!(matches!(err, ClientError::NotShared(_)));

    client.store.lists.ensure_share_code(&list.id).await.unwrap();
    client.store.auth.logout(&mut client.store.session).unwrap();

    // The share route renders for anonymous visitors
    let route = Route::Share(list.id.clone());
    assert_eq!(client.store.navigate(route.clone()), Navigation::Render(route));

    let shared = load_shared(&client.backend.api, &list.id).await.unwrap();
    assert_eq!(shared.list.title, "Groceries");
    assert_eq!(shared.items.len(), 2);
    assert_eq!(shared.total_quantity, 14);
}

#[tokio::test]
async fn unknown_list_is_not_found() {
    let backend = spawn_backend().await;

    let err = load_shared(&backend.api, "nope1234").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}
