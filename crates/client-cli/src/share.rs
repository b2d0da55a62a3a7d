//! Read-only public view of a shared list. Needs no session.

use shared::view::total_quantity;
use shared::{ShoppingItem, ShoppingList};

use crate::api::{ApiClient, ITEMS, LISTS};
use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct SharedList {
    pub list: ShoppingList,
    pub items: Vec<ShoppingItem>,
    pub total_quantity: u64,
}

/// Load a list for `/share/:listId`. Lists that were never given a share code
/// are reported as not shared rather than exposed.
pub async fn load_shared(api: &ApiClient, list_id: &str) -> Result<SharedList, ClientError> {
    let list: ShoppingList = api.get(LISTS, list_id).await.map_err(|e| {
        if e.is_not_found() {
            ClientError::NotFound(format!("List {}", list_id))
        } else {
            e
        }
    })?;

    if list.share_code.as_deref().map_or(true, str::is_empty) {
        return Err(ClientError::NotShared(list_id.to_string()));
    }

    let items: Vec<ShoppingItem> = api.list(ITEMS, &[("listId", list_id)]).await?;
    let total_quantity = total_quantity(&items);

    Ok(SharedList {
        list,
        items,
        total_quantity,
    })
}
