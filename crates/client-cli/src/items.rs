//! Items grouped by list

use shared::view::{filter_and_sort, SortSpec};
use shared::{clamp_quantity, normalize_required, ItemChanges, ItemPatch, NewItem, ShoppingItem};
use std::collections::HashMap;

use crate::api::{new_id, now_millis, ApiClient, ITEMS};
use crate::error::ClientError;
use crate::slice::SliceState;

const ITEM_ID_LEN: usize = 8;

pub struct ItemSlice {
    api: ApiClient,
    by_list: HashMap<String, Vec<ShoppingItem>>,
    state: SliceState,
}

fn item_not_found(list_id: &str, item_id: &str) -> ClientError {
    ClientError::NotFound(format!("Item {} on list {}", item_id, list_id))
}

impl ItemSlice {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            by_list: HashMap::new(),
            state: SliceState::default(),
        }
    }

    pub fn state(&self) -> &SliceState {
        &self.state
    }

    // ========================================================================
    // Selectors
    // ========================================================================

    /// Cached items of one list, in the order the store returned them
    pub fn select_by_list(&self, list_id: &str) -> &[ShoppingItem] {
        self.by_list.get(list_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn select_item(&self, list_id: &str, item_id: &str) -> Option<&ShoppingItem> {
        self.select_by_list(list_id).iter().find(|item| item.id == item_id)
    }

    /// Filtered, sorted view of a list; the cache itself is left untouched
    pub fn view(&self, list_id: &str, term: &str, spec: SortSpec) -> Vec<&ShoppingItem> {
        filter_and_sort(self.select_by_list(list_id), term, spec)
    }

    /// Drop a list's items from the cache after the list itself is gone
    pub fn forget_list(&mut self, list_id: &str) {
        self.by_list.remove(list_id);
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load every item once and group by list
    pub async fn fetch_all(&mut self) -> Result<usize, ClientError> {
        self.state.begin();
        let result = self.api.list::<ShoppingItem>(ITEMS, &[]).await;
        let items = self.state.settle(result, "Failed to load items")?;

        let count = items.len();
        self.by_list.clear();
        for item in items {
            self.by_list.entry(item.list_id.clone()).or_default().push(item);
        }
        Ok(count)
    }

    /// Load (or reload) one list's items
    pub async fn fetch_by_list(&mut self, list_id: &str) -> Result<&[ShoppingItem], ClientError> {
        self.state.begin();
        let result = self
            .api
            .list::<ShoppingItem>(ITEMS, &[("listId", list_id)])
            .await;
        let items = self.state.settle(result, "Failed to load items")?;

        self.by_list.insert(list_id.to_string(), items);
        Ok(self.select_by_list(list_id))
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn add_item(&mut self, list_id: &str, new_item: NewItem) -> Result<ShoppingItem, ClientError> {
        let name = normalize_required(&new_item.name, "Item name")?;

        let item = ShoppingItem {
            id: new_id(ITEM_ID_LEN),
            list_id: list_id.to_string(),
            name,
            quantity: clamp_quantity(new_item.quantity),
            purchased: false,
            category: new_item.category,
            notes: new_item.notes,
            images: new_item.images,
            created_at: now_millis(),
        };

        self.state.begin();
        let result = self.api.create::<_, ShoppingItem>(ITEMS, &item).await;
        let created = self.state.settle(result, "Failed to add item")?;

        self.by_list
            .entry(created.list_id.clone())
            .or_default()
            .push(created.clone());
        tracing::debug!("Added {} x{} to list {}", created.name, created.quantity, list_id);
        Ok(created)
    }

    /// Merge edits onto an item; quantity is re-clamped to at least one
    pub async fn update_item(
        &mut self,
        list_id: &str,
        item_id: &str,
        changes: ItemChanges,
    ) -> Result<ShoppingItem, ClientError> {
        let patch = changes.into_patch()?;
        if patch.is_empty() {
            return self
                .select_item(list_id, item_id)
                .cloned()
                .ok_or_else(|| item_not_found(list_id, item_id));
        }

        self.ensure_on_list(list_id, item_id, "Failed to update item").await?;
        self.send_patch(list_id, item_id, &patch, "Failed to update item").await
    }

    /// Flip `purchased` by reading the stored value and writing its negation.
    ///
    /// The read and the write are separate requests with no version check, so
    /// two clients toggling at once both write and the last one wins.
    pub async fn toggle_purchased(&mut self, list_id: &str, item_id: &str) -> Result<ShoppingItem, ClientError> {
        self.state.begin();
        let result = self.fetch_on_list(list_id, item_id).await;
        let current = self.state.settle(result, "Failed to toggle item")?;

        let patch = ItemPatch {
            purchased: Some(!current.purchased),
            ..ItemPatch::default()
        };
        self.send_patch(list_id, item_id, &patch, "Failed to toggle item").await
    }

    pub async fn increment(&mut self, list_id: &str, item_id: &str) -> Result<ShoppingItem, ClientError> {
        let quantity = self.cached_quantity(list_id, item_id)?;
        self.set_quantity(list_id, item_id, f64::from(quantity) + 1.0).await
    }

    /// Never goes below one
    pub async fn decrement(&mut self, list_id: &str, item_id: &str) -> Result<ShoppingItem, ClientError> {
        let quantity = self.cached_quantity(list_id, item_id)?;
        self.set_quantity(list_id, item_id, f64::from(quantity) - 1.0).await
    }

    pub async fn set_quantity(&mut self, list_id: &str, item_id: &str, quantity: f64) -> Result<ShoppingItem, ClientError> {
        let changes = ItemChanges {
            quantity: Some(quantity),
            ..ItemChanges::default()
        };
        self.update_item(list_id, item_id, changes).await
    }

    pub async fn delete_item(&mut self, list_id: &str, item_id: &str) -> Result<(), ClientError> {
        self.ensure_on_list(list_id, item_id, "Failed to delete item").await?;

        self.state.begin();
        let result = self.api.delete(ITEMS, item_id).await;
        self.state.settle(result, "Failed to delete item")?;

        if let Some(items) = self.by_list.get_mut(list_id) {
            items.retain(|item| item.id != item_id);
        }
        Ok(())
    }

    /// Load an item, failing unless it sits on `list_id`
    async fn fetch_on_list(&self, list_id: &str, item_id: &str) -> Result<ShoppingItem, ClientError> {
        let item = match self.api.get::<ShoppingItem>(ITEMS, item_id).await {
            Ok(item) => item,
            Err(e) if e.is_not_found() => return Err(item_not_found(list_id, item_id)),
            Err(e) => return Err(e),
        };
        if item.list_id != list_id {
            tracing::warn!("Item {} belongs to list {}, not {}", item_id, item.list_id, list_id);
            return Err(item_not_found(list_id, item_id));
        }
        Ok(item)
    }

    /// Items cached under `list_id` are trusted; anything else is checked remotely
    async fn ensure_on_list(&mut self, list_id: &str, item_id: &str, context: &str) -> Result<(), ClientError> {
        if self.select_item(list_id, item_id).is_some() {
            return Ok(());
        }

        self.state.begin();
        let result = self.fetch_on_list(list_id, item_id).await.map(|_| ());
        self.state.settle(result, context)
    }

    fn cached_quantity(&self, list_id: &str, item_id: &str) -> Result<u32, ClientError> {
        self.select_item(list_id, item_id)
            .map(|item| item.quantity)
            .ok_or_else(|| item_not_found(list_id, item_id))
    }

    async fn send_patch(
        &mut self,
        list_id: &str,
        item_id: &str,
        patch: &ItemPatch,
        context: &str,
    ) -> Result<ShoppingItem, ClientError> {
        self.state.begin();
        let result = self.api.patch::<_, ShoppingItem>(ITEMS, item_id, patch).await;
        let updated = self.state.settle(result, context)?;

        if let Some(cached) = self
            .by_list
            .get_mut(list_id)
            .and_then(|items| items.iter_mut().find(|item| item.id == item_id))
        {
            *cached = updated.clone();
        }
        Ok(updated)
    }
}
