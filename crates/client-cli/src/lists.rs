//! Shopping lists owned by the current user, cached by id

use futures::future::join_all;
use shared::{normalize_required, ListMeta, ListPatch, ShoppingItem, ShoppingList};
use std::collections::HashMap;

use crate::api::{new_id, now_millis, ApiClient, ITEMS, LISTS};
use crate::error::ClientError;
use crate::slice::SliceState;
use crate::storage::{list_meta_key, LocalStore};

const LIST_ID_LEN: usize = 8;
const SHARE_CODE_LEN: usize = 16;

pub struct ListSlice {
    api: ApiClient,
    entities: HashMap<String, ShoppingList>,
    state: SliceState,
    local: Option<LocalStore>,
}

impl ListSlice {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            entities: HashMap::new(),
            state: SliceState::default(),
            local: None,
        }
    }

    /// Also cache each list's descriptive fields on disk
    pub fn with_local_store(mut self, local: LocalStore) -> Self {
        self.local = Some(local);
        self
    }

    pub fn state(&self) -> &SliceState {
        &self.state
    }

    // ========================================================================
    // Selectors
    // ========================================================================

    pub fn select_by_id(&self, list_id: &str) -> Option<&ShoppingList> {
        self.entities.get(list_id)
    }

    /// Lists owned by `user_id`, oldest first
    pub fn select_by_user(&self, user_id: &str) -> Vec<&ShoppingList> {
        let mut lists: Vec<&ShoppingList> = self
            .entities
            .values()
            .filter(|list| list.user_id == user_id)
            .collect();
        lists.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        lists
    }

    /// Descriptive fields last saved locally for a list
    pub fn cached_meta(&self, list_id: &str) -> Option<ListMeta> {
        self.local.as_ref()?.get(&list_meta_key(list_id))
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Fetch every list the user owns, replacing the cache
    pub async fn fetch_for_user(&mut self, user_id: &str) -> Result<Vec<ShoppingList>, ClientError> {
        self.state.begin();
        let result = self
            .api
            .list::<ShoppingList>(LISTS, &[("userId", user_id)])
            .await;
        let lists = self.state.settle(result, "Failed to load lists")?;

        self.entities = lists
            .iter()
            .map(|list| (list.id.clone(), list.clone()))
            .collect();
        tracing::debug!("Loaded {} lists for user {}", lists.len(), user_id);
        Ok(lists)
    }

    /// Create a list. Blank titles are rejected before any request is made.
    pub async fn create_list(
        &mut self,
        user_id: &str,
        title: &str,
        meta: ListMeta,
    ) -> Result<ShoppingList, ClientError> {
        let title = normalize_required(title, "List title")?;

        let list = ShoppingList {
            id: new_id(LIST_ID_LEN),
            user_id: user_id.to_string(),
            title,
            created_at: now_millis(),
            category: meta.category.clone(),
            notes: meta.notes.clone(),
            image_url: meta.image_url.clone(),
            share_code: None,
        };

        self.state.begin();
        let result = self.api.create::<_, ShoppingList>(LISTS, &list).await;
        let created = self.state.settle(result, "Failed to create list")?;

        if !meta.is_empty() {
            self.remember_meta(&created.id, &meta);
        }
        self.entities.insert(created.id.clone(), created.clone());
        tracing::info!("Created list {} ({})", created.title, created.id);
        Ok(created)
    }

    pub async fn rename_list(&mut self, list_id: &str, title: &str) -> Result<ShoppingList, ClientError> {
        let title = normalize_required(title, "List title")?;
        let patch = ListPatch {
            title: Some(title),
            ..ListPatch::default()
        };
        self.patch_list(list_id, &patch, "Failed to rename list").await
    }

    /// Update category, notes or image. Nothing set means nothing sent.
    pub async fn update_list_meta(&mut self, list_id: &str, meta: ListMeta) -> Result<ShoppingList, ClientError> {
        if meta.is_empty() {
            return self
                .entities
                .get(list_id)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(format!("List {}", list_id)));
        }

        let updated = self
            .patch_list(list_id, &ListPatch::from(meta.clone()), "Failed to update list")
            .await?;

        let merged = ListMeta {
            category: updated.category.clone(),
            notes: updated.notes.clone(),
            image_url: updated.image_url.clone(),
        };
        self.remember_meta(list_id, &merged);
        Ok(updated)
    }

    /// The cache only changes once the store has accepted the patch
    async fn patch_list(&mut self, list_id: &str, patch: &ListPatch, context: &str) -> Result<ShoppingList, ClientError> {
        self.state.begin();
        let result = self.api.patch::<_, ShoppingList>(LISTS, list_id, patch).await;
        let updated = self.state.settle(result, context)?;

        self.entities.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }

    /// Delete a list and every item on it.
    ///
    /// Item deletes run concurrently and must all settle before the list
    /// itself is removed; if any of them fails the list stays, so no item is
    /// ever left pointing at a missing list.
    pub async fn delete_list(&mut self, list_id: &str) -> Result<(), ClientError> {
        self.state.begin();
        let result = self.cascade_delete(list_id).await;
        self.state.settle(result, "Failed to delete list")?;

        self.entities.remove(list_id);
        if let Some(local) = &self.local {
            if let Err(e) = local.remove(&list_meta_key(list_id)) {
                tracing::warn!("Could not drop cached metadata for list {}: {}", list_id, e);
            }
        }
        Ok(())
    }

    async fn cascade_delete(&self, list_id: &str) -> Result<(), ClientError> {
        let items: Vec<ShoppingItem> = self.api.list(ITEMS, &[("listId", list_id)]).await?;

        let results = join_all(items.iter().map(|item| self.api.delete(ITEMS, &item.id))).await;
        if let Some(err) = results.into_iter().find_map(Result::err) {
            return Err(err);
        }

        self.api.delete(LISTS, list_id).await?;
        tracing::info!("Deleted list {} and {} items", list_id, items.len());
        Ok(())
    }

    /// Return the list's share code, creating one only if it has none.
    /// Existing codes are never replaced, so public links stay valid.
    pub async fn ensure_share_code(&mut self, list_id: &str) -> Result<String, ClientError> {
        self.state.begin();
        let result = self.load_or_assign_share_code(list_id).await;
        let list = self.state.settle(result, "Failed to share list")?;

        let code = list.share_code.clone().unwrap_or_default();
        self.entities.insert(list.id.clone(), list);
        Ok(code)
    }

    async fn load_or_assign_share_code(&self, list_id: &str) -> Result<ShoppingList, ClientError> {
        let list: ShoppingList = self.api.get(LISTS, list_id).await?;
        if list.share_code.as_deref().is_some_and(|code| !code.is_empty()) {
            return Ok(list);
        }

        let patch = ListPatch {
            share_code: Some(new_id(SHARE_CODE_LEN)),
            ..ListPatch::default()
        };
        let shared: ShoppingList = self.api.patch(LISTS, list_id, &patch).await?;
        tracing::info!("Generated share code for list {}", list_id);
        Ok(shared)
    }

    fn remember_meta(&self, list_id: &str, meta: &ListMeta) {
        if let Some(local) = &self.local {
            if let Err(e) = local.set(&list_meta_key(list_id), meta) {
                tracing::warn!("Could not cache metadata for list {}: {}", list_id, e);
            }
        }
    }
}
