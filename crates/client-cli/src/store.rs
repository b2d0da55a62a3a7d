use shared::routes::{Navigation, Route};

use crate::api::ApiClient;
use crate::auth::AuthSlice;
use crate::error::ClientError;
use crate::items::ItemSlice;
use crate::lists::ListSlice;
use crate::session::SessionContext;
use crate::storage::LocalStore;

/// All client state in one place: the session plus one slice per entity
pub struct Store {
    pub api: ApiClient,
    pub session: SessionContext,
    pub auth: AuthSlice,
    pub lists: ListSlice,
    pub items: ItemSlice,
}

impl Store {
    pub fn new(api: ApiClient, local: LocalStore) -> Self {
        Self {
            session: SessionContext::load(local.clone()),
            auth: AuthSlice::new(api.clone()),
            lists: ListSlice::new(api.clone()).with_local_store(local),
            items: ItemSlice::new(api.clone()),
            api,
        }
    }

    pub fn navigate(&self, route: Route) -> Navigation {
        self.session.guard(route)
    }

    /// Cascade-delete a list remotely, then drop it from both caches
    pub async fn delete_list(&mut self, list_id: &str) -> Result<(), ClientError> {
        self.lists.delete_list(list_id).await?;
        self.items.forget_list(list_id);
        Ok(())
    }
}
