//! Thin typed wrapper over the resource store's REST collections

use rand::Rng;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::ClientError;

pub const USERS: &str = "users";
pub const LISTS: &str = "lists";
pub const ITEMS: &str = "items";

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection, id)
    }

    /// GET /:collection, narrowed by exact-match query filters
    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<T>, ClientError> {
        let resp = self
            .http
            .get(self.collection_url(collection))
            .query(filters)
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<T, ClientError> {
        let resp = self.http.get(self.record_url(collection, id)).send().await?;
        read_json(resp).await
    }

    pub async fn create<B, T>(&self, collection: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .post(self.collection_url(collection))
            .json(body)
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn patch<B, T>(&self, collection: &str, id: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .patch(self.record_url(collection, id))
            .json(body)
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), ClientError> {
        let resp = self.http.delete(self.record_url(collection, id)).send().await?;
        ensure_success(resp).await?;
        Ok(())
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let message = resp.text().await.unwrap_or_default();
    tracing::debug!("Store answered {}: {}", status, message);
    Err(ClientError::Remote {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let resp = ensure_success(resp).await?;
    Ok(resp.json().await?)
}

/// Random lowercase alphanumeric id, generated client-side before a POST
pub fn new_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(len)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

/// Milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_dropped_from_the_base_url() {
        let api = ApiClient::new("http://localhost:3000/");
        assert_eq!(api.base_url(), "http://localhost:3000");
        assert_eq!(api.record_url(ITEMS, "abc"), "http://localhost:3000/items/abc");
    }

    #[test]
    fn ids_have_the_requested_length() {
        let id = new_id(16);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_uppercase()));
        assert_ne!(new_id(16), id);
    }
}
