use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::{Error, Result};
use crate::models::{Category, ItemDetails, ItemDraft, ItemType};

/// The dashboard's view of the remote item API.
///
/// Connection-level failures surface as [`Error::Transport`]; an error
/// response the server produced on purpose surfaces as [`Error::Api`].
#[async_trait]
pub trait ItemApiClient: Send + Sync {
    async fn list_items(&self) -> Result<Vec<ItemDetails>>;
    async fn create_item(&self, draft: &ItemDraft) -> Result<ItemDetails>;
    async fn update_item(&self, id: i32, draft: &ItemDraft) -> Result<Option<ItemDetails>>;
    async fn delete_item(&self, id: i32) -> Result<bool>;
    async fn list_types(&self) -> Result<Vec<ItemType>>;
    async fn list_categories(&self, type_id: Option<i32>) -> Result<Vec<Category>>;
}

pub mod cached;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the item API.
pub struct HttpItemClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpItemClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Turn a non-success response into the server's own error message when
    /// it sent one.
    async fn api_error(response: reqwest::Response) -> Error {
        let status = response.status();
        if let Ok(bytes) = response.bytes().await {
            if let Ok(body) = serde_json::from_slice::<ErrorBody>(&bytes) {
                return Error::Api(body.error);
            }
        }
        Error::Api(format!("server returned {status}"))
    }
}

fn transport(err: reqwest::Error) -> Error {
    Error::Transport(err.to_string())
}

#[async_trait]
impl ItemApiClient for HttpItemClient {
    async fn list_items(&self) -> Result<Vec<ItemDetails>> {
        let response = self
            .http
            .get(self.url("/api/items"))
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Self::decode(response).await
    }

    async fn create_item(&self, draft: &ItemDraft) -> Result<ItemDetails> {
        let response = self
            .http
            .post(self.url("/api/items"))
            .json(draft)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Self::decode(response).await
    }

    async fn update_item(&self, id: i32, draft: &ItemDraft) -> Result<Option<ItemDetails>> {
        let response = self
            .http
            .put(self.url(&format!("/api/items/{id}")))
            .json(draft)
            .send()
            .await
            .map_err(transport)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(Some(Self::decode(response).await?))
    }

    async fn delete_item(&self, id: i32) -> Result<bool> {
        let response = self
            .http
            .delete(self.url(&format!("/api/items/{id}")))
            .send()
            .await
            .map_err(transport)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(true)
    }

    async fn list_types(&self) -> Result<Vec<ItemType>> {
        let response = self
            .http
            .get(self.url("/api/types"))
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Self::decode(response).await
    }

    async fn list_categories(&self, type_id: Option<i32>) -> Result<Vec<Category>> {
        let url = match type_id {
            Some(type_id) => self.url(&format!("/api/categories?typeId={type_id}")),
            None => self.url("/api/categories"),
        };
        let response = self.http.get(url).send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = HttpItemClient::new("http://localhost:5000/");
        assert_eq!(client.url("/api/items"), "http://localhost:5000/api/items");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_failure() {
        // Nothing listens on this port; the send itself fails.
        let client = HttpItemClient::new("http://127.0.0.1:1");
        let err = client.list_items().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
