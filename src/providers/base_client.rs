use crate::core::error::MemchatError;
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;

/// Thin JSON-over-HTTPS client with bearer authentication.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self, MemchatError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POSTs `payload` to `path`; non-2xx statuses become [`MemchatError::Http`].
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Response, MemchatError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "Completion endpoint answered");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemchatError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}
