use super::CompletionBackend;
use super::base_client::HttpClient;
use super::openai_compatible::{OpenAICompatibleProvider, RequestOptions};
use crate::config::{Config, Credentials};
use crate::core::error::MemchatError;
use crate::store::Store;
use std::sync::Arc;
use tracing::info;

/// Builds the completion backend once at startup.
pub fn create_backend(
    config: &Config,
    credentials: &Credentials,
    store: Store,
) -> Result<Arc<dyn CompletionBackend>, MemchatError> {
    let base_url = config.base_url(credentials.backend);
    let client = HttpClient::new(base_url, credentials.api_key().to_string())?;
    let options = RequestOptions {
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };

    info!(
        backend = credentials.backend.name(),
        base_url = client.base_url(),
        models = ?credentials.models,
        "Completion backend ready"
    );

    Ok(Arc::new(OpenAICompatibleProvider::new(
        client,
        credentials.backend,
        credentials.models.clone(),
        store,
        options,
    )))
}
