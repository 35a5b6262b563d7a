use super::{Backend, Config};
use crate::core::error::MemchatError;
use std::fmt;
use tracing::{debug, info};

/// API key and candidate models, resolved once at startup.
#[derive(Clone)]
pub struct Credentials {
    pub backend: Backend,
    api_key: String,
    pub models: Vec<String>,
}

/// Loads `~/.memchat/.env`, then `./.env`. Variables already set are kept.
pub fn load_env_files() {
    let env_path = Config::env_path();
    if dotenvy::from_path(&env_path).is_ok() {
        debug!(path = %env_path.display(), "Loaded .env");
    }
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "Loaded .env");
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("backend", &self.backend)
            .field("api_key", &"<redacted>")
            .field("models", &self.models)
            .finish()
    }
}

impl Credentials {
    /// Resolves from the process environment; call [`load_env_files`] first.
    pub fn from_env(backend: Backend) -> Result<Self, MemchatError> {
        Self::resolve(backend, |name| std::env::var(name).ok())
    }

    /// Resolves credentials through `lookup`, a variable-name to value function.
    pub fn resolve(
        backend: Backend,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, MemchatError> {
        let [primary, fallback] = backend.key_vars();
        let api_key = [primary, fallback]
            .into_iter()
            .find_map(|name| {
                lookup(name)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .map(|v| (name, v))
            })
            .map(|(name, key)| {
                info!(backend = backend.name(), variable = name, "Resolved API key");
                key
            })
            .ok_or_else(|| {
                MemchatError::Config(format!(
                    "No API key found. Set {} (or {}) in the environment or in {}.",
                    primary,
                    fallback,
                    Config::env_path().display()
                ))
            })?;

        let models = match lookup(backend.model_var()) {
            Some(model) if !model.trim().is_empty() => vec![model.trim().to_string()],
            _ => backend.default_models(),
        };

        Ok(Self {
            backend,
            api_key,
            models,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}
