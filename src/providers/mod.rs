pub mod base_client;
pub mod factory;
pub mod openai_compatible;
#[cfg(test)]
pub mod scripted;

use crate::core::error::MemchatError;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One-shot completion capability shared by every backend.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Candidate model ids, in selection order.
    fn models(&self) -> &[String];

    /// Answers `query` with the model at `model_index`, falling back to the
    /// first model when the index is out of range. The error, if any, carries a
    /// single user-presentable message.
    async fn complete(&self, query: &str, model_index: usize) -> Result<String, MemchatError>;
}

/// Index into `models`, or 0 when out of range.
pub fn clamp_model_index(models: &[String], model_index: usize) -> usize {
    if model_index < models.len() {
        model_index
    } else {
        0
    }
}
