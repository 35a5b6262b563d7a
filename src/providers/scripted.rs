use super::CompletionBackend;
use crate::core::error::MemchatError;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Answers from a fixed script and records what it was asked.
pub struct ScriptedBackend {
    pub models: Vec<String>,
    pub calls: Mutex<Vec<(String, usize)>>,
    fail_with: Option<u16>,
    delay: Option<Duration>,
    hang: bool,
}

impl ScriptedBackend {
    pub fn ok() -> Self {
        Self {
            models: vec!["m0".to_string(), "m1".to_string()],
            calls: Mutex::new(Vec::new()),
            fail_with: None,
            delay: None,
            hang: false,
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::ok()
        }
    }

    /// Answers only after `delay`.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::ok()
        }
    }

    /// Never answers.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::ok()
        }
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    fn models(&self) -> &[String] {
        &self.models
    }

    async fn complete(&self, query: &str, model_index: usize) -> Result<String, MemchatError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), model_index));
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail_with {
            Some(status) => Err(MemchatError::Api(format!("HTTP {}: denied", status))),
            None => Ok(format!("# Answer to {}", query)),
        }
    }
}
