use super::{CompletionBackend, Message, clamp_model_index};
use crate::config::Backend;
use crate::config::Config;
use crate::core::error::MemchatError;
use crate::prompt::{self, SYSTEM_PROMPT};
use crate::providers::base_client::HttpClient;
use crate::store::Store;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

/// Chat-completions client that composes the prompt from the store on every call.
#[derive(Clone)]
pub struct OpenAICompatibleProvider {
    client: HttpClient,
    backend: Backend,
    models: Vec<String>,
    store: Store,
    options: RequestOptions,
}

impl OpenAICompatibleProvider {
    pub fn new(
        client: HttpClient,
        backend: Backend,
        models: Vec<String>,
        store: Store,
        options: RequestOptions,
    ) -> Self {
        Self {
            client,
            backend,
            models,
            store,
            options,
        }
    }

    async fn request(&self, model: &str, prompt: String) -> Result<String, MemchatError> {
        let payload = ChatCompletionRequest {
            model,
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)],
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        let response = self.client.post("chat/completions", &payload).await?;
        let response_body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&response_body)?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| MemchatError::Api("No choices in API response".to_string()))?;
        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }
}

#[async_trait]
impl CompletionBackend for OpenAICompatibleProvider {
    fn models(&self) -> &[String] {
        &self.models
    }

    async fn complete(&self, query: &str, model_index: usize) -> Result<String, MemchatError> {
        let personality = self.store.personality();
        let memory = self.store.memory_tail();
        let prompt = prompt::compose(query, &personality, &memory);

        let model = self
            .models
            .get(clamp_model_index(&self.models, model_index))
            .ok_or_else(|| MemchatError::Config("No models configured".to_string()))?;
        debug!(
            backend = self.backend.name(),
            model = %model,
            prompt_chars = prompt.chars().count(),
            "Sending completion request"
        );

        self.request(model, prompt).await.map_err(|e| {
            warn!(backend = self.backend.name(), error = %e, "Completion failed");
            MemchatError::Api(describe_failure(self.backend, &e))
        })
    }
}

/// Flattens a request failure into one message, with a hint for auth and model errors.
pub fn describe_failure(backend: Backend, err: &MemchatError) -> String {
    let mut message = err.to_string();
    let [key_var, _] = backend.key_vars();
    let env_path = Config::env_path();
    match err.status() {
        Some(401) => message.push_str(&format!(
            "\nHint: Authentication failed. Ensure your {} is valid, has access to the selected model, and is set in {}.",
            key_var,
            env_path.display()
        )),
        Some(404) => message.push_str(&format!(
            "\nHint: Set {} in {} to a valid model id, e.g. {}",
            backend.model_var(),
            env_path.display(),
            backend.example_models()
        )),
        _ => {}
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serves one canned HTTP response and hands back the request body.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut data = Vec::new();
            let mut buf = [0u8; 4096];
            let request_body = loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break String::new();
                }
                data.extend_from_slice(&buf[..n]);
                if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&data[..end]).to_lowercase();
                    let len = headers
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if data.len() >= end + 4 + len {
                        break String::from_utf8_lossy(&data[end + 4..end + 4 + len]).to_string();
                    }
                }
            };
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(request_body);
        });

        (format!("http://{}/v1", addr), rx)
    }

    fn provider(base_url: String, models: &[&str], store: Store) -> OpenAICompatibleProvider {
        let client = HttpClient::new(base_url, "test-key".to_string()).unwrap();
        OpenAICompatibleProvider::new(
            client,
            Backend::Nvidia,
            models.iter().map(|m| m.to_string()).collect(),
            store,
            RequestOptions::default(),
        )
    }

    #[tokio::test]
    async fn success_returns_trimmed_content_and_sends_expected_payload() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store.write(crate::store::Artifact::Personality, "Be brief.").unwrap();
        store.remember("User: earlier question").unwrap();

        let (url, request) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"  **Hi** there \n"}}]}"#,
        )
        .await;
        let provider = provider(url, &["model-a", "model-b"], store);

        let answer = provider.complete("Hello?", 1).await.unwrap();
        assert_eq!(answer, "**Hi** there");

        let sent: Value = serde_json::from_str(&request.await.unwrap()).unwrap();
        assert_eq!(sent["model"], "model-b");
        assert_eq!(sent["max_tokens"], 1000);
        assert!((sent["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(sent["messages"][0]["role"], "system");
        assert_eq!(sent["messages"][0]["content"], "You are a helpful assistant.");
        assert_eq!(sent["messages"][1]["role"], "user");
        let prompt = sent["messages"][1]["content"].as_str().unwrap();
        assert!(prompt.contains("Your Personality:\nBe brief."));
        assert!(prompt.contains("user earlier question "));
        assert!(prompt.contains("User Query:\nHello?"));
    }

    #[tokio::test]
    async fn bad_model_index_uses_first_model() {
        let dir = TempDir::new().unwrap();
        let (url, request) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"content":"ok"}}]}"#,
        )
        .await;
        let provider = provider(url, &["model-a", "model-b"], Store::new(dir.path()));

        assert_eq!(provider.complete("q", 7).await.unwrap(), "ok");
        let sent: Value = serde_json::from_str(&request.await.unwrap()).unwrap();
        assert_eq!(sent["model"], "model-a");
    }

    #[tokio::test]
    async fn unauthorized_includes_status_and_credential_hint() {
        let dir = TempDir::new().unwrap();
        let (url, _request) = serve_once("401 Unauthorized", r#"{"error":"invalid key"}"#).await;
        let provider = provider(url, &["model-a"], Store::new(dir.path()));

        let err = provider.complete("q", 0).await.unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, MemchatError::Api(_)));
        assert!(message.contains("401"));
        assert!(message.contains("invalid key"));
        assert!(message.contains("Authentication failed"));
        assert!(message.contains("NVIDIA_API_KEY"));
    }

    #[tokio::test]
    async fn not_found_includes_status_and_model_hint() {
        let dir = TempDir::new().unwrap();
        let (url, _request) = serve_once("404 Not Found", r#"{"error":"no such model"}"#).await;
        let provider = provider(url, &["model-a"], Store::new(dir.path()));

        let message = provider.complete("q", 0).await.unwrap_err().to_string();
        assert!(message.contains("404"));
        assert!(message.contains("Set NVIDIA_MODEL"));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let dir = TempDir::new().unwrap();
        let (url, _request) = serve_once("200 OK", r#"{"choices":[]}"#).await;
        let provider = provider(url, &["model-a"], Store::new(dir.path()));

        let message = provider.complete("q", 0).await.unwrap_err().to_string();
        assert!(message.contains("No choices"));
    }

    #[tokio::test]
    async fn connection_failure_is_reported_without_panicking() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let dir = TempDir::new().unwrap();
        let provider = provider(format!("http://{}/v1", addr), &["m"], Store::new(dir.path()));

        let err = provider.complete("q", 0).await.unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn hints_follow_backend_variable_names() {
        let err = MemchatError::Http {
            status: 404,
            body: "missing".to_string(),
        };
        let message = describe_failure(Backend::OpenRouter, &err);
        assert!(message.starts_with("HTTP 404: missing"));
        assert!(message.contains("OPENROUTER_MODEL"));

        let other = MemchatError::Http {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(describe_failure(Backend::Nvidia, &other), "HTTP 500: boom");
    }
}
