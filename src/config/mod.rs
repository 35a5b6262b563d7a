pub mod credentials;

use crate::core::error::MemchatError;
use crate::store::DEFAULT_MEMORY_TAIL_CHARS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use credentials::{Credentials, load_env_files};

pub const BACKEND_ENV: &str = "MEMCHAT_BACKEND";

/// Completion services that speak the chat-completions wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Nvidia,
    OpenRouter,
}

impl Backend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "nvidia" => Some(Backend::Nvidia),
            "openrouter" => Some(Backend::OpenRouter),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Nvidia => "nvidia",
            Backend::OpenRouter => "openrouter",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Backend::Nvidia => "https://integrate.api.nvidia.com/v1",
            Backend::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    /// Primary and fallback API key variables, in lookup order.
    pub fn key_vars(&self) -> [&'static str; 2] {
        match self {
            Backend::Nvidia => ["NVIDIA_API_KEY", "OPENAI_API_KEY"],
            Backend::OpenRouter => ["OPENROUTER_API_KEY", "OPENAI_API_KEY"],
        }
    }

    pub fn model_var(&self) -> &'static str {
        match self {
            Backend::Nvidia => "NVIDIA_MODEL",
            Backend::OpenRouter => "OPENROUTER_MODEL",
        }
    }

    pub fn default_models(&self) -> Vec<String> {
        let models: &[&str] = match self {
            Backend::Nvidia => &["nvidia/nemotron-3-8b-instruct"],
            Backend::OpenRouter => &[
                "meta-llama/llama-3.1-8b-instruct",
                "mistralai/mistral-7b-instruct",
            ],
        };
        models.iter().map(|m| m.to_string()).collect()
    }

    pub fn example_models(&self) -> &'static str {
        match self {
            Backend::Nvidia => {
                "NVIDIA_MODEL=meta/llama-3.1-8b-instruct or NVIDIA_MODEL=nvidia/nemotron-3-8b-instruct"
            }
            Backend::OpenRouter => {
                "OPENROUTER_MODEL=meta-llama/llama-3.1-8b-instruct or OPENROUTER_MODEL=openai/gpt-4o-mini"
            }
        }
    }
}

fn default_memory_tail_chars() -> usize {
    DEFAULT_MEMORY_TAIL_CHARS
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_features_dir() -> PathBuf {
    PathBuf::from("features")
}

/// Settings read from `~/.memchat/config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: Option<Backend>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_features_dir")]
    pub features_dir: PathBuf,
    #[serde(default = "default_memory_tail_chars")]
    pub memory_tail_chars: usize,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: None,
            base_url: None,
            features_dir: default_features_dir(),
            memory_tail_chars: default_memory_tail_chars(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".memchat")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    pub fn env_path() -> PathBuf {
        Self::config_dir().join(".env")
    }

    pub fn load() -> Result<Config, MemchatError> {
        Self::load_from(&Self::config_path())
    }

    /// Reads settings from `path`; writes defaults there when it does not exist.
    pub fn load_from(path: &Path) -> Result<Config, MemchatError> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config = serde_yml::from_str::<Config>(&contents)
                .map_err(|e| MemchatError::Config(format!("Parse {}: {}", path.display(), e)))?;
            debug!(path = %path.display(), "Loaded settings");
            return Ok(config);
        }

        let config = Config::default();
        if let Err(e) = config.save_to(path) {
            warn!(path = %path.display(), error = %e, "Could not write default settings");
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), MemchatError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let yaml_content = serde_yml::to_string(self)?;
        fs::write(path, yaml_content)?;
        Ok(())
    }

    /// Picks the backend: explicit choice, then `MEMCHAT_BACKEND`, then the settings file.
    pub fn resolve_backend(
        &self,
        explicit: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Backend, MemchatError> {
        let requested = explicit
            .map(str::to_string)
            .or_else(|| lookup(BACKEND_ENV).filter(|v| !v.trim().is_empty()));
        match requested {
            Some(name) => Backend::from_str(&name).ok_or_else(|| {
                MemchatError::Config(format!(
                    "Unknown backend '{}'. Expected 'nvidia' or 'openrouter'.",
                    name.trim()
                ))
            }),
            None => Ok(self.backend.unwrap_or_default()),
        }
    }

    pub fn base_url(&self, backend: Backend) -> String {
        self.base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| backend.default_base_url().to_string())
    }
}
