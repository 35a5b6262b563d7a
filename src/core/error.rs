use std::io;
use thiserror::Error;

/// Unified error type for memchat
#[derive(Error, Debug)]
pub enum MemchatError {
    /// Missing or unusable startup configuration (fatal)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A completion request failed; the message is already user-presentable
    #[error("{0}")]
    Api(String),

    /// Completion endpoint answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Transport-level failures
    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// User input errors
    #[error("Input error: {0}")]
    Input(String),
}

impl MemchatError {
    /// HTTP status carried by the error, if the endpoint produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            MemchatError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for MemchatError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            MemchatError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else if err.is_timeout() {
            MemchatError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            MemchatError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            MemchatError::Serialization(format!("Invalid response body: {}", err))
        } else {
            MemchatError::Network(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for MemchatError {
    fn from(err: serde_json::Error) -> Self {
        MemchatError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for MemchatError {
    fn from(err: serde_yml::Error) -> Self {
        MemchatError::Serialization(format!("YAML error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_status_and_body() {
        let err = MemchatError::Http {
            status: 404,
            body: "model not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: model not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn api_error_is_displayed_verbatim() {
        let err = MemchatError::Api("HTTP 401: nope\nHint: check key".to_string());
        assert_eq!(err.to_string(), "HTTP 401: nope\nHint: check key");
        assert_eq!(err.status(), None);
    }
}
