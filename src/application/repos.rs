//! Source traits describing the remote data adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::posts::Post;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to `{url}` failed: {message}")]
    Transport { url: String, message: String },
    #[error("remote answered {status} for `{url}`")]
    Status { url: String, status: u16 },
    #[error("response from `{url}` could not be decoded: {message}")]
    Decode { url: String, message: String },
}

impl SourceError {
    pub fn transport(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: err.to_string(),
        }
    }

    pub fn decode(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            url: url.into(),
            message: err.to_string(),
        }
    }

    /// Short label used as a metrics dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Transport { .. } => "transport",
            SourceError::Status { .. } => "status",
            SourceError::Decode { .. } => "decode",
        }
    }
}

/// Fetches the full post list, forwarding the dashboard query string verbatim.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_posts(&self, query: &str) -> Result<Vec<Post>, SourceError>;
}
