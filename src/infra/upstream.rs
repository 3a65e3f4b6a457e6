//! HTTP adapter for the remote posts endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::{
    application::repos::{PostSource, SourceError},
    config::UpstreamSettings,
    domain::posts::{Post, PostList},
    infra::error::InfraError,
};

const POSTS_PATH: &str = "posts";

#[derive(Clone, Debug)]
pub struct HttpPostSource {
    client: Client,
    endpoint: Url,
}

impl HttpPostSource {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, InfraError> {
        let endpoint = posts_endpoint(base_url)?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self { client, endpoint })
    }

    pub fn from_settings(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        Self::new(&settings.base_url, settings.timeout)
    }

    pub fn user_agent() -> &'static str {
        concat!("postboard/", env!("CARGO_PKG_VERSION"))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Endpoint URL carrying `query` verbatim; an empty query leaves no `?`.
    pub fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        let query = query.strip_prefix('?').unwrap_or(query);
        url.set_query((!query.is_empty()).then_some(query));
        url
    }
}

/// Resolve `{base}/posts`, keeping any path prefix on the base URL.
fn posts_endpoint(base_url: &Url) -> Result<Url, InfraError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.set_query(None);
    base.join(POSTS_PATH)
        .map_err(|err| InfraError::configuration(format!("invalid upstream base URL: {err}")))
}

#[async_trait]
impl PostSource for HttpPostSource {
    async fn fetch_posts(&self, query: &str) -> Result<Vec<Post>, SourceError> {
        let url = self.request_url(query);
        debug!(target = "postboard::upstream", url = %url, "fetching posts");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| SourceError::transport(url.as_str(), err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| SourceError::transport(url.as_str(), err))?;
        let list: PostList = serde_json::from_slice(&bytes)
            .map_err(|err| SourceError::decode(url.as_str(), err))?;
        Ok(list.posts)
    }
}
