//! Shared HTTP client for page scraping and transcript downloads.

mod user_agent;

pub use user_agent::{resolve_user_agent, IMPERSONATE_USER_AGENTS, USER_AGENT};

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::debug;

/// Thin wrapper over a configured [`reqwest::Client`].
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client with a request timeout and user agent configuration.
    /// - None: the crate's own user agent
    /// - Some("impersonate"): a real browser user agent
    /// - Some(custom): custom user agent string
    pub fn new(timeout: Duration, user_agent_config: Option<&str>) -> Result<Self, reqwest::Error> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }

    /// Plain GET. Non-success statuses are returned, not turned into errors.
    pub async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        debug!(url, "GET");
        self.client.get(url).send().await
    }
}
