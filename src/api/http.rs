use crate::error::GenerationError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!("agent-media/", env!("CARGO_PKG_VERSION"));

/// Status line and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The two calls the job client makes against the queue API.
#[async_trait]
pub trait JobTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<HttpReply, GenerationError>;

    async fn get(&self, url: &str, api_key: &str) -> Result<HttpReply, GenerationError>;
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .context("failed to build reqwest client")
}

fn network_error(url: &str) -> impl FnOnce(reqwest::Error) -> GenerationError {
    move |source| GenerationError::Network {
        url: url.to_string(),
        source,
    }
}

/// Reads the full reply. A body cut off mid-stream is a network failure.
async fn into_reply(url: &str, resp: reqwest::Response) -> Result<HttpReply, GenerationError> {
    let status = resp.status();
    let status_text = status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string());
    let body = resp.text().await.map_err(network_error(url))?;
    Ok(HttpReply {
        status: status.as_u16(),
        status_text,
        body,
    })
}

#[async_trait]
impl JobTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<HttpReply, GenerationError> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(network_error(url))?;
        into_reply(url, resp).await
    }

    async fn get(&self, url: &str, api_key: &str) -> Result<HttpReply, GenerationError> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(network_error(url))?;
        into_reply(url, resp).await
    }
}
