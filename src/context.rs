use crate::config::SyncConfig;
use crate::notion::NotionClient;
use crate::yahoo::YahooClient;
use anyhow::{Context, Result};
use std::time::Duration;

pub struct AppContext {
    config: SyncConfig,
    http: reqwest::Client,
}

impl AppContext {
    pub fn initialize(config: SyncConfig) -> Result<Self> {
        let http = build_async_client(config.http_timeout)?;
        Ok(Self { config, http })
    }

    pub fn notion(&self) -> Result<NotionClient<'_>> {
        NotionClient::new(
            &self.http,
            &self.config.notion_api_url,
            &self.config.notion_token,
            &self.config.data_source_id,
        )
    }

    pub fn yahoo(&self) -> YahooClient<'_> {
        YahooClient::new(&self.http, &self.config.yahoo_api_url)
    }
}

pub fn build_async_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("failed to build HTTP client")
}
