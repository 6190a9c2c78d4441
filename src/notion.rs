use crate::models::{Record, CURRENT_PRICE_FIELD};
use crate::providers::RecordStore;
use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;

const NOTION_VERSION_HEADER: &str = "Notion-Version";
const NOTION_VERSION: &str = "2025-09-03";

pub struct NotionClient<'a> {
    http: &'a Client,
    base_url: String,
    data_source_id: String,
    headers: HeaderMap,
}

impl<'a> NotionClient<'a> {
    pub fn new(
        http: &'a Client,
        base_url: &str,
        token: &str,
        data_source_id: &str,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .context("invalid Notion token")?,
        );
        headers.insert(NOTION_VERSION_HEADER, HeaderValue::from_static(NOTION_VERSION));

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            data_source_id: data_source_id.trim().to_string(),
            headers,
        })
    }

    pub fn data_source_id(&self) -> &str {
        &self.data_source_id
    }

    async fn query_data_source(&self) -> Result<QueryResponse> {
        let path = format!("/v1/data_sources/{}/query", self.data_source_id);
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .headers(self.headers.clone())
            .json(&json!({}))
            .send()
            .await
            .with_context(|| format!("POST {} failed", path))?;
        let response = ensure_success(response, &path).await?;
        response
            .json::<QueryResponse>()
            .await
            .context("failed to parse Notion query response")
    }

    async fn patch_page(&self, page_id: &str, body: serde_json::Value) -> Result<()> {
        let path = format!("/v1/pages/{}", page_id.trim());
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .patch(url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("PATCH {} failed", path))?;
        ensure_success(response, &path).await?;
        Ok(())
    }
}

impl RecordStore for NotionClient<'_> {
    async fn list_records(&self) -> Result<Vec<Record>> {
        let payload = self.query_data_source().await?;
        if payload.has_more {
            warn!(
                "Data source {} has more than {} record(s); only the first page is synced",
                self.data_source_id,
                payload.results.len()
            );
        }
        debug!(
            "Listed {} record(s) from data source {}",
            payload.results.len(),
            self.data_source_id
        );
        Ok(payload.results)
    }

    async fn update_record_price(&self, record_id: &str, price: f64) -> Result<()> {
        self.patch_page(record_id, price_patch(price)).await
    }
}

fn price_patch(price: f64) -> serde_json::Value {
    json!({
        "properties": {
            CURRENT_PRICE_FIELD: { "number": price }
        }
    })
}

async fn ensure_success(response: Response, path: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<NotionErrorBody>(&body)
        .ok()
        .and_then(|error| match (error.code, error.message) {
            (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
            (None, Some(message)) => Some(message),
            (Some(code), None) => Some(code),
            (None, None) => None,
        })
        .unwrap_or(body);
    Err(anyhow!("{} returned {}: {}", path, status, detail.trim()))
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Record>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct NotionErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}
