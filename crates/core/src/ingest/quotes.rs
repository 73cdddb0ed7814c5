use crate::config::{env_or, Settings};
use crate::domain::quote::{into_book, QuoteBook, QuoteSnapshot};
use crate::error::PickError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://82.push2.eastmoney.com";
const CLIST_PATH: &str = "/api/qt/clist/get";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Shanghai + Shenzhen main boards, ChiNext, STAR.
const A_SHARE_FILTER: &str = "m:0 t:6,m:0 t:80,m:1 t:2,m:1 t:23,m:0 t:81 s:2048";
const FIELDS: &str = "f2,f12,f14,f18";
const PAGE_SIZE: u32 = 6000;

/// Snapshot of current quotes for the whole market.
#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_quotes(&self) -> Result<QuoteBook, PickError>;
}

#[derive(Debug, Clone)]
pub struct EastmoneyQuoteClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ClistResponse {
    #[serde(default)]
    data: Option<ClistData>,
}

#[derive(Debug, Deserialize)]
struct ClistData {
    #[serde(default)]
    diff: Vec<QuoteSnapshot>,
}

impl EastmoneyQuoteClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .quote_base_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = env_or("QUOTE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        Self::new(base_url, Duration::from_secs(timeout_secs))
    }

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()
            .context("failed to build quote http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn fetch_once(&self) -> Result<QuoteBook> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), CLIST_PATH);
        let params = [
            ("pn", "1".to_string()),
            ("pz", PAGE_SIZE.to_string()),
            ("po", "1".to_string()),
            ("np", "1".to_string()),
            ("fltt", "2".to_string()),
            ("invt", "2".to_string()),
            ("fid", "f3".to_string()),
            ("fs", A_SHARE_FILTER.to_string()),
            ("fields", FIELDS.to_string()),
            ("_", chrono::Utc::now().timestamp_millis().to_string()),
        ];

        let res = self
            .http
            .get(url)
            .query(&params)
            .send()
            .await
            .context("quote list request failed")?;

        let status = res.status();
        let text = res.text().await.context("failed to read quote list")?;
        if !status.is_success() {
            anyhow::bail!("quote list HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<ClistResponse>(&text)
            .context("failed to parse quote list response")?;
        let data = parsed.data.context("quote list response has no data")?;
        Ok(into_book(data.diff))
    }
}

#[async_trait::async_trait]
impl QuoteSource for EastmoneyQuoteClient {
    fn source_name(&self) -> &'static str {
        "eastmoney_quotes"
    }

    async fn fetch_quotes(&self) -> Result<QuoteBook, PickError> {
        let book = self
            .fetch_once()
            .await
            .map_err(|err| PickError::QuoteUnavailable(format!("{err:#}")))?;
        tracing::info!(quotes = book.len(), "fetched market quotes");
        Ok(book)
    }
}
