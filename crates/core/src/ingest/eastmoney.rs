use crate::config::{env_or, Settings};
use crate::domain::report::{ReportPage, ReportRecord};
use crate::ingest::jsonp;
use crate::ingest::ReportSource;
use crate::time::cn_market::DateRange;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://reportapi.eastmoney.com";
const LIST_PATH: &str = "/report/list";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const PAGE_SIZE: u32 = 100;
const CALLBACK: &str = "datatable4263982";

/// Stock research-report listing (JSONP, 100 rows per page).
#[derive(Debug, Clone)]
pub struct EastmoneyReportClient {
    http: reqwest::Client,
    base_url: String,
}

impl EastmoneyReportClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .report_base_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = env_or("REPORT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        Self::new(base_url, Duration::from_secs(timeout_secs))
    }

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers())
            .build()
            .context("failed to build report http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), LIST_PATH)
    }

    fn params(range: &DateRange, page: u32, ts_millis: i64) -> Vec<(&'static str, String)> {
        vec![
            ("cb", CALLBACK.to_string()),
            ("industryCode", "*".to_string()),
            ("pageSize", PAGE_SIZE.to_string()),
            ("industry", "*".to_string()),
            ("rating", "*".to_string()),
            ("ratingChange", "*".to_string()),
            ("beginTime", range.begin_str()),
            ("endTime", range.end_str()),
            ("pageNo", page.to_string()),
            ("fields", String::new()),
            ("qType", "0".to_string()),
            ("orgCode", String::new()),
            ("code", "*".to_string()),
            ("rcode", String::new()),
            ("_", ts_millis.to_string()),
        ]
    }
}

#[async_trait::async_trait]
impl ReportSource for EastmoneyReportClient {
    fn source_name(&self) -> &'static str {
        "eastmoney_reports"
    }

    async fn fetch_page(&self, range: &DateRange, page: u32) -> Result<Vec<ReportRecord>> {
        let ts = chrono::Utc::now().timestamp_millis();

        let res = self
            .http
            .get(self.url())
            .query(&Self::params(range, page, ts))
            .send()
            .await
            .with_context(|| format!("report page {page} request failed"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read report page {page}"))?;
        if !status.is_success() {
            anyhow::bail!("report page {page} HTTP {status}: {text}");
        }

        let parsed = jsonp::decode_jsonp::<ReportPage>(&text)
            .with_context(|| format!("failed to decode report page {page}"))?;
        Ok(parsed.into_records())
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("User-Agent", HeaderValue::from_static("Mozilla/5.0"));
    headers.insert(
        "Referer",
        HeaderValue::from_static("https://data.eastmoney.com/report/stock.jshtml"),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ReportFetcher;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn range() -> DateRange {
        DateRange::parse("2026-01-04", Some("2026-01-05"), chrono::Utc::now()).unwrap()
    }

    fn jsonp_page(rows: serde_json::Value) -> String {
        format!("{CALLBACK}({})", serde_json::json!({"hits": 2, "data": rows}))
    }

    #[tokio::test]
    async fn decodes_jsonp_page_with_fixed_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LIST_PATH))
            .and(query_param("pageNo", "1"))
            .and(query_param("pageSize", "100"))
            .and(query_param("beginTime", "2026-01-04"))
            .and(query_param("endTime", "2026-01-05"))
            .and(query_param("industryCode", "*"))
            .and(query_param("qType", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(jsonp_page(
                serde_json::json!([
                    {"stockName": "平安银行", "stockCode": "000001", "emRatingName": "买入", "count": 4},
                    {"stockName": "浦发银行", "stockCode": "600000", "emRatingName": "增持", "count": "2"}
                ]),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = EastmoneyReportClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let rows = client.fetch_page(&range(), 1).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].stock_code, "000001");
        assert_eq!(rows[1].report_count, 2);
    }

    #[tokio::test]
    async fn fetcher_walks_pages_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LIST_PATH))
            .and(query_param("pageNo", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(jsonp_page(
                serde_json::json!([{"stockCode": "300750", "emRatingName": "买入", "count": 9}]),
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(LIST_PATH))
            .and(query_param("pageNo", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(jsonp_page(serde_json::json!([]))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = EastmoneyReportClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let fetcher = ReportFetcher::new(Arc::new(client)).with_page_delay(Duration::ZERO);
        let out = fetcher.fetch_range(&range()).await.unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].stock_code, "sz300750");
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LIST_PATH))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = EastmoneyReportClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = client.fetch_page(&range(), 1).await.unwrap_err();
        assert!(format!("{err:#}").contains("HTTP 502"));
    }

    #[tokio::test]
    async fn non_jsonp_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LIST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
            .mount(&server)
            .await;

        let client = EastmoneyReportClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = client.fetch_page(&range(), 1).await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to decode report page 1"));
    }
}
