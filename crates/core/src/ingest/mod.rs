pub mod eastmoney;
pub mod jsonp;
pub mod quotes;

use crate::domain::report::ReportRecord;
use crate::error::PickError;
use crate::symbol;
use crate::time::cn_market::DateRange;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_PAGE_DELAY_MS: u64 = 1000;

/// One page of the paginated report listing.
#[async_trait::async_trait]
pub trait ReportSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Page numbers start at 1. An empty vec means there are no further pages.
    async fn fetch_page(&self, range: &DateRange, page: u32) -> anyhow::Result<Vec<ReportRecord>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub page: u32,
    pub rows: usize,
}

impl PageSummary {
    pub fn message(&self) -> String {
        format!("已爬取第{}页，当前页有{}行数据", self.page, self.rows)
    }
}

pub const ALL_PAGES_FETCHED: &str = "已爬取所有个股研报数据";

/// Every report in a date range, with codes normalized, plus per-page progress.
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub range: DateRange,
    pub records: Vec<ReportRecord>,
    pub pages: Vec<PageSummary>,
}

impl FetchReport {
    pub fn progress_lines(&self) -> Vec<String> {
        let mut out: Vec<String> = self.pages.iter().map(PageSummary::message).collect();
        out.push(ALL_PAGES_FETCHED.to_string());
        out
    }
}

#[derive(Clone)]
pub struct ReportFetcher {
    source: Arc<dyn ReportSource>,
    page_delay: Duration,
}

impl ReportFetcher {
    pub fn new(source: Arc<dyn ReportSource>) -> Self {
        Self {
            source,
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
        }
    }

    /// Honors `REPORT_PAGE_DELAY_MS`.
    pub fn from_env(source: Arc<dyn ReportSource>) -> Self {
        let ms = crate::config::env_or("REPORT_PAGE_DELAY_MS", DEFAULT_PAGE_DELAY_MS);
        Self::new(source).with_page_delay(Duration::from_millis(ms))
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Validates the raw date inputs, then fetches every page.
    pub async fn fetch(&self, begin: &str, end: Option<&str>) -> Result<FetchReport, PickError> {
        let range = DateRange::parse(begin, end, chrono::Utc::now())?;
        self.fetch_range(&range).await
    }

    /// Requests pages 1, 2, ... until one comes back empty.
    ///
    /// Any failing page aborts the whole fetch; pages already received are dropped.
    pub async fn fetch_range(&self, range: &DateRange) -> Result<FetchReport, PickError> {
        let mut records: Vec<ReportRecord> = Vec::new();
        let mut pages = Vec::new();
        let mut page: u32 = 1;

        loop {
            let batch = match self.source.fetch_page(range, page).await {
                Ok(batch) => batch,
                Err(err) => {
                    tracing::error!(
                        source = self.source.source_name(),
                        page,
                        %range,
                        discarded = records.len(),
                        error = %format!("{err:#}"),
                        "report fetch failed; discarding partial pages"
                    );
                    return Err(PickError::TransportOrParse(err));
                }
            };

            if batch.is_empty() {
                tracing::info!(
                    source = self.source.source_name(),
                    pages = pages.len(),
                    total = records.len(),
                    %range,
                    "{ALL_PAGES_FETCHED}"
                );
                break;
            }

            let rows = batch.len();
            records.extend(batch.into_iter().map(|mut r| {
                r.stock_code = symbol::normalize(&r.stock_code);
                r
            }));
            let summary = PageSummary { page, rows };
            tracing::info!(page, rows, total = records.len(), "{}", summary.message());
            pages.push(summary);

            page += 1;
            tokio::time::sleep(self.page_delay).await;
        }

        Ok(FetchReport {
            range: *range,
            records,
            pages,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{report, ScriptedSource};
    use super::*;
    use crate::domain::report::BUY_RATING;

    fn fetcher(source: Arc<ScriptedSource>) -> ReportFetcher {
        ReportFetcher::new(source).with_page_delay(Duration::ZERO)
    }

    fn range() -> DateRange {
        DateRange::parse("2026-01-04", Some("2026-01-05"), chrono::Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn stops_on_first_empty_page() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(vec![report("600000", BUY_RATING, 3), report("000001", "增持", 1)]),
            Ok(vec![report("300750", BUY_RATING, 5)]),
            Ok(vec![report("601318", BUY_RATING, 2)]),
            Ok(Vec::new()),
            Ok(vec![report("999999", BUY_RATING, 9)]),
        ]));

        let out = fetcher(source.clone()).fetch_range(&range()).await.unwrap();
        assert_eq!(source.calls(), 4);
        assert_eq!(out.records.len(), 4);
        assert_eq!(
            out.pages,
            vec![
                PageSummary { page: 1, rows: 2 },
                PageSummary { page: 2, rows: 1 },
                PageSummary { page: 3, rows: 1 },
            ]
        );
        let codes: Vec<_> = out.records.iter().map(|r| r.stock_code.as_str()).collect();
        assert_eq!(codes, ["sh600000", "sz000001", "sz300750", "sh601318"]);
    }

    #[tokio::test]
    async fn empty_first_page_is_an_empty_success() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(Vec::new())]));
        let out = fetcher(source.clone()).fetch_range(&range()).await.unwrap();
        assert_eq!(source.calls(), 1);
        assert!(out.records.is_empty());
        assert_eq!(out.progress_lines(), vec![ALL_PAGES_FETCHED.to_string()]);
    }

    #[tokio::test]
    async fn failing_page_discards_everything() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(vec![report("600000", BUY_RATING, 3)]),
            Ok(vec![report("000001", BUY_RATING, 1)]),
            Err(anyhow::anyhow!("connection reset")),
            Ok(vec![report("300750", BUY_RATING, 5)]),
        ]));

        let err = fetcher(source.clone()).fetch_range(&range()).await.unwrap_err();
        assert!(matches!(err, PickError::TransportOrParse(_)));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn malformed_begin_fails_before_any_request() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![report(
            "600000", BUY_RATING, 1,
        )])]));

        let err = fetcher(source.clone()).fetch("2026/01/04", None).await.unwrap_err();
        assert!(matches!(err, PickError::InvalidInput(_)));
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn page_summary_message() {
        let s = PageSummary { page: 2, rows: 100 };
        assert_eq!(s.message(), "已爬取第2页，当前页有100行数据");
    }
}
