use crate::allocate::{allocate, DEFAULT_BUDGET_PER_STOCK};
use crate::cache::ReportCache;
use crate::config::Settings;
use crate::domain::plan::AllocationPlan;
use crate::domain::report::ReportRecord;
use crate::error::PickError;
use crate::ingest::eastmoney::EastmoneyReportClient;
use crate::ingest::quotes::{EastmoneyQuoteClient, QuoteSource};
use crate::ingest::{FetchReport, ReportFetcher};
use crate::notify::Notifier;
use crate::render;
use crate::select::{select, SelectionCriteria};
use crate::time::cn_market::DateRange;
use chrono::NaiveDate;
use std::sync::Arc;

/// Inputs for one run, as entered by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub range: DateRange,
    pub criteria: SelectionCriteria,
    pub budget_per_stock: f64,
}

impl RunConfig {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            criteria: SelectionCriteria::default(),
            budget_per_stock: DEFAULT_BUDGET_PER_STOCK,
        }
    }

    fn validate(&self) -> Result<(), PickError> {
        if !self.budget_per_stock.is_finite() || self.budget_per_stock < 1.0 {
            return Err(PickError::InvalidInput(format!(
                "budget per stock must be >= 1 (got {})",
                self.budget_per_stock
            )));
        }
        if self.range.begin > self.range.end {
            return Err(PickError::InvalidInput(format!(
                "begin date {} is after end date {}",
                self.range.begin, self.range.end
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Every report in the range, unfiltered.
    pub fetch: Arc<FetchReport>,
    pub selected: Vec<ReportRecord>,
    pub plan: AllocationPlan,
}

impl RunOutput {
    pub fn all_reports(&self) -> &[ReportRecord] {
        &self.fetch.records
    }

    pub fn markdown(&self) -> String {
        render::render_markdown(&self.plan)
    }
}

/// fetch → select → quote → allocate, with report fetches memoized per date range.
pub struct Pipeline {
    fetcher: ReportFetcher,
    quotes: Arc<dyn QuoteSource>,
    cache: ReportCache,
}

impl Pipeline {
    pub fn new(fetcher: ReportFetcher, quotes: Arc<dyn QuoteSource>) -> Self {
        Self {
            fetcher,
            quotes,
            cache: ReportCache::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let reports = EastmoneyReportClient::from_settings(settings)?;
        let quotes = EastmoneyQuoteClient::from_settings(settings)?;
        Ok(Self::new(ReportFetcher::from_env(Arc::new(reports)), Arc::new(quotes)))
    }

    pub async fn reports(&self, range: &DateRange) -> Result<Arc<FetchReport>, PickError> {
        self.cache.get_or_fetch(&self.fetcher, range).await
    }

    pub async fn run(&self, cfg: &RunConfig) -> Result<RunOutput, PickError> {
        cfg.validate()?;

        let fetch = self.reports(&cfg.range).await?;
        let selected = select(&fetch.records, &cfg.criteria)?;

        let quotes = match self.quotes.fetch_quotes().await {
            Ok(book) => Some(book),
            Err(err) => {
                tracing::warn!(
                    source = self.quotes.source_name(),
                    error = %err,
                    "quote lookup failed; continuing without quotes"
                );
                None
            }
        };

        let plan = allocate(&selected, quotes.as_ref(), cfg.budget_per_stock);
        tracing::info!(
            range = %cfg.range,
            reports = fetch.records.len(),
            selected = selected.len(),
            basis = ?plan.basis,
            shares = plan.total_shares(),
            "run complete"
        );

        Ok(RunOutput {
            fetch,
            selected,
            plan,
        })
    }

    /// Sends the rendered plan. Never called as part of [`Pipeline::run`].
    pub async fn push(
        &self,
        notifier: &dyn Notifier,
        output: &RunOutput,
        today: NaiveDate,
    ) -> Result<(), PickError> {
        let title = render::push_title(today);
        notifier.notify(&title, &output.markdown()).await
    }
}
