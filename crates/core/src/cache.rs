use crate::error::PickError;
use crate::ingest::{FetchReport, ReportFetcher};
use crate::time::cn_market::DateRange;
use std::collections::HashMap;
use std::sync::Arc;

/// Successful report fetches keyed by date range. No eviction, no expiry.
///
/// The lock is held across a fetch, so two requests for an uncached range never hit
/// the report endpoint in parallel.
#[derive(Debug, Default)]
pub struct ReportCache {
    entries: tokio::sync::Mutex<HashMap<DateRange, Arc<FetchReport>>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_fetch(
        &self,
        fetcher: &ReportFetcher,
        range: &DateRange,
    ) -> Result<Arc<FetchReport>, PickError> {
        let mut guard = self.entries.lock().await;
        if let Some(hit) = guard.get(range) {
            tracing::debug!(
                %range,
                records = hit.records.len(),
                cached_ranges = guard.len(),
                "report cache hit"
            );
            return Ok(hit.clone());
        }

        let fetched = Arc::new(fetcher.fetch_range(range).await?);
        guard.insert(*range, fetched.clone());
        tracing::debug!(%range, cached_ranges = guard.len(), "report cache filled");
        Ok(fetched)
    }

    #[cfg(test)]
    pub async fn get(&self, range: &DateRange) -> Option<Arc<FetchReport>> {
        self.entries.lock().await.get(range).cloned()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
